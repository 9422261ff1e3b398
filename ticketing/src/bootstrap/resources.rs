//! Resource management for infrastructure setup.
//!
//! Centralizes infrastructure initialization (connection pool, clock) into a
//! single `ResourceManager` struct.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = Config::from_env();
//! let resources = ResourceManager::from_config(&config).await?;
//! ```

use crate::config::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use time2meet_core::environment::{Clock, SystemClock};
use time2meet_core::error::{AppError, Result};
use time2meet_postgres::PostgresStore;
use tracing::info;

/// Central resource manager for all infrastructure components.
///
/// # Thread Safety
///
/// All resources are cheap to clone and can be shared across tasks.
#[derive(Clone)]
pub struct ResourceManager {
    /// Application configuration
    pub config: Arc<Config>,

    /// System clock for timestamps
    pub clock: Arc<dyn Clock>,

    /// `PostgreSQL` store (owns the pool)
    pub store: PostgresStore,
}

impl ResourceManager {
    /// Connect the pool described by `config` and check it answers.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] if the database cannot be reached
    /// within the configured connect timeout.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pg = &config.postgres;
        let connect_timeout = Duration::from_secs(pg.connect_timeout);

        info!(
            max_connections = pg.max_connections,
            min_connections = pg.min_connections,
            "Connecting to database..."
        );
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .min_connections(pg.min_connections)
            .acquire_timeout(connect_timeout)
            .idle_timeout(Some(Duration::from_secs(pg.idle_timeout)))
            .max_lifetime(Some(Duration::from_secs(pg.max_lifetime)))
            .connect(&pg.url)
            .await
            .map_err(|e| AppError::unavailable("database connection failed", e))?;

        tokio::time::timeout(connect_timeout, sqlx::query("SELECT 1").execute(&pool))
            .await
            .map_err(|e| AppError::unavailable("database ping timed out", e))?
            .map_err(|e| AppError::unavailable("database ping failed", e))?;
        info!("✓ Database connected");

        Ok(Self {
            config: Arc::new(config.clone()),
            clock: Arc::new(SystemClock),
            store: PostgresStore::from_pool(pool),
        })
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn shutdown(&self) {
        self.store.pool().close().await;
        info!("Database pool closed");
    }
}
