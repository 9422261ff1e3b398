//! Pool-backed transactional store.

use sqlx::{PgPool, Postgres, Transaction};
use time2meet_core::error::{AppError, Result};
use time2meet_core::store::TransactionalStore;

/// Transaction handle used by every `PostgreSQL` seam.
pub type PgTx = Transaction<'static, Postgres>;

/// `PostgreSQL` implementation of the store seams.
///
/// Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to `database_url` with sqlx defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] if the database is unreachable.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| AppError::unavailable("database connection failed", e))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl TransactionalStore for PostgresStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::unavailable("begin tx failed", e))
    }

    async fn commit(&self, tx: PgTx) -> Result<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::unavailable("commit failed", e))
    }

    async fn rollback(&self, tx: PgTx) -> Result<()> {
        tx.rollback()
            .await
            .map_err(|e| AppError::internal("rollback failed", e))
    }
}
