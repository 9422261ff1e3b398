//! Configuration management for the ticketing application.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,ticketing=debug,sqlx=warn";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `PostgreSQL` configuration
    pub postgres: PostgresConfig,
    /// Transaction behaviour
    pub ticketing: TicketingConfig,
    /// Process-level settings
    pub server: ServerConfig,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// `PostgreSQL` connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Connection (and startup ping) timeout in seconds
    pub connect_timeout: u64,
    /// Idle timeout in seconds (connections idle longer than this are closed)
    pub idle_timeout: u64,
    /// Maximum connection lifetime in seconds
    pub max_lifetime: u64,
}

/// Transaction behaviour of the use cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketingConfig {
    /// Per-transaction deadline in milliseconds (0 = none)
    pub transaction_timeout_ms: u64,
}

impl TicketingConfig {
    /// Deadline applied to every unit of work; zero disables it.
    #[must_use]
    pub const fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Log filter (`RUST_LOG` syntax)
    pub log_level: String,
}

impl ServerConfig {
    /// Parse [`Self::log_level`], falling back to [`DEFAULT_LOG_FILTER`]
    /// when it is not a valid filter.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` wins; otherwise the URL is composed from `DB_HOST`,
    /// `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD` and `DB_SSLMODE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            postgres: PostgresConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| database_url_from_parts()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(25),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
                connect_timeout: env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
                idle_timeout: env::var("DATABASE_IDLE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
                max_lifetime: env::var("DATABASE_MAX_LIFETIME")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            },
            ticketing: TicketingConfig {
                transaction_timeout_ms: env::var("TRANSACTION_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0),
            },
            server: ServerConfig {
                log_level: env::var("RUST_LOG")
                    .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
            },
        }
    }

    /// The database URL with the password masked, for logs.
    #[must_use]
    pub fn redacted_database_url(&self) -> String {
        redact_password(&self.postgres.url)
    }
}

fn database_url_from_parts() -> String {
    let host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port: u16 = env::var("DB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5432);
    let name = env::var("DB_NAME").unwrap_or_else(|_| "time2meet".to_string());
    let user = env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = env::var("DB_PASSWORD").unwrap_or_else(|_| "postgres".to_string());
    let ssl_mode = env::var("DB_SSLMODE").unwrap_or_else(|_| "disable".to_string());
    compose_database_url(&host, port, &name, &user, &password, &ssl_mode)
}

fn compose_database_url(
    host: &str,
    port: u16,
    name: &str,
    user: &str,
    password: &str,
    ssl_mode: &str,
) -> String {
    format!("postgres://{user}:{password}@{host}:{port}/{name}?sslmode={ssl_mode}")
}

fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_url_from_parts() {
        assert_eq!(
            compose_database_url("db", 6432, "tickets", "app", "s3cret", "require"),
            "postgres://app:s3cret@db:6432/tickets?sslmode=require"
        );
    }

    #[test]
    fn redacts_password() {
        assert_eq!(
            redact_password("postgres://app:s3cret@db:5432/tickets"),
            "postgres://app:***@db:5432/tickets"
        );
        assert_eq!(redact_password("postgres://db/tickets"), "postgres://db/tickets");
    }

    #[test]
    fn log_filter_falls_back_to_default() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());

        let custom = ServerConfig {
            log_level: "warn,ticketing=trace".to_string(),
        };
        assert_eq!(
            custom.env_filter().to_string(),
            EnvFilter::new("warn,ticketing=trace").to_string()
        );

        let broken = ServerConfig {
            log_level: "ticketing=loud".to_string(),
        };
        assert_eq!(
            broken.env_filter().to_string(),
            EnvFilter::new(DEFAULT_LOG_FILTER).to_string()
        );
    }

    #[test]
    fn zero_timeout_means_none() {
        let config = TicketingConfig {
            transaction_timeout_ms: 0,
        };
        assert!(config.transaction_timeout().is_zero());
    }
}
