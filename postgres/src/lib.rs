//! `PostgreSQL` store for Time2Meet ticket inventory.
//!
//! [`PostgresStore`] implements every store seam of `time2meet-core` over a
//! sqlx connection pool. Transactions are `sqlx::Transaction<'static, Postgres>`
//! handles, which roll back when dropped without commit.
//!
//! - Transactions: `BEGIN` / `COMMIT` / `ROLLBACK` from the pool
//! - Audit stamp: `set_config('app.user_id' | 'app.ip', $1, true)`
//! - Inventory: `SELECT ... FOR UPDATE`, ticket insert, conditional update
//! - Import: `SAVEPOINT` bookkeeping and one insert per entity
//!
//! Queries use the runtime-checked `sqlx::query` API; the schema is owned by
//! the surrounding deployment.
//!
//! # Example
//!
//! ```ignore
//! use time2meet_core::UnitOfWork;
//! use time2meet_postgres::PostgresStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresStore::connect("postgres://localhost/time2meet").await?;
//!     let uow = UnitOfWork::new(store.clone());
//!     Ok(())
//! }
//! ```

mod audit;
mod error;
mod import;
mod inventory;
mod store;

pub use error::classify_row_error;
pub use store::{PgTx, PostgresStore};
