//! # Time2Meet Core
//!
//! Core types, store seams and transactional protocols for Time2Meet ticket
//! inventory.
//!
//! This crate owns the rules; the storage crates only answer narrow,
//! transaction-scoped questions.
//!
//! ## Core Concepts
//!
//! - **Unit of work**: one transaction around one callback, always terminated
//!   ([`unit_of_work::UnitOfWork`])
//! - **Store seams**: transaction-scoped primitives behind traits
//!   ([`store`], [`batch::Savepoints`], [`batch::RowInserter`])
//! - **Batch import**: per-row save-point isolation with continue or stop
//!   semantics ([`batch::BatchImporter`])
//! - **Typed errors**: a closed set of classifications ([`error::ErrorCode`])
//!
//! ## Example
//!
//! ```ignore
//! let uow = UnitOfWork::new(store.clone());
//! let ticket_id = uow
//!     .with_transaction(|tx| {
//!         Box::pin(async move {
//!             audit.stamp(tx, actor_id, "10.0.0.1").await?;
//!             let capacity = inventory.lock_ticket_type_for_update(tx, type_id).await?;
//!             if capacity.is_sold_out() {
//!                 return Err(AppError::conflict("sold out"));
//!             }
//!             inventory.insert_paid_ticket(tx, ticket).await
//!         })
//!     })
//!     .await?;
//! ```

pub mod batch;
pub mod email;
pub mod error;
pub mod ids;
pub mod money;
pub mod status;
pub mod store;
pub mod unit_of_work;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{AppError, ErrorCode, Result};
pub use ids::{EventId, TicketId, TicketTypeId, UserId};
pub use money::{Capacity, Money};
pub use unit_of_work::UnitOfWork;

/// Injected dependencies.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Purchase and validation timestamps come from here, so tests can pin
    /// them with a fixed clock.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
