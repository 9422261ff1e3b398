//! Use-case wiring.

use crate::app::{BatchImport, PurchaseTicket, ValidateTicket};
use crate::bootstrap::ResourceManager;
use std::sync::Arc;
use std::time::Duration;
use time2meet_core::batch::{NewEventRow, NewTicketRow, NewUserRow, RowInserter, Savepoints};
use time2meet_core::environment::Clock;
use time2meet_core::store::{AuditContextSetter, TicketInventory, TransactionalStore};
use time2meet_postgres::PostgresStore;

/// All use cases over one store, sharing its pool.
pub struct TicketingServices<S: TransactionalStore> {
    /// Ticket purchase
    pub purchase: PurchaseTicket<S>,
    /// Ticket validation
    pub validate: ValidateTicket<S>,
    /// Bulk ingestion
    pub batch: BatchImport<S>,
}

impl<S> TicketingServices<S>
where
    S: TransactionalStore
        + AuditContextSetter<S::Tx>
        + TicketInventory<S::Tx>
        + Savepoints<S::Tx>
        + RowInserter<S::Tx, NewUserRow>
        + RowInserter<S::Tx, NewEventRow>
        + RowInserter<S::Tx, NewTicketRow>
        + Clone
        + 'static,
{
    /// Wire every use case to `store`, applying `deadline` to each
    /// transaction (zero disables).
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>, deadline: Duration) -> Self {
        Self {
            purchase: PurchaseTicket::new(store.clone(), Arc::clone(&clock)).with_deadline(deadline),
            validate: ValidateTicket::new(store.clone(), clock).with_deadline(deadline),
            batch: BatchImport::new(store).with_deadline(deadline),
        }
    }
}

impl TicketingServices<PostgresStore> {
    /// Wire the use cases to the `PostgreSQL` store held by `resources`.
    #[must_use]
    pub fn from_resources(resources: &ResourceManager) -> Self {
        Self::new(
            resources.store.clone(),
            resources.clock.clone(),
            resources.config.ticketing.transaction_timeout(),
        )
    }
}
