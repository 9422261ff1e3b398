//! Ticket validation at the venue.

use crate::metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use time2meet_core::environment::Clock;
use time2meet_core::error::{AppError, Result};
use time2meet_core::ids::{TicketId, UserId};
use time2meet_core::store::{AuditContextSetter, TicketInventory, TransactionalStore};
use time2meet_core::unit_of_work::UnitOfWork;

/// Validation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// Staff member scanning the ticket
    pub actor_id: UserId,
    /// Scanner's network address; empty when unknown
    #[serde(default)]
    pub origin_address: String,
    /// Ticket presented
    pub ticket_id: TicketId,
}

/// Validate use case: marks a `paid` or `used` ticket as used now.
///
/// Validating an already used ticket succeeds again and moves `used_at`.
pub struct ValidateTicket<S: TransactionalStore> {
    uow: UnitOfWork<S>,
    clock: Arc<dyn Clock>,
}

impl<S> ValidateTicket<S>
where
    S: TransactionalStore + AuditContextSetter<S::Tx> + TicketInventory<S::Tx> + Clone + 'static,
{
    /// Create the use case over `store`.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            uow: UnitOfWork::new(store),
            clock,
        }
    }

    /// Roll back validations that run longer than `deadline` (zero disables).
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.uow = self.uow.with_deadline(deadline);
        self
    }

    /// Validate one ticket.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the actor or ticket id is missing
    /// - [`AppError::NotFound`] if the ticket does not exist or is
    ///   `refunded`/`void`
    /// - [`AppError::Internal`] / [`AppError::Unavailable`] on store failures
    #[tracing::instrument(
        skip(self, request),
        fields(actor_id = %request.actor_id, ticket_id = %request.ticket_id)
    )]
    pub async fn validate(&self, request: ValidateRequest) -> Result<()> {
        if request.actor_id.is_nil() {
            return Err(AppError::validation("user_id is required"));
        }
        if request.ticket_id.is_nil() {
            return Err(AppError::validation("ticket_id is required"));
        }

        let store = self.uow.store().clone();
        let clock = Arc::clone(&self.clock);
        let ValidateRequest {
            actor_id,
            origin_address,
            ticket_id,
        } = request;

        self.uow
            .with_transaction(move |tx| {
                Box::pin(async move {
                    store.stamp(tx, actor_id, origin_address.trim()).await?;

                    let used_at = clock.now();
                    if !store.mark_ticket_used(tx, ticket_id, used_at).await? {
                        return Err(AppError::not_found("ticket not found or invalid state"));
                    }
                    tracing::info!(%used_at, "Ticket validated");
                    Ok(())
                })
            })
            .await?;

        metrics::record_ticket_validated();
        Ok(())
    }
}
