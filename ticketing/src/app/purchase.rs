//! Ticket purchase.
//!
//! One purchase is one transaction:
//!
//! ```text
//! validate input ─► BEGIN ─► stamp audit ─► lock ticket type (FOR UPDATE)
//!                                            │
//!                     sold_out? ◄────────────┘
//!                       │ yes ─► ROLLBACK, Conflict("sold out")
//!                       │ no  ─► insert paid ticket ─► COMMIT
//! ```
//!
//! The row lock serialises purchases of one ticket type, so `quantity_sold`
//! never exceeds `quantity_total`. The store recounts `quantity_sold` from
//! ticket rows; nothing here increments it.

use crate::metrics;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use time2meet_core::batch::required_token;
use time2meet_core::environment::Clock;
use time2meet_core::error::{AppError, ErrorCode, Result};
use time2meet_core::ids::{TicketId, TicketTypeId, UserId};
use time2meet_core::money::Money;
use time2meet_core::store::{AuditContextSetter, NewTicket, TicketInventory, TransactionalStore};
use time2meet_core::unit_of_work::UnitOfWork;

/// Purchase input as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Buyer, also the audited actor
    pub actor_id: UserId,
    /// Caller's network address; empty when unknown
    #[serde(default)]
    pub origin_address: String,
    /// Ticket type to buy
    pub ticket_type_id: TicketTypeId,
    /// Unique token printed on the ticket
    pub qr_code: String,
    /// Decimal amount, e.g. `"19.99"`
    pub amount_paid: String,
    /// ISO 4217 code, informational only
    #[serde(default)]
    pub currency: Option<String>,
}

/// A request that passed input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPurchase {
    /// Buyer
    pub actor_id: UserId,
    /// Origin address
    pub origin_address: String,
    /// Ticket type
    pub ticket_type_id: TicketTypeId,
    /// QR token exactly as submitted
    pub qr_code: String,
    /// Normalised amount
    pub amount_paid: Money,
    /// Upper-cased currency code
    pub currency: Option<String>,
}

impl PurchaseRequest {
    /// Check the request before any transaction is opened.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<ValidatedPurchase> {
        if self.actor_id.is_nil() {
            return Err(AppError::validation("user_id is required"));
        }
        if self.ticket_type_id.is_nil() {
            return Err(AppError::validation("ticket_type_id is required"));
        }
        let qr_code = required_token(&self.qr_code, "qr_code")?;
        let amount = Decimal::from_str(self.amount_paid.trim())
            .map_err(|_| AppError::validation("amount_paid must be decimal string"))?;
        let amount_paid = Money::new(amount)
            .map_err(|e| AppError::validation(format!("invalid money: {}", e.message())))?;

        Ok(ValidatedPurchase {
            actor_id: self.actor_id,
            origin_address: self.origin_address.trim().to_string(),
            ticket_type_id: self.ticket_type_id,
            qr_code,
            amount_paid,
            currency: normalize_currency(self.currency.as_deref())?,
        })
    }
}

fn normalize_currency(currency: Option<&str>) -> Result<Option<String>> {
    let Some(code) = currency.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::validation(format!(
            "currency must be a 3-letter code, got {code:?}"
        )));
    }
    Ok(Some(code.to_ascii_uppercase()))
}

/// Purchase use case.
pub struct PurchaseTicket<S: TransactionalStore> {
    uow: UnitOfWork<S>,
    clock: Arc<dyn Clock>,
}

impl<S> PurchaseTicket<S>
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

    /// Roll back purchases that run longer than `deadline` (zero disables).
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.uow = self.uow.with_deadline(deadline);
        self
    }

    /// Buy one ticket.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for malformed input
    /// - [`AppError::NotFound`] if the ticket type does not exist
    /// - [`AppError::Conflict`] (`"sold out"`) when no capacity is left
    /// - [`AppError::Internal`] if the audit stamp or a statement fails
    /// - [`AppError::Unavailable`] if the transaction cannot begin or commit
    #[tracing::instrument(
        skip(self, request),
        fields(
            actor_id = %request.actor_id,
            ticket_type_id = %request.ticket_type_id,
            currency = tracing::field::Empty,
        )
    )]
    pub async fn purchase(&self, request: PurchaseRequest) -> Result<TicketId> {
        let purchase = request.validate().inspect_err(|e| {
            metrics::record_purchase_rejected("validation");
            tracing::debug!(error = %e, "Purchase rejected");
        })?;
        if let Some(currency) = &purchase.currency {
            tracing::Span::current().record("currency", currency.as_str());
        }

        let store = self.uow.store().clone();
        let clock = Arc::clone(&self.clock);
        let outcome = self
            .uow
            .with_transaction(move |tx| {
                Box::pin(async move {
                    store
                        .stamp(tx, purchase.actor_id, &purchase.origin_address)
                        .await?;

                    let capacity = store
                        .lock_ticket_type_for_update(tx, purchase.ticket_type_id)
                        .await?;
                    if capacity.is_sold_out() {
                        tracing::debug!(
                            quantity_total = capacity.quantity_total,
                            quantity_sold = capacity.quantity_sold,
                            "Ticket type sold out"
                        );
                        return Err(AppError::conflict("sold out"));
                    }

                    store
                        .insert_paid_ticket(
                            tx,
                            NewTicket {
                                ticket_type_id: purchase.ticket_type_id,
                                buyer_id: purchase.actor_id,
                                purchased_at: clock.now(),
                                qr_code: purchase.qr_code,
                                amount_paid: purchase.amount_paid,
                            },
                        )
                        .await
                })
            })
            .await;

        match &outcome {
            Ok(ticket_id) => {
                metrics::record_ticket_sold();
                tracing::info!(%ticket_id, "Ticket purchased");
            }
            Err(e) => match e.code() {
                ErrorCode::Conflict => metrics::record_purchase_rejected("sold_out"),
                ErrorCode::NotFound => metrics::record_purchase_rejected("not_found"),
                _ => tracing::warn!(code = %e.code(), error = %e, cause = ?e.cause(), "Purchase failed"),
            },
        }
        outcome
    }
}
