//! Store seams used by the transactional use cases.
//!
//! Every trait here is generic over a transaction handle `Tx`. The handle is
//! owned by the [`UnitOfWork`](crate::unit_of_work::UnitOfWork) for the
//! lifetime of one transaction and lent to each primitive as `&mut Tx`, so a
//! primitive can never outlive or escape its transaction.
//!
//! # Implementations
//!
//! - `time2meet-postgres`: `sqlx::Transaction<'static, Postgres>` handles
//! - `time2meet-testing`: an in-memory store for deterministic tests
//!
//! Handles must roll back when dropped without an explicit commit. That is
//! what guarantees termination on panic and on cancellation.

use crate::error::AppError;
use crate::ids::{TicketId, TicketTypeId, UserId};
use crate::money::{Capacity, Money};
use chrono::{DateTime, Utc};
use std::future::Future;

/// A store able to open, commit and roll back transactions.
pub trait TransactionalStore: Send + Sync {
    /// Transaction handle. Dropping it without commit must roll back.
    type Tx: Send;

    /// Begin a new transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot start a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, AppError>> + Send;

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; the transaction is then gone.
    fn commit(&self, tx: Self::Tx) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Roll the transaction back.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback statement fails.
    fn rollback(&self, tx: Self::Tx) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Stamps actor identity and origin address on a transaction for the
/// store's audit triggers.
pub trait AuditContextSetter<Tx>: Send + Sync {
    /// Stamp the transaction.
    ///
    /// A nil `actor_id` skips the actor stamp; an empty `origin_address`
    /// skips the origin stamp. Must be called before the first mutating
    /// statement of the transaction. The stamp is scoped to `tx`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the stamp cannot be written.
    fn stamp(
        &self,
        tx: &mut Tx,
        actor_id: UserId,
        origin_address: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A paid ticket about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Ticket type being sold
    pub ticket_type_id: TicketTypeId,
    /// Buyer
    pub buyer_id: UserId,
    /// Purchase time (UTC)
    pub purchased_at: DateTime<Utc>,
    /// Opaque unique token printed on the ticket
    pub qr_code: String,
    /// Amount paid
    pub amount_paid: Money,
}

/// Transaction-scoped primitives over ticket inventory.
pub trait TicketInventory<Tx>: Send + Sync {
    /// Lock the ticket type row until the transaction ends and read its
    /// capacity counters.
    ///
    /// A concurrent caller blocks here until the holder commits or rolls
    /// back, then reads the post-commit counters.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no such ticket type exists
    /// - [`AppError::Internal`] if the query fails
    fn lock_ticket_type_for_update(
        &self,
        tx: &mut Tx,
        ticket_type_id: TicketTypeId,
    ) -> impl Future<Output = Result<Capacity, AppError>> + Send;

    /// Insert a ticket in status `paid`.
    ///
    /// Performs no capacity check; the caller must hold the ticket type lock
    /// and have checked capacity in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the insert fails.
    fn insert_paid_ticket(
        &self,
        tx: &mut Tx,
        ticket: NewTicket,
    ) -> impl Future<Output = Result<TicketId, AppError>> + Send;

    /// Mark a ticket `used` at `used_at` if it is currently `paid` or `used`.
    ///
    /// Returns `false` if the ticket does not exist or is `refunded`/`void`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the update fails.
    fn mark_ticket_used(
        &self,
        tx: &mut Tx,
        ticket_id: TicketId,
        used_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;
}
