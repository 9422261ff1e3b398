//! Bulk ingestion with per-row save-point isolation.
//!
//! Users, events and tickets are imported with one protocol; only the row
//! preparation ([`ImportItem::prepare`]) and the insert statement
//! ([`RowInserter`]) differ. For every item, in input order:
//!
//! 1. `SAVEPOINT sp_item`
//! 2. prepare the typed row and insert it
//! 3. success: `RELEASE SAVEPOINT sp_item`
//! 4. failure: `ROLLBACK TO SAVEPOINT sp_item`, `RELEASE SAVEPOINT sp_item`,
//!    record `(index, message)`; stop with [`AppError::Conflict`] unless
//!    `continue_on_error` is set
//!
//! The importer runs inside a caller-owned transaction. A `Conflict` returned
//! in stop mode makes the surrounding [`UnitOfWork`](crate::unit_of_work::UnitOfWork)
//! roll back the whole transaction, including rows that had already
//! succeeded in this call. Save-points only protect earlier rows while the
//! pass keeps running.
//!
//! Null policy: an empty or whitespace-only optional text field is stored as
//! NULL (see [`optional_text`]).

use crate::email::Email;
use crate::error::{AppError, Result};
use crate::ids::{TicketTypeId, UserId};
use crate::money::Money;
use crate::status::{EventStatus, TicketStatus, UserRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Name of the per-row save-point.
pub const ITEM_SAVEPOINT: &str = "sp_item";

/// One failed row of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Position of the row in the submitted batch (0-based)
    pub index: usize,
    /// Why the row was rejected
    pub error: String,
}

/// Outcome of an import pass.
///
/// Only trustworthy as "rows persisted" when the call returned `Ok`; in stop
/// mode the error supersedes it and the transaction is rolled back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Number of submitted rows
    pub total: usize,
    /// Rows inserted
    pub success: usize,
    /// Rows rejected
    pub failed: usize,
    /// One entry per rejected row, in input order
    pub errors: Vec<BatchError>,
}

impl BatchResult {
    /// Empty result for a batch of `total` rows.
    #[must_use]
    pub const fn new(total: usize) -> Self {
        Self {
            total,
            success: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    fn record_failure(&mut self, index: usize, error: String) {
        self.failed += 1;
        self.errors.push(BatchError { index, error });
    }
}

/// Which entity a batch carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// User accounts
    Users,
    /// Events
    Events,
    /// Tickets
    Tickets,
}

impl ImportKind {
    /// Label used in messages and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Events => "events",
            Self::Tickets => "tickets",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Empty or whitespace-only text becomes `None` (stored as NULL).
#[must_use]
pub fn optional_text(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required_text(s: &str, field: &str) -> Result<String> {
    optional_text(s).ok_or_else(|| AppError::validation(format!("{field} is required")))
}

/// Opaque tokens must not be blank but are kept exactly as given.
///
/// # Errors
///
/// Returns [`AppError::Validation`] (`"{field} is required"`) for blank text.
pub fn required_token(s: &str, field: &str) -> Result<String> {
    if s.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(s.to_string())
}

// ═══════════════════════════════════════════════════════════════════════
// Raw items
// ═══════════════════════════════════════════════════════════════════════

/// A raw batch item that turns into a typed row as part of its own attempt.
pub trait ImportItem: Send + Sync {
    /// Entity carried by this item.
    const KIND: ImportKind;

    /// Typed row handed to the store.
    type Row: Send + Sync;

    /// Validate and convert the item.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for malformed fields. The failure
    /// counts against this row only.
    fn prepare(&self) -> Result<Self::Row>;
}

/// User row as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportUserItem {
    /// E-mail address (unique)
    pub email: String,
    /// Pre-computed password hash
    pub password_hash: String,
    /// Display name
    pub full_name: String,
    /// Phone number; empty means none
    #[serde(default)]
    pub phone: String,
    /// `admin`, `organizer` or `attendee`
    pub role: String,
}

/// Event row as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEventItem {
    /// Organizer user id
    pub organizer_id: String,
    /// Title
    pub title: String,
    /// Description; empty means none
    #[serde(default)]
    pub description: String,
    /// `draft`, `published`, `cancelled` or `completed`
    pub status: String,
    /// Listed publicly
    #[serde(default)]
    pub is_public: bool,
    /// Participant cap, if any
    #[serde(default)]
    pub max_participants: Option<i32>,
    /// Cover image URL; empty means none
    #[serde(default)]
    pub cover_image: String,
}

/// Ticket row as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTicketItem {
    /// Ticket type id
    pub ticket_type_id: String,
    /// Buyer user id
    pub buyer_id: String,
    /// Purchase time; absent means "now" on the store's clock
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
    /// Ticket status
    pub status: String,
    /// Unique QR token
    pub qr_code: String,
    /// Decimal amount
    pub amount_paid: String,
}

/// Validated user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRow {
    /// Normalized e-mail
    pub email: Email,
    /// Password hash
    pub password_hash: String,
    /// Display name
    pub full_name: String,
    /// Phone, NULL when absent
    pub phone: Option<String>,
    /// Role
    pub role: UserRole,
}

/// Validated event row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEventRow {
    /// Organizer
    pub organizer_id: UserId,
    /// Title
    pub title: String,
    /// Description, NULL when absent
    pub description: Option<String>,
    /// Status
    pub status: EventStatus,
    /// Listed publicly
    pub is_public: bool,
    /// Participant cap
    pub max_participants: Option<i32>,
    /// Cover image, NULL when absent
    pub cover_image: Option<String>,
}

/// Validated ticket row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicketRow {
    /// Ticket type
    pub ticket_type_id: TicketTypeId,
    /// Buyer
    pub buyer_id: UserId,
    /// Purchase time, store clock when absent
    pub purchase_date: Option<DateTime<Utc>>,
    /// Status
    pub status: TicketStatus,
    /// QR token
    pub qr_code: String,
    /// Amount paid
    pub amount_paid: Money,
}

impl ImportItem for ImportUserItem {
    const KIND: ImportKind = ImportKind::Users;
    type Row = NewUserRow;

    fn prepare(&self) -> Result<NewUserRow> {
        Ok(NewUserRow {
            email: Email::parse(&self.email)?,
            password_hash: required_text(&self.password_hash, "password_hash")?,
            full_name: required_text(&self.full_name, "full_name")?,
            phone: optional_text(&self.phone),
            role: UserRole::parse(&self.role)?,
        })
    }
}

impl ImportItem for ImportEventItem {
    const KIND: ImportKind = ImportKind::Events;
    type Row = NewEventRow;

    fn prepare(&self) -> Result<NewEventRow> {
        if self.max_participants.is_some_and(|max| max < 0) {
            return Err(AppError::validation("max_participants must be >= 0"));
        }
        Ok(NewEventRow {
            organizer_id: UserId::parse(&self.organizer_id)?,
            title: required_text(&self.title, "title")?,
            description: optional_text(&self.description),
            status: EventStatus::parse(&self.status)?,
            is_public: self.is_public,
            max_participants: self.max_participants,
            cover_image: optional_text(&self.cover_image),
        })
    }
}

impl ImportItem for ImportTicketItem {
    const KIND: ImportKind = ImportKind::Tickets;
    type Row = NewTicketRow;

    fn prepare(&self) -> Result<NewTicketRow> {
        Ok(NewTicketRow {
            ticket_type_id: TicketTypeId::parse(&self.ticket_type_id)?,
            buyer_id: UserId::parse(&self.buyer_id)?,
            purchase_date: self.purchase_date,
            status: TicketStatus::parse(&self.status)?,
            qr_code: required_token(&self.qr_code, "qr_code")?,
            amount_paid: Money::parse(&self.amount_paid)?,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Store seams
// ═══════════════════════════════════════════════════════════════════════

/// Save-point control within an open transaction.
pub trait Savepoints<Tx>: Send + Sync {
    /// Establish (or shadow) a save-point.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    fn savepoint(&self, tx: &mut Tx, name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Undo everything since the save-point; the save-point stays defined.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or the save-point is unknown.
    fn rollback_to_savepoint(
        &self,
        tx: &mut Tx,
        name: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Forget the save-point, keeping its effects.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or the save-point is unknown.
    fn release_savepoint(&self, tx: &mut Tx, name: &str)
    -> impl Future<Output = Result<()>> + Send;
}

/// Inserts one typed row.
pub trait RowInserter<Tx, Row>: Send + Sync {
    /// Insert `row`. Empty optional fields are already `None`.
    ///
    /// # Errors
    ///
    /// Returns the store's rejection (constraint violation, bad reference).
    fn insert_row(&self, tx: &mut Tx, row: &Row) -> impl Future<Output = Result<()>> + Send;
}

// ═══════════════════════════════════════════════════════════════════════
// Importer
// ═══════════════════════════════════════════════════════════════════════

/// Runs the save-point protocol over a store.
#[derive(Debug, Clone)]
pub struct BatchImporter<S> {
    store: S,
}

impl<S> BatchImporter<S> {
    /// Create an importer over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Import `items` in order inside `tx`.
    ///
    /// # Errors
    ///
    /// - [`AppError::Conflict`] on the first failed row when
    ///   `continue_on_error` is false
    /// - [`AppError::Internal`] if save-point bookkeeping fails
    pub async fn import_rows<Tx, I>(
        &self,
        tx: &mut Tx,
        items: &[I],
        continue_on_error: bool,
    ) -> Result<BatchResult>
    where
        Tx: Send,
        I: ImportItem,
        S: Savepoints<Tx> + RowInserter<Tx, I::Row>,
    {
        let kind = I::KIND;
        let mut result = BatchResult::new(items.len());

        for (index, item) in items.iter().enumerate() {
            self.store
                .savepoint(tx, ITEM_SAVEPOINT)
                .await
                .map_err(|e| AppError::internal("savepoint failed", e.row_message()))?;

            let attempt = match item.prepare() {
                Ok(row) => self.store.insert_row(tx, &row).await,
                Err(err) => Err(err),
            };

            match attempt {
                Ok(()) => {
                    self.store
                        .release_savepoint(tx, ITEM_SAVEPOINT)
                        .await
                        .map_err(|e| AppError::internal("release savepoint failed", e.row_message()))?;
                    result.success += 1;
                }
                Err(err) => {
                    let message = err.row_message();
                    tracing::warn!(kind = %kind, index, error = %message, "Batch import row failed");

                    self.store
                        .rollback_to_savepoint(tx, ITEM_SAVEPOINT)
                        .await
                        .map_err(|e| {
                            AppError::internal("rollback to savepoint failed", e.row_message())
                        })?;
                    self.store
                        .release_savepoint(tx, ITEM_SAVEPOINT)
                        .await
                        .map_err(|e| AppError::internal("release savepoint failed", e.row_message()))?;

                    result.record_failure(index, message.clone());
                    if !continue_on_error {
                        return Err(AppError::conflict_caused_by(
                            format!("batch import {kind} failed"),
                            format!("row {index}: {message}"),
                        ));
                    }
                }
            }
        }

        tracing::debug!(
            kind = %kind,
            total = result.total,
            success = result.success,
            failed = result.failed,
            "Batch import pass finished"
        );
        Ok(result)
    }

    /// Import user rows.
    ///
    /// # Errors
    ///
    /// See [`Self::import_rows`].
    pub async fn import_users<Tx>(
        &self,
        tx: &mut Tx,
        items: &[ImportUserItem],
        continue_on_error: bool,
    ) -> Result<BatchResult>
    where
        Tx: Send,
        S: Savepoints<Tx> + RowInserter<Tx, NewUserRow>,
    {
        self.import_rows(tx, items, continue_on_error).await
    }

    /// Import event rows.
    ///
    /// # Errors
    ///
    /// See [`Self::import_rows`].
    pub async fn import_events<Tx>(
        &self,
        tx: &mut Tx,
        items: &[ImportEventItem],
        continue_on_error: bool,
    ) -> Result<BatchResult>
    where
        Tx: Send,
        S: Savepoints<Tx> + RowInserter<Tx, NewEventRow>,
    {
        self.import_rows(tx, items, continue_on_error).await
    }

    /// Import ticket rows.
    ///
    /// # Errors
    ///
    /// See [`Self::import_rows`].
    pub async fn import_tickets<Tx>(
        &self,
        tx: &mut Tx,
        items: &[ImportTicketItem],
        continue_on_error: bool,
    ) -> Result<BatchResult>
    where
        Tx: Send,
        S: Savepoints<Tx> + RowInserter<Tx, NewTicketRow>,
    {
        self.import_rows(tx, items, continue_on_error).await
    }
}
