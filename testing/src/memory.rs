//! In-memory ticket inventory store
//!
//! Implements every store seam of `time2meet-core` over plain collections so
//! use cases can be tested without a database:
//! - [`InMemoryStore`]: committed tables, per-ticket-type row locks, audit log
//! - [`InMemoryTx`]: pending writes, save-points and transaction-local settings
//!
//! Behaviour mirrors the relational store where the engine depends on it:
//! - `lock_ticket_type_for_update` blocks until the holder's transaction ends
//! - `quantity_sold` counts committed `paid`/`used` tickets
//! - unique e-mail, unique QR code and foreign keys are enforced per statement
//! - a failed statement aborts the transaction until a save-point rollback
//! - commit appends one audit entry per write, stamped with the actor and
//!   origin set on that transaction
//! - dropping a transaction without commit discards it and releases its locks

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use time2meet_core::batch::{NewEventRow, NewTicketRow, NewUserRow, RowInserter, Savepoints};
use time2meet_core::environment::{Clock, SystemClock};
use time2meet_core::error::{AppError, Result};
use time2meet_core::ids::{EventId, TicketId, TicketTypeId, UserId};
use time2meet_core::money::{Capacity, Money};
use time2meet_core::status::{EventStatus, TicketStatus, UserRole};
use time2meet_core::store::{AuditContextSetter, NewTicket, TicketInventory, TransactionalStore};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

const ACTOR_SETTING: &str = "app.user_id";
const ORIGIN_SETTING: &str = "app.ip";

/// Stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Primary key
    pub id: UserId,
    /// Lower-cased, unique
    pub email: String,
    /// Password hash
    pub password_hash: String,
    /// Display name
    pub full_name: String,
    /// Phone, NULL when absent
    pub phone: Option<String>,
    /// Role
    pub role: UserRole,
    /// Account enabled
    pub is_active: bool,
}

/// Stored event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Primary key
    pub id: EventId,
    /// Organizer
    pub organizer_id: UserId,
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Status
    pub status: EventStatus,
    /// Listed publicly
    pub is_public: bool,
    /// Participant cap
    pub max_participants: Option<i32>,
    /// Cover image
    pub cover_image: Option<String>,
}

/// Stored ticket type. `quantity_sold` is derived, see [`InMemoryStore::capacity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTypeRecord {
    /// Primary key
    pub id: TicketTypeId,
    /// Owning event
    pub event_id: EventId,
    /// List price
    pub price: Money,
    /// Capacity
    pub quantity_total: u32,
}

/// Stored ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    /// Primary key
    pub id: TicketId,
    /// Ticket type
    pub ticket_type_id: TicketTypeId,
    /// Buyer
    pub buyer_id: UserId,
    /// Purchase time
    pub purchase_date: DateTime<Utc>,
    /// Status
    pub status: TicketStatus,
    /// Unique QR token
    pub qr_code: String,
    /// Amount paid
    pub amount_paid: Money,
    /// Last validation time
    pub used_at: Option<DateTime<Utc>>,
}

/// One row of the emulated audit trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Table written
    pub table: &'static str,
    /// `INSERT` or `UPDATE`
    pub operation: &'static str,
    /// Primary key of the written row
    pub row_id: Uuid,
    /// Actor stamped on the transaction, if any
    pub actor_id: Option<UserId>,
    /// Origin address stamped on the transaction, if any
    pub origin_address: Option<String>,
}

#[derive(Debug, Clone)]
enum Write {
    InsertUser(UserRecord),
    InsertEvent(EventRecord),
    InsertTicket(TicketRecord),
    MarkUsed {
        ticket_id: TicketId,
        used_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<UserRecord>,
    events: Vec<EventRecord>,
    ticket_types: HashMap<TicketTypeId, TicketTypeRecord>,
    tickets: Vec<TicketRecord>,
    audit_log: Vec<AuditEntry>,
}

impl Tables {
    fn sold(&self, ticket_type_id: TicketTypeId) -> usize {
        self.tickets
            .iter()
            .filter(|t| t.ticket_type_id == ticket_type_id && t.status.counts_as_sold())
            .count()
    }

    fn apply(&mut self, write: Write, settings: &HashMap<&'static str, String>) -> Result<()> {
        let (table, operation, row_id) = match write {
            Write::InsertUser(user) => {
                if self.users.iter().any(|u| u.email == user.email) {
                    return Err(unique_violation("users_email_key", &user.email));
                }
                let id = *user.id.as_uuid();
                self.users.push(user);
                ("users", "INSERT", id)
            }
            Write::InsertEvent(event) => {
                let id = *event.id.as_uuid();
                self.events.push(event);
                ("events", "INSERT", id)
            }
            Write::InsertTicket(ticket) => {
                if self.tickets.iter().any(|t| t.qr_code == ticket.qr_code) {
                    return Err(unique_violation("tickets_qr_code_key", &ticket.qr_code));
                }
                let id = *ticket.id.as_uuid();
                self.tickets.push(ticket);
                ("tickets", "INSERT", id)
            }
            Write::MarkUsed { ticket_id, used_at } => {
                let ticket = self
                    .tickets
                    .iter_mut()
                    .find(|t| t.id == ticket_id)
                    .ok_or_else(|| AppError::internal("apply update", "ticket vanished"))?;
                ticket.status = TicketStatus::Used;
                ticket.used_at = Some(used_at);
                ("tickets", "UPDATE", *ticket_id.as_uuid())
            }
        };

        self.audit_log.push(AuditEntry {
            table,
            operation,
            row_id,
            actor_id: settings
                .get(ACTOR_SETTING)
                .and_then(|s| UserId::parse(s).ok()),
            origin_address: settings.get(ORIGIN_SETTING).cloned(),
        });
        Ok(())
    }
}

fn unique_violation(constraint: &str, value: &str) -> AppError {
    AppError::conflict_caused_by(
        "unique constraint violated",
        format!("{constraint}: {value}"),
    )
}

fn foreign_key_violation(constraint: &str, id: impl std::fmt::Display) -> AppError {
    AppError::conflict_caused_by(
        "referenced row does not exist",
        format!("{constraint}: {id}"),
    )
}

#[derive(Debug, Default)]
struct Faults {
    begin: AtomicBool,
    commit: AtomicBool,
    audit: AtomicBool,
}

struct Inner {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<TicketTypeId, Arc<tokio::sync::Mutex<()>>>>,
    faults: Faults,
    open: AtomicUsize,
    commits: AtomicUsize,
    clock: Arc<dyn Clock>,
}

/// In-memory store for fast, deterministic use-case tests.
///
/// Cloning shares the underlying tables.
///
/// # Example
///
/// ```
/// use time2meet_testing::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// let organizer = store.seed_user("org@example.com");
/// let event = store.seed_event(organizer);
/// let ticket_type = store.seed_ticket_type(event, 2);
///
/// let capacity = store.capacity(ticket_type).unwrap();
/// assert_eq!(capacity.remaining(), 2);
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("open_transactions", &self.open_transactions())
            .field("commits", &self.commits())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store whose `NOW()` is `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                faults: Faults::default(),
                open: AtomicUsize::new(0),
                commits: AtomicUsize::new(0),
                clock,
            }),
        }
    }

    // ── Fault injection ─────────────────────────────────────────────────

    /// Make every `begin` fail.
    pub fn fail_begin(&self, fail: bool) {
        self.inner.faults.begin.store(fail, Ordering::SeqCst);
    }

    /// Make every `commit` fail (the transaction is discarded).
    pub fn fail_commit(&self, fail: bool) {
        self.inner.faults.commit.store(fail, Ordering::SeqCst);
    }

    /// Make every audit stamp fail.
    pub fn fail_audit(&self, fail: bool) {
        self.inner.faults.audit.store(fail, Ordering::SeqCst);
    }

    // ── Seeding (auto-committed, not audited) ───────────────────────────

    /// Insert an active attendee.
    pub fn seed_user(&self, email: &str) -> UserId {
        let id = UserId::new();
        self.inner.tables.lock().unwrap().users.push(UserRecord {
            id,
            email: email.to_lowercase(),
            password_hash: "seeded".to_string(),
            full_name: email.to_string(),
            phone: None,
            role: UserRole::Attendee,
            is_active: true,
        });
        id
    }

    /// Insert a published event.
    pub fn seed_event(&self, organizer_id: UserId) -> EventId {
        let id = EventId::new();
        self.inner.tables.lock().unwrap().events.push(EventRecord {
            id,
            organizer_id,
            title: "Seeded event".to_string(),
            description: None,
            status: EventStatus::Published,
            is_public: true,
            max_participants: None,
            cover_image: None,
        });
        id
    }

    /// Insert a ticket type with `quantity_total` seats.
    pub fn seed_ticket_type(&self, event_id: EventId, quantity_total: u32) -> TicketTypeId {
        let id = TicketTypeId::new();
        self.inner.tables.lock().unwrap().ticket_types.insert(
            id,
            TicketTypeRecord {
                id,
                event_id,
                price: Money::ZERO,
                quantity_total,
            },
        );
        id
    }

    /// Insert a ticket directly in `status`.
    pub fn seed_ticket(
        &self,
        ticket_type_id: TicketTypeId,
        buyer_id: UserId,
        status: TicketStatus,
    ) -> TicketId {
        let id = TicketId::new();
        self.inner.tables.lock().unwrap().tickets.push(TicketRecord {
            id,
            ticket_type_id,
            buyer_id,
            purchase_date: self.inner.clock.now(),
            status,
            qr_code: format!("SEED-{id}"),
            amount_paid: Money::ZERO,
            used_at: None,
        });
        id
    }

    // ── Inspection ──────────────────────────────────────────────────────

    /// Committed capacity counters of a ticket type.
    #[must_use]
    pub fn capacity(&self, ticket_type_id: TicketTypeId) -> Option<Capacity> {
        let tables = self.inner.tables.lock().unwrap();
        let ticket_type = tables.ticket_types.get(&ticket_type_id)?;
        let sold = u32::try_from(tables.sold(ticket_type_id)).ok()?;
        Some(Capacity::new(ticket_type.quantity_total, sold))
    }

    /// Committed tickets in insertion order.
    #[must_use]
    pub fn tickets(&self) -> Vec<TicketRecord> {
        self.inner.tables.lock().unwrap().tickets.clone()
    }

    /// A committed ticket.
    #[must_use]
    pub fn ticket(&self, ticket_id: TicketId) -> Option<TicketRecord> {
        self.inner
            .tables
            .lock()
            .unwrap()
            .tickets
            .iter()
            .find(|t| t.id == ticket_id)
            .cloned()
    }

    /// Committed users in insertion order.
    #[must_use]
    pub fn users(&self) -> Vec<UserRecord> {
        self.inner.tables.lock().unwrap().users.clone()
    }

    /// Committed events in insertion order.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.inner.tables.lock().unwrap().events.clone()
    }

    /// Audit entries written by committed transactions.
    #[must_use]
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.inner.tables.lock().unwrap().audit_log.clone()
    }

    /// Transactions begun and not yet committed or dropped.
    #[must_use]
    pub fn open_transactions(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Successful commits so far.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    // ── Statement helpers ───────────────────────────────────────────────

    fn row_lock(&self, ticket_type_id: TicketTypeId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.inner.row_locks.lock().unwrap();
        Arc::clone(locks.entry(ticket_type_id).or_default())
    }

    fn ticket_type_exists(&self, ticket_type_id: TicketTypeId) -> bool {
        self.inner
            .tables
            .lock()
            .unwrap()
            .ticket_types
            .contains_key(&ticket_type_id)
    }

    fn locked_capacity(&self, tx: &InMemoryTx, ticket_type_id: TicketTypeId) -> Result<Capacity> {
        let tables = self.inner.tables.lock().unwrap();
        let ticket_type = tables
            .ticket_types
            .get(&ticket_type_id)
            .ok_or_else(|| AppError::not_found("ticket type not found"))?;
        let pending = tx
            .pending_tickets()
            .filter(|t| t.ticket_type_id == ticket_type_id && t.status.counts_as_sold())
            .count();
        let sold = u32::try_from(tables.sold(ticket_type_id) + pending)
            .map_err(|e| AppError::internal("lock ticket type failed", e))?;
        Ok(Capacity::new(ticket_type.quantity_total, sold))
    }

    fn user_exists(&self, tx: &InMemoryTx, user_id: UserId) -> bool {
        tx.pending_users().any(|u| u.id == user_id)
            || self.inner.tables.lock().unwrap().users.iter().any(|u| u.id == user_id)
    }

    fn check_new_ticket(&self, tx: &InMemoryTx, ticket: &TicketRecord) -> Result<()> {
        if !self.ticket_type_exists(ticket.ticket_type_id) {
            return Err(foreign_key_violation(
                "tickets_ticket_type_id_fkey",
                ticket.ticket_type_id,
            ));
        }
        if !self.user_exists(tx, ticket.buyer_id) {
            return Err(foreign_key_violation("tickets_buyer_id_fkey", ticket.buyer_id));
        }
        let duplicate = tx.pending_tickets().any(|t| t.qr_code == ticket.qr_code)
            || self
                .inner
                .tables
                .lock()
                .unwrap()
                .tickets
                .iter()
                .any(|t| t.qr_code == ticket.qr_code);
        if duplicate {
            return Err(unique_violation("tickets_qr_code_key", &ticket.qr_code));
        }
        Ok(())
    }

    fn ticket_status(&self, tx: &InMemoryTx, ticket_id: TicketId) -> Option<TicketStatus> {
        let pending_update = tx.writes.iter().rev().find_map(|w| match w {
            Write::MarkUsed { ticket_id: id, .. } if *id == ticket_id => Some(TicketStatus::Used),
            Write::InsertTicket(t) if t.id == ticket_id => Some(t.status),
            _ => None,
        });
        pending_update.or_else(|| {
            self.inner
                .tables
                .lock()
                .unwrap()
                .tickets
                .iter()
                .find(|t| t.id == ticket_id)
                .map(|t| t.status)
        })
    }
}

/// Transaction handle of [`InMemoryStore`].
///
/// Dropping it without [`TransactionalStore::commit`] discards all pending
/// writes and releases its row locks.
pub struct InMemoryTx {
    writes: Vec<Write>,
    savepoints: Vec<(String, usize)>,
    settings: HashMap<&'static str, String>,
    locked: HashSet<TicketTypeId>,
    guards: Vec<OwnedMutexGuard<()>>,
    aborted: bool,
    store: Arc<Inner>,
}

impl std::fmt::Debug for InMemoryTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTx")
            .field("writes", &self.writes.len())
            .field("savepoints", &self.savepoints)
            .field("locked", &self.locked)
            .field("aborted", &self.aborted)
            .finish_non_exhaustive()
    }
}

impl InMemoryTx {
    fn pending_users(&self) -> impl Iterator<Item = &UserRecord> {
        self.writes.iter().filter_map(|w| match w {
            Write::InsertUser(u) => Some(u),
            _ => None,
        })
    }

    fn pending_tickets(&self) -> impl Iterator<Item = &TicketRecord> {
        self.writes.iter().filter_map(|w| match w {
            Write::InsertTicket(t) => Some(t),
            _ => None,
        })
    }

    fn ensure_active(&self) -> Result<()> {
        if self.aborted {
            return Err(AppError::internal(
                "statement rejected",
                "current transaction is aborted, commands ignored until end of transaction block",
            ));
        }
        Ok(())
    }

    /// Record the outcome of a statement; a failure aborts the transaction.
    fn statement<T>(&mut self, outcome: Result<T>) -> Result<T> {
        if outcome.is_err() {
            self.aborted = true;
        }
        outcome
    }
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        self.store.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TransactionalStore for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        if self.inner.faults.begin.load(Ordering::SeqCst) {
            return Err(AppError::internal("begin", "connection refused"));
        }
        self.inner.open.fetch_add(1, Ordering::SeqCst);
        Ok(InMemoryTx {
            writes: Vec::new(),
            savepoints: Vec::new(),
            settings: HashMap::new(),
            locked: HashSet::new(),
            guards: Vec::new(),
            aborted: false,
            store: Arc::clone(&self.inner),
        })
    }

    async fn commit(&self, mut tx: InMemoryTx) -> Result<()> {
        if self.inner.faults.commit.load(Ordering::SeqCst) {
            return Err(AppError::internal("commit", "connection reset by peer"));
        }
        tx.ensure_active()?;

        {
            let mut tables = self.inner.tables.lock().unwrap();
            let mut next = tables.clone();
            for write in std::mem::take(&mut tx.writes) {
                next.apply(write, &tx.settings)?;
            }
            *tables = next;
        }
        self.inner.commits.fetch_add(1, Ordering::SeqCst);

        // Writes are visible before the row locks are released.
        drop(tx);
        Ok(())
    }

    async fn rollback(&self, tx: InMemoryTx) -> Result<()> {
        drop(tx);
        Ok(())
    }
}

impl AuditContextSetter<InMemoryTx> for InMemoryStore {
    async fn stamp(&self, tx: &mut InMemoryTx, actor_id: UserId, origin_address: &str) -> Result<()> {
        tx.ensure_active()?;
        if !actor_id.is_nil() {
            if self.inner.faults.audit.load(Ordering::SeqCst) {
                tx.aborted = true;
                return Err(AppError::internal(
                    "set audit user_id failed",
                    "permission denied for set_config",
                ));
            }
            tx.settings.insert(ACTOR_SETTING, actor_id.to_string());
        }
        if !origin_address.is_empty() {
            if self.inner.faults.audit.load(Ordering::SeqCst) {
                tx.aborted = true;
                return Err(AppError::internal(
                    "set audit ip failed",
                    "permission denied for set_config",
                ));
            }
            tx.settings
                .insert(ORIGIN_SETTING, origin_address.to_string());
        }
        Ok(())
    }
}

impl TicketInventory<InMemoryTx> for InMemoryStore {
    async fn lock_ticket_type_for_update(
        &self,
        tx: &mut InMemoryTx,
        ticket_type_id: TicketTypeId,
    ) -> Result<Capacity> {
        tx.ensure_active()?;
        if !self.ticket_type_exists(ticket_type_id) {
            return Err(AppError::not_found("ticket type not found"));
        }
        if !tx.locked.contains(&ticket_type_id) {
            let guard = self.row_lock(ticket_type_id).lock_owned().await;
            tx.locked.insert(ticket_type_id);
            tx.guards.push(guard);
        }
        let capacity = self.locked_capacity(tx, ticket_type_id);
        tx.statement(capacity)
    }

    async fn insert_paid_ticket(&self, tx: &mut InMemoryTx, ticket: NewTicket) -> Result<TicketId> {
        tx.ensure_active()?;
        let record = TicketRecord {
            id: TicketId::new(),
            ticket_type_id: ticket.ticket_type_id,
            buyer_id: ticket.buyer_id,
            purchase_date: ticket.purchased_at,
            status: TicketStatus::Paid,
            qr_code: ticket.qr_code,
            amount_paid: ticket.amount_paid,
            used_at: None,
        };
        let checked = self
            .check_new_ticket(tx, &record)
            .map_err(|e| AppError::internal("insert ticket failed", e.row_message()));
        tx.statement(checked)?;

        let id = record.id;
        tx.writes.push(Write::InsertTicket(record));
        Ok(id)
    }

    async fn mark_ticket_used(
        &self,
        tx: &mut InMemoryTx,
        ticket_id: TicketId,
        used_at: DateTime<Utc>,
    ) -> Result<bool> {
        tx.ensure_active()?;
        match self.ticket_status(tx, ticket_id) {
            Some(status) if status.accepts_validation() => {
                tx.writes.push(Write::MarkUsed { ticket_id, used_at });
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl Savepoints<InMemoryTx> for InMemoryStore {
    async fn savepoint(&self, tx: &mut InMemoryTx, name: &str) -> Result<()> {
        tx.ensure_active()?;
        tx.savepoints.push((name.to_string(), tx.writes.len()));
        Ok(())
    }

    async fn rollback_to_savepoint(&self, tx: &mut InMemoryTx, name: &str) -> Result<()> {
        let position = tx
            .savepoints
            .iter()
            .rposition(|(n, _)| n == name)
            .ok_or_else(|| AppError::internal("rollback to savepoint", format!("savepoint \"{name}\" does not exist")))?;
        let mark = tx.savepoints[position].1;
        tx.savepoints.truncate(position + 1);
        tx.writes.truncate(mark);
        tx.aborted = false;
        Ok(())
    }

    async fn release_savepoint(&self, tx: &mut InMemoryTx, name: &str) -> Result<()> {
        tx.ensure_active()?;
        let position = tx
            .savepoints
            .iter()
            .rposition(|(n, _)| n == name)
            .ok_or_else(|| AppError::internal("release savepoint", format!("savepoint \"{name}\" does not exist")))?;
        tx.savepoints.truncate(position);
        Ok(())
    }
}

impl RowInserter<InMemoryTx, NewUserRow> for InMemoryStore {
    async fn insert_row(&self, tx: &mut InMemoryTx, row: &NewUserRow) -> Result<()> {
        tx.ensure_active()?;
        let email = row.email.as_str();
        let duplicate = tx.pending_users().any(|u| u.email == email)
            || self
                .inner
                .tables
                .lock()
                .unwrap()
                .users
                .iter()
                .any(|u| u.email == email);
        if duplicate {
            return tx.statement(Err(unique_violation("users_email_key", email)));
        }
        tx.writes.push(Write::InsertUser(UserRecord {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: row.password_hash.clone(),
            full_name: row.full_name.clone(),
            phone: row.phone.clone(),
            role: row.role,
            is_active: true,
        }));
        Ok(())
    }
}

impl RowInserter<InMemoryTx, NewEventRow> for InMemoryStore {
    async fn insert_row(&self, tx: &mut InMemoryTx, row: &NewEventRow) -> Result<()> {
        tx.ensure_active()?;
        if !self.user_exists(tx, row.organizer_id) {
            return tx.statement(Err(foreign_key_violation(
                "events_organizer_id_fkey",
                row.organizer_id,
            )));
        }
        tx.writes.push(Write::InsertEvent(EventRecord {
            id: EventId::new(),
            organizer_id: row.organizer_id,
            title: row.title.clone(),
            description: row.description.clone(),
            status: row.status,
            is_public: row.is_public,
            max_participants: row.max_participants,
            cover_image: row.cover_image.clone(),
        }));
        Ok(())
    }
}

impl RowInserter<InMemoryTx, NewTicketRow> for InMemoryStore {
    async fn insert_row(&self, tx: &mut InMemoryTx, row: &NewTicketRow) -> Result<()> {
        tx.ensure_active()?;
        let record = TicketRecord {
            id: TicketId::new(),
            ticket_type_id: row.ticket_type_id,
            buyer_id: row.buyer_id,
            purchase_date: row.purchase_date.unwrap_or_else(|| self.inner.clock.now()),
            status: row.status,
            qr_code: row.qr_code.clone(),
            amount_paid: row.amount_paid,
            used_at: None,
        };
        let checked = self.check_new_ticket(tx, &record);
        tx.statement(checked)?;
        tx.writes.push(Write::InsertTicket(record));
        Ok(())
    }
}
