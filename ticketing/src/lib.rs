//! Time2Meet ticketing: purchase, validation and bulk import.
//!
//! The application layer over `time2meet-core`:
//!
//! - **Purchase**: lock the ticket type row, check capacity, insert a paid
//!   ticket; concurrent buyers of the last seat get exactly one success
//! - **Validate**: mark a `paid`/`used` ticket as used
//! - **Batch import**: users, events and tickets with per-row save-points
//!
//! Every operation runs in one transaction with the caller's identity
//! stamped for the audit triggers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │   Purchase   │  │   Validate   │  │ Batch import │
//! └──────────────┘  └──────────────┘  └──────────────┘
//!        │                 │                  │
//!        └─────────────────┴──────────────────┘
//!                          │
//!                    UnitOfWork<S>
//!                          │
//!          ┌───────────────┴───────────────┐
//!          ▼                               ▼
//!   PostgresStore                   InMemoryStore
//!   (production)                    (tests)
//! ```

#![forbid(unsafe_code)]

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod metrics;

pub use app::{
    BatchImport, BatchRequest, PurchaseRequest, PurchaseTicket, TicketingServices, ValidateRequest,
    ValidateTicket,
};
pub use bootstrap::ResourceManager;
pub use config::Config;
