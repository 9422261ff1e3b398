//! Use cases.
//!
//! Every use case owns a [`UnitOfWork`](time2meet_core::UnitOfWork) and is
//! generic over the store, so the same code runs against `PostgreSQL` and the
//! in-memory test store.

pub mod import;
pub mod purchase;
pub mod services;
pub mod validate;

pub use import::{BatchImport, BatchRequest};
pub use purchase::{PurchaseRequest, PurchaseTicket, ValidatedPurchase};
pub use services::TicketingServices;
pub use validate::{ValidateRequest, ValidateTicket};
