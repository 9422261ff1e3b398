//! Lifecycle enumerations stored as text columns.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a ticket.
///
/// A purchase creates a ticket as `Paid`; validation moves it to `Used`.
/// `Refunded` and `Void` are terminal and set outside this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Paid and not yet used
    Paid,
    /// Refunded to the buyer
    Refunded,
    /// Cancelled without refund
    Void,
    /// Presented and validated at the venue
    Used,
}

impl TicketStatus {
    /// Convert status to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Refunded => "refunded",
            Self::Void => "void",
            Self::Used => "used",
        }
    }

    /// Parse status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim() {
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            "void" => Ok(Self::Void),
            "used" => Ok(Self::Used),
            other => Err(AppError::validation(format!(
                "invalid ticket status: {other:?}"
            ))),
        }
    }

    /// Returns `true` if a validation may (re-)mark the ticket as used.
    #[must_use]
    pub const fn accepts_validation(&self) -> bool {
        matches!(self, Self::Paid | Self::Used)
    }

    /// Returns `true` if the ticket occupies a slot of its ticket type.
    #[must_use]
    pub const fn counts_as_sold(&self) -> bool {
        matches!(self, Self::Paid | Self::Used)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Being prepared
    Draft,
    /// Visible and on sale
    Published,
    /// Called off
    Cancelled,
    /// Already took place
    Completed,
}

impl EventStatus {
    /// Convert status to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Parse status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(AppError::validation(format!(
                "invalid event status: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Platform administrator
    Admin,
    /// Creates and runs events
    Organizer,
    /// Buys tickets and attends
    Attendee,
}

impl UserRole {
    /// Convert role to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Organizer => "organizer",
            Self::Attendee => "attendee",
        }
    }

    /// Parse role from its string representation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the string doesn't match a known role.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim() {
            "admin" => Ok(Self::Admin),
            "organizer" => Ok(Self::Organizer),
            "attendee" => Ok(Self::Attendee),
            other => Err(AppError::validation(format!("invalid user role: {other:?}"))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
