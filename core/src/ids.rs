//! Strongly typed identifiers.
//!
//! All identities are UUIDs. The nil UUID stands for "no identity": an
//! anonymous actor, or a required id the caller forgot to supply.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The nil identifier.
            #[must_use]
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns `true` for the nil identifier.
            #[must_use]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Parses a textual UUID, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns [`AppError::Validation`] if the text is empty or not a UUID.
            pub fn parse(s: &str) -> Result<Self, AppError> {
                let s = s.trim();
                if s.is_empty() {
                    return Err(AppError::validation(concat!($label, " is empty")));
                }
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| AppError::validation(format!(concat!("invalid ", $label, ": {}"), e)))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Identity of a user (buyer, organizer, or acting administrator).
    UserId,
    "user_id"
);
uuid_id!(
    /// Identity of an event.
    EventId,
    "event_id"
);
uuid_id!(
    /// Identity of a ticket type (a purchasable category of an event).
    TicketTypeId,
    "ticket_type_id"
);
uuid_id!(
    /// Identity of a sold ticket.
    TicketId,
    "ticket_id"
);
