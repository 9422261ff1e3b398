//! Error taxonomy shared by every layer of the ticket-inventory engine.
//!
//! Every failure surfaced to a caller is an [`AppError`]. Each variant maps to
//! a machine-readable [`ErrorCode`] and carries a human-readable message. The
//! variants that usually originate in infrastructure (`Conflict`, `Internal`,
//! `Unavailable`) may also carry a `cause` string. The cause is kept for logs
//! only: `Display` renders the message alone, so database text never reaches
//! the caller through the message.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for ticket-inventory operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or missing input. Never retried automatically.
    Validation,
    /// Referenced entity is absent or in a state that makes the operation inapplicable.
    NotFound,
    /// Business-rule violation (sold out, aborted batch, constraint violation).
    Conflict,
    /// Unexpected failure.
    Internal,
    /// Transaction could not be started or committed. Safe to retry.
    Unavailable,
}

impl ErrorCode {
    /// Wire representation of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
            Self::Unavailable => "unavailable",
        }
    }

    /// Conventional HTTP status for the code.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
            Self::Unavailable => 503,
        }
    }

    /// Returns `true` if the caller may retry the whole operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every operation of the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("{message}")]
    Validation {
        /// Human-readable description
        message: String,
    },

    /// Entity absent or in an inapplicable state.
    #[error("{message}")]
    NotFound {
        /// Human-readable description
        message: String,
    },

    /// Business-rule violation.
    #[error("{message}")]
    Conflict {
        /// Human-readable description
        message: String,
        /// Underlying failure, for logs
        cause: Option<String>,
    },

    /// Unexpected failure.
    #[error("{message}")]
    Internal {
        /// Human-readable description
        message: String,
        /// Underlying failure, for logs
        cause: Option<String>,
    },

    /// Transaction begin/commit failure or deadline exceeded.
    #[error("{message}")]
    Unavailable {
        /// Human-readable description
        message: String,
        /// Underlying failure, for logs
        cause: Option<String>,
    },
}

impl AppError {
    /// Build a [`AppError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a [`AppError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Build a [`AppError::Conflict`] without a cause.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            cause: None,
        }
    }

    /// Build a [`AppError::Conflict`] wrapping an underlying failure.
    pub fn conflict_caused_by(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self::Conflict {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// Build a [`AppError::Internal`] wrapping an underlying failure.
    pub fn internal(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self::Internal {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// Build a [`AppError::Unavailable`] wrapping an underlying failure.
    pub fn unavailable(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self::Unavailable {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// Machine-readable category.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::Validation,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Conflict { .. } => ErrorCode::Conflict,
            Self::Internal { .. } => ErrorCode::Internal,
            Self::Unavailable { .. } => ErrorCode::Unavailable,
        }
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::NotFound { message }
            | Self::Conflict { message, .. }
            | Self::Internal { message, .. }
            | Self::Unavailable { message, .. } => message,
        }
    }

    /// Underlying failure text, if any. Meant for logs, not for callers.
    #[must_use]
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Conflict { cause, .. }
            | Self::Internal { cause, .. }
            | Self::Unavailable { cause, .. } => cause.as_deref(),
            Self::Validation { .. } | Self::NotFound { .. } => None,
        }
    }

    /// Message for a per-row batch failure: the message, followed by the
    /// cause when there is one.
    #[must_use]
    pub fn row_message(&self) -> String {
        match self.cause() {
            Some(cause) => format!("{}: {cause}", self.message()),
            None => self.message().to_string(),
        }
    }
}
