//! Normalized e-mail addresses.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed, lower-cased e-mail address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parses and normalizes an address.
    ///
    /// The check is structural only: one `@`, a non-empty local part, and a
    /// dotted domain without whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the address is empty or malformed.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AppError::validation("email is empty"));
        }
        let invalid = || AppError::validation(format!("invalid email: {s:?}"));
        let (local, domain) = s.split_once('@').ok_or_else(invalid)?;
        if local.is_empty()
            || domain.contains('@')
            || s.chars().any(char::is_whitespace)
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(invalid());
        }
        Ok(Self(s.to_lowercase()))
    }

    /// The normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let email = Email::parse("  Alice@Example.COM ").ok();
        assert_eq!(email.as_ref().map(Email::as_str), Some("alice@example.com"));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "alice", "@example.com", "alice@example", "a@b@c.com", "a b@c.com", "a@.com"] {
            assert!(Email::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
