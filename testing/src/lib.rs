//! # Time2Meet Testing
//!
//! Testing utilities and helpers for Time2Meet ticket inventory.
//!
//! This crate provides:
//! - [`InMemoryStore`]: every store seam over plain collections
//! - [`FixedClock`]: deterministic time
//! - Property-based testing strategies
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use time2meet_testing::{InMemoryStore, test_clock};
//!
//! #[tokio::test]
//! async fn sells_last_seat_once() {
//!     let store = InMemoryStore::new();
//!     let buyer = store.seed_user("buyer@example.com");
//!     let event = store.seed_event(buyer);
//!     let ticket_type = store.seed_ticket_type(event, 1);
//!
//!     let purchase = PurchaseTicket::new(store.clone(), Arc::new(test_clock()));
//!     purchase.purchase(request(buyer, ticket_type)).await.unwrap();
//!     assert!(purchase.purchase(request(buyer, ticket_type)).await.is_err());
//! }
//! ```

use chrono::{DateTime, Utc};
use time2meet_core::environment::Clock;

pub mod memory;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until moved with [`FixedClock::advance`].
    ///
    /// # Example
    ///
    /// ```
    /// use time2meet_testing::mocks::FixedClock;
    /// use time2meet_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug)]
    pub struct FixedClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self
                .time
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self
                .time
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Non-negative decimal strings with up to four fraction digits.
    pub fn amount_strings() -> impl Strategy<Value = String> {
        (0u64..1_000_000, 0u32..10_000, 0usize..=4).prop_map(|(units, fraction, digits)| {
            if digits == 0 {
                units.to_string()
            } else {
                let fraction = format!("{fraction:04}");
                format!("{units}.{}", &fraction[..digits])
            }
        })
    }

    /// Strings that are not decimal numbers.
    pub fn non_decimal_strings() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z ]{0,12}"
    }
}

/// Install a test-writer tracing subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use memory::InMemoryStore;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = test_clock();
        let before = clock.now();
        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now() - before, chrono::Duration::minutes(5));
    }
}
