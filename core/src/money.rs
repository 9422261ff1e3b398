//! Exact-decimal money and quantity value types.

use crate::error::AppError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits every amount is normalized to.
pub const MONEY_SCALE: u32 = 2;

/// A non-negative currency amount with exactly two fractional digits.
///
/// # Examples
///
/// ```
/// use time2meet_core::money::Money;
///
/// let amount = Money::parse("19.999").unwrap();
/// assert_eq!(amount.to_string(), "20.00");
/// assert!(Money::parse("-1.00").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validates and normalizes an amount.
    ///
    /// Negativity is checked before rounding, so `-0.001` is rejected.
    /// Rounding is half away from zero.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the amount is negative or too
    /// large to carry two fractional digits.
    pub fn new(amount: Decimal) -> Result<Self, AppError> {
        if amount < Decimal::ZERO {
            return Err(AppError::validation("amount must be >= 0"));
        }
        let mut normalized =
            amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        normalized.rescale(MONEY_SCALE);
        // rescale leaves the value untouched when the mantissa would overflow
        if normalized.scale() != MONEY_SCALE {
            return Err(AppError::validation("amount out of range"));
        }
        normalized.set_sign_positive(true);
        Ok(Self(normalized))
    }

    /// Parses a decimal string such as `"19.99"`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the text is not a decimal or is negative.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|e| AppError::validation(format!("amount must be decimal string: {e}")))?;
        Self::new(amount)
    }

    /// The normalized decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = AppError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

/// Capacity counters of a ticket type, as read under its row lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    /// Declared number of tickets for sale
    pub quantity_total: u32,
    /// Tickets already sold
    pub quantity_sold: u32,
}

impl Capacity {
    /// Creates capacity counters.
    #[must_use]
    pub const fn new(quantity_total: u32, quantity_sold: u32) -> Self {
        Self {
            quantity_total,
            quantity_sold,
        }
    }

    /// Converts counters read from storage.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if either counter is negative.
    pub fn from_storage(quantity_total: i32, quantity_sold: i32) -> Result<Self, AppError> {
        let total = u32::try_from(quantity_total)
            .map_err(|e| AppError::internal("negative quantity_total in storage", e))?;
        let sold = u32::try_from(quantity_sold)
            .map_err(|e| AppError::internal("negative quantity_sold in storage", e))?;
        Ok(Self::new(total, sold))
    }

    /// Returns `true` when no ticket is left.
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.quantity_sold >= self.quantity_total
    }

    /// Tickets still available.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.quantity_total.saturating_sub(self.quantity_sold)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(Money::parse("19.999").unwrap().to_string(), "20.00");
        assert_eq!(Money::parse("0.005").unwrap().to_string(), "0.01");
        assert_eq!(Money::parse("0.004").unwrap().to_string(), "0.00");
    }

    #[test]
    fn pads_to_two_digits() {
        assert_eq!(Money::parse("7").unwrap().to_string(), "7.00");
        assert_eq!(Money::parse(" 0.00 ").unwrap().to_string(), "0.00");
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert_eq!(
            Money::parse("-1.00").unwrap_err(),
            AppError::validation("amount must be >= 0")
        );
        assert!(Money::parse("-0.001").is_err());
        assert!(Money::parse("twelve").is_err());
        assert!(Money::parse("").is_err());
    }

    #[test]
    fn rejects_amounts_without_room_for_cents() {
        let largest = Money::parse("792281625142643375935439503.35").unwrap();
        assert_eq!(largest.amount().scale(), MONEY_SCALE);
        assert_eq!(largest.to_string(), "792281625142643375935439503.35");

        for text in [
            "79228162514264337593543950335",
            "7922816251426433759354395033",
            "792281625142643375935439504",
        ] {
            assert_eq!(
                Money::parse(text).unwrap_err(),
                AppError::validation("amount out of range"),
                "{text}"
            );
        }
    }

    #[test]
    fn deserialize_validates() {
        let ok: Money = serde_json::from_str("\"12.345\"").unwrap();
        assert_eq!(ok.to_string(), "12.35");
        assert!(serde_json::from_str::<Money>("\"-3\"").is_err());
    }

    #[test]
    fn capacity_from_storage() {
        let cap = Capacity::from_storage(10, 10).unwrap();
        assert!(cap.is_sold_out());
        assert_eq!(cap.remaining(), 0);
        assert!(Capacity::from_storage(10, -1).is_err());
        assert_eq!(Capacity::new(5, 2).remaining(), 3);
    }

    proptest! {
        #[test]
        fn normalized_amount_has_two_digits(units in 0i64..1_000_000_000, scale in 0u32..8) {
            let raw = Decimal::new(units, scale);
            let money = Money::new(raw).unwrap();
            prop_assert_eq!(money.amount().scale(), MONEY_SCALE);
            prop_assert!((money.amount() - raw).abs() <= Decimal::new(5, 3));
        }
    }
}
