//! Type-safe price representation using decimal arithmetic.
//!
//! Money never touches floating point. Menu prices come off the wire as
//! decimal strings and every cart computation stays in [`Decimal`], so the
//! cart total is exact no matter how the lines are accumulated.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative amount of money in the platform's display currency.
///
/// ## Constraints
///
/// - Amount is always `>= 0`; construction rejects negative values and
///   deserialization goes through the same check.
///
/// ## Examples
///
/// ```
/// use dishly_core::Price;
/// use rust_decimal::Decimal;
///
/// let unit = Price::new(Decimal::new(1050, 2)).unwrap(); // 10.50
/// let line = unit.times(3);
/// assert_eq!(line.to_string(), "$31.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in minor units (e.g. cents).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn from_minor_units(minor: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(minor, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply a unit price by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        let err = Price::new(Decimal::new(-1, 2)).unwrap_err();
        assert!(matches!(err, PriceError::Negative(_)));
    }

    #[test]
    fn test_new_accepts_zero() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_times() {
        let price = Price::from_minor_units(1000).unwrap();
        assert_eq!(price.times(2), Price::from_minor_units(2000).unwrap());
        assert_eq!(price.times(0), Price::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Price = [
            Price::from_minor_units(1050).unwrap(),
            Price::from_minor_units(550).unwrap(),
        ]
        .into_iter()
        .sum();
        assert_eq!(total, Price::from_minor_units(1600).unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_minor_units(1999).unwrap().to_string(), "$19.99");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("\"-3.50\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let price = Price::from_minor_units(1250).unwrap();
        let json = serde_json::to_string(&price).unwrap();
        let parsed: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, price);
    }
}
