//! Transaction amounts.
//!
//! [`PixAmount`] holds a non-negative decimal with at most two fraction
//! digits and always renders in fixed-point form with exactly two of them,
//! which is what the transaction amount field carries on the wire.
//!
//! # Example
//!
//! ```rust
//! use pix_codec::amount::PixAmount;
//!
//! let amount = PixAmount::parse("R$ 1,234.5").unwrap();
//! assert_eq!(amount.to_string(), "1234.50");
//! ```

use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

/// Fraction digits carried by every rendered amount.
pub const SCALE: u32 = 2;

/// A payment amount in the transaction currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PixAmount(Decimal);

/// Errors that can occur when building a [`PixAmount`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The input string could not be parsed as a number.
    #[error("Invalid number format")]
    InvalidFormat,
    /// The value is outside the allowed range.
    #[error(
        "Amount must be between {} and {}",
        constants::MIN_STR,
        constants::MAX_STR
    )]
    OutOfRange,
    /// Negative values are not allowed.
    #[error("Negative value is not allowed")]
    Negative,
    /// The input has more fraction digits than the currency supports.
    #[error("Too big of a precision: {0} fraction digits, at most {SCALE} allowed")]
    WrongPrecision(u32),
}

mod constants {
    use super::*;

    pub const MIN_STR: &str = "0.01";
    // Thirteen characters once rendered, the widest amount scanners accept.
    pub const MAX_STR: &str = "9999999999.99";

    pub static MIN: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MIN_STR).expect("valid decimal"));
    pub static MAX: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));
    pub static NOISE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\d\.\-]+").expect("valid regex"));
}

impl PixAmount {
    /// Parses a human-readable amount.
    ///
    /// Currency symbols, thousand separators and whitespace are stripped
    /// before parsing. Trailing zeros beyond the second fraction digit are
    /// accepted (`"1.500"`), other extra precision is not.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a number, is negative, carries
    /// more than two significant fraction digits or is out of range.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let cleaned = constants::NOISE.replace_all(input, "");
        let parsed = Decimal::from_str(&cleaned).map_err(|_| AmountError::InvalidFormat)?;
        Self::checked(parsed)
    }

    /// Builds an amount from an integer number of cents.
    pub fn from_cents(cents: u64) -> Result<Self, AmountError> {
        Self::checked(Decimal::from(cents) / Decimal::ONE_HUNDRED)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    fn checked(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }
        let normalized = value.normalize();
        if normalized.scale() > SCALE {
            return Err(AmountError::WrongPrecision(normalized.scale()));
        }
        if normalized < *constants::MIN || normalized > *constants::MAX {
            return Err(AmountError::OutOfRange);
        }
        Ok(PixAmount(normalized))
    }
}

impl FromStr for PixAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixAmount::parse(s)
    }
}

impl TryFrom<&str> for PixAmount {
    type Error = AmountError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        PixAmount::from_str(value)
    }
}

/// Rounds half away from zero to two places before range checks.
impl TryFrom<f64> for PixAmount {
    type Error = AmountError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let decimal = Decimal::from_f64(value).ok_or(if value.is_finite() {
            AmountError::OutOfRange
        } else {
            AmountError::InvalidFormat
        })?;
        let rounded = decimal.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        Self::checked(rounded)
    }
}

impl Display for PixAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fixed = self.0;
        fixed.rescale(SCALE);
        write!(f, "{fixed}")
    }
}

impl Serialize for PixAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PixAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PixAmount::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_exactly_two_fraction_digits() {
        assert_eq!(PixAmount::parse("10").unwrap().to_string(), "10.00");
        assert_eq!(PixAmount::parse("10.5").unwrap().to_string(), "10.50");
        assert_eq!(PixAmount::parse("0.01").unwrap().to_string(), "0.01");
        assert_eq!(PixAmount::parse("1.500").unwrap().to_string(), "1.50");
    }

    #[test]
    fn test_large_amount_is_fixed_point() {
        let amount = PixAmount::parse("9999999999.99").unwrap();
        assert_eq!(amount.to_string(), "9999999999.99");
        let amount = PixAmount::parse("1000000000").unwrap();
        assert_eq!(amount.to_string(), "1000000000.00");
    }

    #[test]
    fn test_strips_symbols_and_separators() {
        assert_eq!(PixAmount::parse("R$ 1,000.25").unwrap().to_string(), "1000.25");
        assert_eq!(PixAmount::parse(" $7 ").unwrap().to_string(), "7.00");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(PixAmount::parse("abc"), Err(AmountError::InvalidFormat));
        assert_eq!(PixAmount::parse("-1.00"), Err(AmountError::Negative));
        assert_eq!(PixAmount::parse("0"), Err(AmountError::OutOfRange));
        assert_eq!(PixAmount::parse("10000000000"), Err(AmountError::OutOfRange));
        assert_eq!(PixAmount::parse("1.005"), Err(AmountError::WrongPrecision(3)));
    }

    #[test]
    fn test_from_f64_rounds_to_cents() {
        assert_eq!(PixAmount::try_from(100.0).unwrap().to_string(), "100.00");
        assert_eq!(PixAmount::try_from(0.1 + 0.2).unwrap().to_string(), "0.30");
        assert_eq!(PixAmount::try_from(f64::NAN), Err(AmountError::InvalidFormat));
        assert_eq!(PixAmount::try_from(f64::INFINITY), Err(AmountError::InvalidFormat));
    }

    #[test]
    fn test_from_f64_beyond_decimal_range() {
        assert_eq!(PixAmount::try_from(1e30), Err(AmountError::OutOfRange));
        assert_eq!(PixAmount::try_from(1e11), Err(AmountError::OutOfRange));
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(PixAmount::from_cents(1050).unwrap().to_string(), "10.50");
        assert_eq!(PixAmount::from_cents(0), Err(AmountError::OutOfRange));
    }

    #[test]
    fn test_serde_as_string() {
        let amount = PixAmount::parse("12.3").unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"12.30\"");
        let back: PixAmount = serde_json::from_str("\"12.30\"").unwrap();
        assert_eq!(back, amount);
        assert!(serde_json::from_str::<PixAmount>("\"-3\"").is_err());
    }
}
