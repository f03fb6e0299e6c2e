//! Amount type for user-entered monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles
//! parsing values typed in chat, where either `,` or `.` may be used as the
//! decimal separator. Display always uses the comma convention.

use crate::error::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Represents a monetary amount with two decimal places.
///
/// Parsing accepts `,` or `.` as the decimal separator but at most one
/// separator character in total, so `"5,50"` and `"5.50"` are the same value
/// while `"1.234,56"` is rejected. Values are rounded to two decimal places,
/// midpoint away from zero.
///
/// # Examples
///
/// ```
/// # use ledger_bot::Amount;
/// let a = Amount::parse("12.5").unwrap();
/// let b = Amount::parse("12,5").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "12,50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    /// Creates a new `Amount`, rounding to two decimal places.
    pub fn new(value: Decimal) -> Self {
        Self {
            value: value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        }
    }

    /// Parses a user-supplied amount string.
    ///
    /// Empty input, more than one separator, or anything that does not parse
    /// as a decimal fails with `Error::InvalidAmountFormat` carrying the raw
    /// string. Bad input is never coerced to zero.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_amount(raw));
        }

        let separators = trimmed.chars().filter(|c| *c == ',' || *c == '.').count();
        if separators > 1 {
            return Err(Error::invalid_amount(raw));
        }

        let normalized = trimmed.replace(',', ".");
        let value = Decimal::from_str(&normalized).map_err(|_| Error::invalid_amount(raw))?;
        Ok(Self::new(value))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl fmt::Display for Amount {
    /// Two decimal digits, comma as the decimal separator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dotted = format!("{:.2}", self.value);
        write!(f, "{}", dotted.replace('.', ","))
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Amount::parse(s)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dot_separator() {
        let amount = Amount::parse("5.50").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("5.50").unwrap());
    }

    #[test]
    fn test_parse_comma_separator() {
        let amount = Amount::parse("5,50").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("5.50").unwrap());
    }

    #[test]
    fn test_parse_no_separator() {
        let amount = Amount::parse("42").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("42").unwrap());
    }

    #[test]
    fn test_parse_negative() {
        let amount = Amount::parse("-10,50").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("-10.50").unwrap());
    }

    #[test]
    fn test_parse_whitespace_around() {
        let amount = Amount::parse("  7,25  ").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("7.25").unwrap());
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("   ").is_err());
    }

    #[test]
    fn test_parse_non_numeric_fails() {
        assert!(Amount::parse("abc").is_err());
        assert!(Amount::parse("12x5").is_err());
    }

    #[test]
    fn test_parse_two_separators_fails() {
        assert!(Amount::parse("1.234,56").is_err());
        assert!(Amount::parse("1,234.56").is_err());
        assert!(Amount::parse("1..5").is_err());
        assert!(Amount::parse("1,,5").is_err());
    }

    #[test]
    fn test_parse_error_carries_raw_string() {
        let err = Amount::parse("1.2.3").unwrap_err();
        match err {
            Error::InvalidAmountFormat { raw } => assert_eq!(raw, "1.2.3"),
            other => panic!("expected InvalidAmountFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_rounds_midpoint_away_from_zero() {
        assert_eq!(Amount::parse("0,005").unwrap().to_string(), "0,01");
        assert_eq!(Amount::parse("2,675").unwrap().to_string(), "2,68");
        assert_eq!(Amount::parse("-0,005").unwrap().to_string(), "-0,01");
    }

    #[test]
    fn test_display_two_decimals_comma() {
        assert_eq!(Amount::parse("5,5").unwrap().to_string(), "5,50");
        assert_eq!(Amount::parse("5.5").unwrap().to_string(), "5,50");
        assert_eq!(Amount::parse("42").unwrap().to_string(), "42,00");
    }

    #[test]
    fn test_display_same_for_either_separator() {
        let dot = Amount::parse("12.5").unwrap();
        let comma = Amount::parse("12,5").unwrap();
        assert_eq!(dot.to_string(), comma.to_string());
        assert_eq!(dot, comma);
    }

    #[test]
    fn test_round_trip_through_display() {
        for raw in ["12.5", "12,5", "0,005", "1000", "-3,333"] {
            let parsed = Amount::parse(raw).unwrap();
            let again = Amount::parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed.value(), again.value(), "round trip for '{raw}'");
        }
    }

    #[test]
    fn test_serialize_as_display_string() {
        let amount = Amount::parse("5,50").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"5,50\"");
    }

    #[test]
    fn test_deserialize_either_separator() {
        let a: Amount = serde_json::from_str("\"5,50\"").unwrap();
        let b: Amount = serde_json::from_str("\"5.50\"").unwrap();
        assert_eq!(a, b);
    }
}
