//! Arbitrary-precision decimal amount strings.
//!
//! Claim amounts (drops, wei, octas) are transported as decimal strings and
//! can carry far more significant digits than a 64-bit float or even a
//! 128-bit fixed-point type can hold losslessly (the test suite exercises
//! 30-digit amounts). Rather than parsing into a fixed-width numeric type,
//! [`DecimalAmount`] validates the string's shape and keeps the original
//! digits, so no precision is ever dropped on the wire or in memory.

use std::fmt;

/// A validated non-negative (optionally required positive) decimal string.
///
/// Canonical shape: an integer part with no leading zeros (unless the whole
/// integer part is exactly `"0"`), optionally followed by a `.` and one or
/// more fractional digits. No sign, no whitespace, no scientific notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecimalAmount(String);

/// Errors returned when a string fails to parse as a [`DecimalAmount`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalAmountError {
    #[error("amount must not be empty")]
    Empty,
    #[error("amount {0:?} is not a canonical non-negative decimal string")]
    InvalidShape(String),
    #[error("amount {0:?} must be strictly positive")]
    NotPositive(String),
}

impl DecimalAmount {
    /// Parses a non-negative decimal string (`"0"` is allowed).
    pub fn parse_non_negative(s: &str) -> Result<Self, DecimalAmountError> {
        if s.is_empty() {
            return Err(DecimalAmountError::Empty);
        }
        if !is_canonical_decimal_shape(s) {
            return Err(DecimalAmountError::InvalidShape(s.to_string()));
        }
        Ok(DecimalAmount(s.to_string()))
    }

    /// Parses a strictly-positive decimal string (`"0"` and `"0.0"` are rejected).
    pub fn parse_positive(s: &str) -> Result<Self, DecimalAmountError> {
        let amount = Self::parse_non_negative(s)?;
        if amount.is_zero() {
            return Err(DecimalAmountError::NotPositive(s.to_string()));
        }
        Ok(amount)
    }

    /// `true` if every digit in the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0' || b == b'.')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_canonical_decimal_shape(s: &str) -> bool {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if int_part.len() > 1 && int_part.starts_with('0') {
        return false;
    }
    match frac_part {
        Some(f) => !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DecimalAmount {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for DecimalAmount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_integer() {
        assert!(DecimalAmount::parse_non_negative("1000000").is_ok());
    }

    #[test]
    fn test_accepts_thirty_digit_amount_without_precision_loss() {
        let thirty_digits = "123456789012345678901234567890";
        let amount = DecimalAmount::parse_positive(thirty_digits).unwrap();
        assert_eq!(amount.as_str(), thirty_digits);
    }

    #[test]
    fn test_rejects_leading_zero() {
        assert!(DecimalAmount::parse_non_negative("0123").is_err());
    }

    #[test]
    fn test_zero_is_non_negative_but_not_positive() {
        assert!(DecimalAmount::parse_non_negative("0").is_ok());
        assert!(DecimalAmount::parse_positive("0").is_err());
        assert!(DecimalAmount::parse_positive("0.000").is_err());
    }

    #[test]
    fn test_rejects_sign_and_scientific_notation() {
        assert!(DecimalAmount::parse_non_negative("-1").is_err());
        assert!(DecimalAmount::parse_non_negative("1e10").is_err());
    }

    #[test]
    fn test_accepts_decimal_fraction() {
        assert!(DecimalAmount::parse_positive("0.000000001").is_ok());
    }
}
