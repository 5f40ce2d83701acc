//! ILP address grammar and validation.
//!
//! An ILP address is a dot-separated hierarchy of segments used to route
//! Interledger packets, e.g. `g.alice.wallet`. See [`Address::parse`] for the
//! exact grammar.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// The maximum length of an ILP address, in bytes.
pub const MAX_ADDRESS_LENGTH: usize = 1023;

/// A validated ILP address.
///
/// Addresses are non-empty, at most [`MAX_ADDRESS_LENGTH`] bytes, dot-separated
/// sequences of segments. Each segment matches `[A-Za-z0-9_-]+`; there is no
/// leading or trailing dot, and no empty segment (i.e. no consecutive dots).
///
/// # Example
///
/// ```
/// use ilp_types::Address;
///
/// let addr = Address::parse("g.alice.wallet").unwrap();
/// assert_eq!(addr.as_str(), "g.alice.wallet");
///
/// assert!(Address::parse("g..alice").is_err());
/// assert!(Address::parse(".g.alice").is_err());
/// assert!(Address::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

/// Errors returned when an address fails the grammar in [`Address::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must not be empty")]
    Empty,
    #[error("address exceeds maximum length of {MAX_ADDRESS_LENGTH} bytes")]
    TooLong,
    #[error("address must not start or end with a dot")]
    LeadingOrTrailingDot,
    #[error("address segment at position {0} is empty")]
    EmptySegment(usize),
    #[error("address segment {0:?} contains characters outside [A-Za-z0-9_-]")]
    InvalidSegment(String),
}

impl Address {
    /// Parses and validates an ILP address per the grammar documented on [`Address`].
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        if s.len() > MAX_ADDRESS_LENGTH {
            return Err(AddressError::TooLong);
        }
        if s.starts_with('.') || s.ends_with('.') {
            return Err(AddressError::LeadingOrTrailingDot);
        }
        for (i, segment) in s.split('.').enumerate() {
            if segment.is_empty() {
                return Err(AddressError::EmptySegment(i));
            }
            if !segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
            {
                return Err(AddressError::InvalidSegment(segment.to_string()));
            }
        }
        Ok(Address(s.to_string()))
    }

    /// Returns `true` if `s` is a valid ILP address.
    pub fn is_valid(s: &str) -> bool {
        Address::parse(s).is_ok()
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the address, returning the underlying `String`.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<&str> for Address {
    type Error = AddressError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Address::parse(value)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(de::Error::custom)
    }
}
