//! Timestamp formats used on the wire.
//!
//! Two distinct formats are in play:
//!
//! - [`IlpTimestamp`] - the ILP packet `expiresAt` field: 17 ASCII digits
//!   `YYYYMMDDHHMMSSmmm`, UTC implied, millisecond precision.
//! - [`ClaimTimestamp`] - the payment-channel claim `timestamp` field:
//!   strict ISO-8601 UTC with a `Z` suffix and millisecond precision.
//!
//! Both types round-trip only millisecond precision; sub-millisecond
//! components are lossy by design (see `spec.md` Design Notes).

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::fmt;

/// The ILP wire timestamp format: 17 ASCII digits, `YYYYMMDDHHMMSSmmm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IlpTimestamp(DateTime<Utc>);

/// Errors parsing an [`IlpTimestamp`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IlpTimestampError {
    #[error("timestamp must be exactly 17 ASCII digits, got {0:?}")]
    WrongShape(String),
    #[error("timestamp does not denote a valid calendar date/time")]
    NotACalendarInstant,
}

impl IlpTimestamp {
    pub fn now() -> Self {
        let now = Utc::now();
        let millis = now.timestamp_millis();
        IlpTimestamp(Utc.timestamp_millis_opt(millis).unwrap())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let millis = dt.timestamp_millis();
        IlpTimestamp(Utc.timestamp_millis_opt(millis).unwrap())
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parses the 17-digit `YYYYMMDDHHMMSSmmm` format.
    pub fn parse(s: &str) -> Result<Self, IlpTimestampError> {
        if s.len() != 17 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IlpTimestampError::WrongShape(s.to_string()));
        }
        let (date_time, millis) = s.split_at(14);
        let naive = NaiveDateTime::parse_from_str(date_time, "%Y%m%d%H%M%S")
            .map_err(|_| IlpTimestampError::NotACalendarInstant)?;
        let millis: u32 = millis
            .parse()
            .map_err(|_| IlpTimestampError::NotACalendarInstant)?;
        let dt = Utc
            .from_utc_datetime(&naive)
            .checked_add_signed(chrono::Duration::milliseconds(millis as i64))
            .ok_or(IlpTimestampError::NotACalendarInstant)?;
        Ok(IlpTimestamp(dt))
    }

    /// Formats as the 17-digit `YYYYMMDDHHMMSSmmm` wire format.
    pub fn to_wire_string(&self) -> String {
        format!(
            "{}{:03}",
            self.0.format("%Y%m%d%H%M%S"),
            self.0.timestamp_subsec_millis()
        )
    }
}

impl fmt::Display for IlpTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire_string())
    }
}

/// The claim message's ISO-8601 UTC timestamp, e.g. `2026-02-02T12:00:00.000Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClaimTimestamp(DateTime<Utc>);

/// Errors parsing a [`ClaimTimestamp`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimTimestampError {
    #[error("timestamp is not valid RFC3339/ISO-8601")]
    NotRfc3339,
    #[error("timestamp does not re-format identically to its canonical form")]
    NotCanonical,
}

impl ClaimTimestamp {
    pub fn now() -> Self {
        ClaimTimestamp::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let millis = dt.timestamp_millis();
        ClaimTimestamp(Utc.timestamp_millis_opt(millis).unwrap())
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parses a strict ISO-8601 UTC timestamp with `Z` suffix and millisecond
    /// precision, rejecting any input that would not re-format to itself.
    pub fn parse(s: &str) -> Result<Self, ClaimTimestampError> {
        let parsed =
            DateTime::parse_from_rfc3339(s).map_err(|_| ClaimTimestampError::NotRfc3339)?;
        let utc = parsed.with_timezone(&Utc);
        let canonical = ClaimTimestamp::from_datetime(utc);
        if canonical.to_wire_string() != s {
            return Err(ClaimTimestampError::NotCanonical);
        }
        Ok(canonical)
    }

    /// Formats as strict ISO-8601 UTC with `Z` suffix and millisecond precision.
    pub fn to_wire_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Display for ClaimTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire_string())
    }
}

impl serde::Serialize for ClaimTimestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire_string())
    }
}

impl<'de> serde::Deserialize<'de> for ClaimTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ClaimTimestamp::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ilp_timestamp_round_trip() {
        let s = "20251231235959999";
        let ts = IlpTimestamp::parse(s).unwrap();
        assert_eq!(ts.to_wire_string(), s);
    }

    #[test]
    fn test_ilp_timestamp_rejects_wrong_length() {
        assert!(IlpTimestamp::parse("2025123123595999").is_err());
    }

    #[test]
    fn test_ilp_timestamp_rejects_non_digits() {
        assert!(IlpTimestamp::parse("2025123123595999X").is_err());
    }

    #[test]
    fn test_claim_timestamp_round_trip() {
        let s = "2026-02-02T12:00:00.000Z";
        let ts = ClaimTimestamp::parse(s).unwrap();
        assert_eq!(ts.to_wire_string(), s);
    }

    #[test]
    fn test_claim_timestamp_rejects_non_canonical() {
        // Missing milliseconds, a valid RFC3339 instant but not our canonical form.
        assert!(ClaimTimestamp::parse("2026-02-02T12:00:00Z").is_err());
        // Non-UTC offset.
        assert!(ClaimTimestamp::parse("2026-02-02T12:00:00.000+01:00").is_err());
    }

    #[test]
    fn test_claim_timestamp_rejects_garbage() {
        assert!(ClaimTimestamp::parse("not-a-timestamp").is_err());
    }
}
