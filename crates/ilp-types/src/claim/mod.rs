//! Payment-channel claim message family.
//!
//! A claim is a signed authorization, specific to one payment channel,
//! permitting the recipient to withdraw up to a cumulative amount on its
//! home chain. The wire shape is discriminated by a `blockchain` tag; this
//! module validates untrusted JSON into a [`ClaimMessage`] and serializes a
//! [`ClaimMessage`] back to the same canonical shape.

mod aptos;
mod evm;
mod xrp;

pub use aptos::AptosClaim;
pub use evm::EvmClaim;
pub use xrp::XrpClaim;

use crate::timestamp::{ClaimTimestamp, ClaimTimestampError};
use serde::Serialize;
use serde_json::Value;

/// A validated claim, tagged by the chain it settles on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "blockchain", rename_all = "lowercase")]
pub enum ClaimMessage {
    Xrp(XrpClaim),
    Evm(EvmClaim),
    Aptos(AptosClaim),
}

impl ClaimMessage {
    pub fn is_xrp(&self) -> bool {
        matches!(self, ClaimMessage::Xrp(_))
    }

    pub fn is_evm(&self) -> bool {
        matches!(self, ClaimMessage::Evm(_))
    }

    pub fn is_aptos(&self) -> bool {
        matches!(self, ClaimMessage::Aptos(_))
    }

    pub fn as_xrp(&self) -> Option<&XrpClaim> {
        match self {
            ClaimMessage::Xrp(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_evm(&self) -> Option<&EvmClaim> {
        match self {
            ClaimMessage::Evm(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_aptos(&self) -> Option<&AptosClaim> {
        match self {
            ClaimMessage::Aptos(c) => Some(c),
            _ => None,
        }
    }

    pub fn message_id(&self) -> &str {
        match self {
            ClaimMessage::Xrp(c) => &c.message_id,
            ClaimMessage::Evm(c) => &c.message_id,
            ClaimMessage::Aptos(c) => &c.message_id,
        }
    }

    /// Re-serializes this claim to its canonical JSON wire form.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ClaimMessage serializes infallibly")
    }
}

/// Reasons a claim JSON payload fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidClaim {
    #[error("claim payload must be a JSON object")]
    NotAnObject,
    #[error("missing required field {0:?}")]
    MissingField(String),
    #[error("field {0:?} has the wrong JSON type")]
    WrongType(String),
    #[error("Unsupported claim version: {0}")]
    UnsupportedVersion(String),
    #[error("unsupported blockchain {0:?}")]
    UnknownBlockchain(String),
    #[error("messageId must not be empty")]
    EmptyMessageId,
    #[error("senderId must not be empty")]
    EmptySenderId,
    #[error("timestamp {0:?} is not a strict ISO-8601 instant: {1}")]
    InvalidTimestamp(String, String),
    #[error("field {field:?} has invalid shape: {reason}")]
    InvalidField { field: String, reason: String },
}

impl From<ClaimTimestampError> for String {
    fn from(e: ClaimTimestampError) -> Self {
        e.to_string()
    }
}

pub(crate) fn get_field<'a>(obj: &'a Value, field: &str) -> Result<&'a Value, InvalidClaim> {
    obj.get(field)
        .ok_or_else(|| InvalidClaim::MissingField(field.to_string()))
}

pub(crate) fn get_str<'a>(obj: &'a Value, field: &str) -> Result<&'a str, InvalidClaim> {
    get_field(obj, field)?
        .as_str()
        .ok_or_else(|| InvalidClaim::WrongType(field.to_string()))
}

pub(crate) fn get_non_negative_i64(obj: &Value, field: &str) -> Result<u64, InvalidClaim> {
    let value = get_field(obj, field)?;
    let n = value
        .as_u64()
        .ok_or_else(|| InvalidClaim::WrongType(field.to_string()))?;
    Ok(n)
}

pub(crate) fn invalid_field(field: &str, reason: impl Into<String>) -> InvalidClaim {
    InvalidClaim::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Validates untrusted JSON text into a [`ClaimMessage`].
///
/// Follows the seven-step checklist: object shape, version, blockchain tag,
/// non-empty messageId, strict-ISO-8601 timestamp, non-empty senderId, and
/// finally per-chain field-shape validation.
pub fn validate(json: &str) -> Result<ClaimMessage, InvalidClaim> {
    let value: Value =
        serde_json::from_str(json).map_err(|_| InvalidClaim::NotAnObject)?;
    validate_value(&value)
}

/// Validates an already-parsed JSON value, for callers that parse once and
/// want to inspect the raw value for other purposes too.
pub fn validate_value(value: &Value) -> Result<ClaimMessage, InvalidClaim> {
    let obj = value.as_object().ok_or(InvalidClaim::NotAnObject)?;
    let obj = Value::Object(obj.clone());

    let version = get_str(&obj, "version")?;
    if version != "1.0" {
        return Err(InvalidClaim::UnsupportedVersion(version.to_string()));
    }

    let blockchain = get_str(&obj, "blockchain")?;

    let message_id = get_str(&obj, "messageId")?;
    if message_id.trim().is_empty() {
        return Err(InvalidClaim::EmptyMessageId);
    }

    let timestamp_raw = get_str(&obj, "timestamp")?;
    let timestamp = ClaimTimestamp::parse(timestamp_raw)
        .map_err(|e| InvalidClaim::InvalidTimestamp(timestamp_raw.to_string(), e.to_string()))?;

    let sender_id = get_str(&obj, "senderId")?;
    if sender_id.trim().is_empty() {
        return Err(InvalidClaim::EmptySenderId);
    }

    match blockchain {
        "xrp" => Ok(ClaimMessage::Xrp(xrp::validate(
            &obj,
            message_id,
            timestamp,
            sender_id,
        )?)),
        "evm" => Ok(ClaimMessage::Evm(evm::validate(
            &obj,
            message_id,
            timestamp,
            sender_id,
        )?)),
        "aptos" => Ok(ClaimMessage::Aptos(aptos::validate(
            &obj,
            message_id,
            timestamp,
            sender_id,
        )?)),
        other => Err(InvalidClaim::UnknownBlockchain(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xrp_json() -> String {
        format!(
            r#"{{"version":"1.0","blockchain":"xrp","messageId":"m1","timestamp":"2026-02-02T12:00:00.000Z","senderId":"alice","channelId":"{}","amount":"1000000","signature":"{}","publicKey":"ED{}"}}"#,
            "A".repeat(64),
            "0".repeat(128),
            "0".repeat(64),
        )
    }

    #[test]
    fn test_scenario_4_xrp_claim_validates() {
        let claim = validate(&xrp_json()).unwrap();
        assert!(claim.is_xrp());
        assert_eq!(claim.message_id(), "m1");
    }

    #[test]
    fn test_scenario_5_unsupported_version() {
        let json = xrp_json().replace("\"1.0\"", "\"2.0\"");
        let err = validate(&json).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported claim version: 2.0");
    }

    #[test]
    fn test_rejects_non_object() {
        let err = validate("[1,2,3]").unwrap_err();
        assert_eq!(err, InvalidClaim::NotAnObject);
    }

    #[test]
    fn test_rejects_unknown_blockchain() {
        let json = xrp_json().replace("\"xrp\"", "\"dogecoin\"");
        let err = validate(&json).unwrap_err();
        assert_eq!(err, InvalidClaim::UnknownBlockchain("dogecoin".to_string()));
    }

    #[test]
    fn test_rejects_empty_message_id() {
        let json = xrp_json().replace("\"m1\"", "\"  \"");
        let err = validate(&json).unwrap_err();
        assert_eq!(err, InvalidClaim::EmptyMessageId);
    }

    #[test]
    fn test_round_trip_via_json() {
        let claim = validate(&xrp_json()).unwrap();
        let json = claim.to_json();
        let round_tripped = validate(&json).unwrap();
        assert_eq!(claim, round_tripped);
    }
}
