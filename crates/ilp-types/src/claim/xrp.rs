use super::{get_str, invalid_field, InvalidClaim};
use crate::timestamp::ClaimTimestamp;
use crate::util::DecimalAmount;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static CHANNEL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[0-9A-F]{64}$").unwrap());
static SIGNATURE_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[0-9A-F]{128}$").unwrap());
static PUBLIC_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^ED[0-9A-F]{64}$").unwrap());

/// An XRP Ledger payment-channel claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XrpClaim {
    pub version: String,
    pub message_id: String,
    pub timestamp: ClaimTimestamp,
    pub sender_id: String,
    pub channel_id: String,
    pub amount: DecimalAmount,
    pub signature: String,
    pub public_key: String,
}

pub(super) fn validate(
    obj: &Value,
    message_id: &str,
    timestamp: ClaimTimestamp,
    sender_id: &str,
) -> Result<XrpClaim, InvalidClaim> {
    let channel_id = get_str(obj, "channelId")?;
    if !CHANNEL_ID_RE.is_match(channel_id) {
        return Err(invalid_field("channelId", "must be 64 uppercase hex characters"));
    }

    let amount_raw = get_str(obj, "amount")?;
    let amount = DecimalAmount::parse_positive(amount_raw)
        .map_err(|e| invalid_field("amount", e.to_string()))?;

    let signature = get_str(obj, "signature")?;
    if !SIGNATURE_RE.is_match(signature) {
        return Err(invalid_field("signature", "must be 128 uppercase hex characters"));
    }

    let public_key = get_str(obj, "publicKey")?;
    if !PUBLIC_KEY_RE.is_match(public_key) {
        return Err(invalid_field(
            "publicKey",
            "must be \"ED\" followed by 64 uppercase hex characters",
        ));
    }

    Ok(XrpClaim {
        version: "1.0".to_string(),
        message_id: message_id.to_string(),
        timestamp,
        sender_id: sender_id.to_string(),
        channel_id: channel_id.to_string(),
        amount,
        signature: signature.to_string(),
        public_key: public_key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::validate as validate_claim;

    fn json() -> String {
        format!(
            r#"{{"version":"1.0","blockchain":"xrp","messageId":"m1","timestamp":"2026-02-02T12:00:00.000Z","senderId":"alice","channelId":"{}","amount":"1000000","signature":"{}","publicKey":"ED{}"}}"#,
            "A".repeat(64),
            "0".repeat(128),
            "0".repeat(64),
        )
    }

    #[test]
    fn test_valid_xrp_claim() {
        let claim = validate_claim(&json()).unwrap();
        assert!(claim.is_xrp());
    }

    #[test]
    fn test_rejects_lowercase_channel_id() {
        let bad = json().replace(&"A".repeat(64), &"a".repeat(64));
        assert!(validate_claim(&bad).is_err());
    }

    #[test]
    fn test_rejects_zero_amount() {
        let bad = json().replace("\"1000000\"", "\"0\"");
        assert!(validate_claim(&bad).is_err());
    }

    #[test]
    fn test_rejects_short_signature() {
        let bad = json().replace(&"0".repeat(128), &"0".repeat(127));
        assert!(validate_claim(&bad).is_err());
    }
}
