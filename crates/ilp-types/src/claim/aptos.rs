use super::{get_non_negative_i64, get_str, invalid_field, InvalidClaim};
use crate::timestamp::ClaimTimestamp;
use crate::util::DecimalAmount;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static HEX_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^0x[0-9a-fA-F]+$").unwrap());
static HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[0-9a-fA-F]+$").unwrap());

/// An Aptos Move payment-channel claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AptosClaim {
    pub version: String,
    pub message_id: String,
    pub timestamp: ClaimTimestamp,
    pub sender_id: String,
    pub channel_owner: String,
    pub amount: DecimalAmount,
    pub nonce: u64,
    pub signature: String,
    pub public_key: String,
}

pub(super) fn validate(
    obj: &Value,
    message_id: &str,
    timestamp: ClaimTimestamp,
    sender_id: &str,
) -> Result<AptosClaim, InvalidClaim> {
    let channel_owner = get_str(obj, "channelOwner")?;
    if !HEX_ADDRESS_RE.is_match(channel_owner) {
        return Err(invalid_field("channelOwner", "must be 0x followed by hex digits"));
    }

    let amount_raw = get_str(obj, "amount")?;
    let amount = DecimalAmount::parse_positive(amount_raw)
        .map_err(|e| invalid_field("amount", e.to_string()))?;

    let nonce = get_non_negative_i64(obj, "nonce")?;

    let signature = get_str(obj, "signature")?;
    if !HEX_RE.is_match(signature) {
        return Err(invalid_field("signature", "must be hex digits"));
    }

    let public_key = get_str(obj, "publicKey")?;
    if !HEX_RE.is_match(public_key) {
        return Err(invalid_field("publicKey", "must be hex digits"));
    }

    Ok(AptosClaim {
        version: "1.0".to_string(),
        message_id: message_id.to_string(),
        timestamp,
        sender_id: sender_id.to_string(),
        channel_owner: channel_owner.to_string(),
        amount,
        nonce,
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
            r#"{{"version":"1.0","blockchain":"aptos","messageId":"m1","timestamp":"2026-02-02T12:00:00.000Z","senderId":"alice","channelOwner":"0x{}","amount":"500","nonce":7,"signature":"{}","publicKey":"{}"}}"#,
            "ab".repeat(16),
            "cd".repeat(32),
            "ef".repeat(16),
        )
    }

    #[test]
    fn test_valid_aptos_claim() {
        let claim = validate_claim(&json()).unwrap();
        assert!(claim.is_aptos());
        assert_eq!(claim.as_aptos().unwrap().nonce, 7);
    }

    #[test]
    fn test_rejects_zero_amount() {
        let bad = json().replace("\"500\"", "\"0\"");
        assert!(validate_claim(&bad).is_err());
    }

    #[test]
    fn test_rejects_non_hex_signature() {
        let bad = json().replace(&"cd".repeat(32), "not-hex-at-all-zzzzzzzzzzzzzzzzzzzzzzzzzzzzzz");
        assert!(validate_claim(&bad).is_err());
    }
}
