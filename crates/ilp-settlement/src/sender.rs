//! Idempotent, retried claim dispatch over a BTP peer.
//!
//! [`ClaimSender`] builds the canonical claim object for a chain, wraps it as
//! BTP protocol-data, sends it via a [`PeerHandle`], retries transport
//! failures with an exponential backoff [`RetryPolicy`], and persists +
//! telemeters the outcome regardless of whether the send itself succeeded.

use crate::collaborators::{Persist, PeerHandle, SentClaimRecord, Telemetry, TelemetryEvent};
use crate::error::PersistError;
use crate::retry::RetryPolicy;
use ilp_types::claim::{AptosClaim, EvmClaim, XrpClaim};
use ilp_types::timestamp::ClaimTimestamp;
use ilp_types::util::DecimalAmount;
use ilp_types::ClaimMessage;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, warn};

const PROTOCOL_NAME: &str = "payment-channel-claim";
const CLAIM_CONTENT_TYPE: u16 = 1;

/// Result of a single [`ClaimSender`] send attempt sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub success: bool,
    pub message_id: String,
    pub timestamp: String,
    pub error: Option<String>,
}

/// Delivers payment-channel claims to BTP peers with at-least-once semantics.
pub struct ClaimSender {
    node_id: String,
    retry_policy: RetryPolicy,
    persist: Arc<dyn Persist>,
    telemetry: Arc<dyn Telemetry>,
}

impl ClaimSender {
    pub fn new(
        node_id: impl Into<String>,
        persist: Arc<dyn Persist>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        ClaimSender {
            node_id: node_id.into(),
            retry_policy: RetryPolicy::default(),
            persist,
            telemetry,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub async fn send_xrp_claim(
        &self,
        peer_id: &str,
        peer: &dyn PeerHandle,
        sender_id: &str,
        channel_id: &str,
        amount: &str,
        signature: &str,
        public_key: &str,
    ) -> SendOutcome {
        let amount = match DecimalAmount::parse_positive(amount) {
            Ok(a) => a,
            Err(e) => return invalid_outcome(e.to_string()),
        };
        let amount_for_telemetry = amount.as_str().to_string();
        let sender_id = sender_id.to_string();
        let channel_id_owned = channel_id.to_string();
        let signature = signature.to_string();
        let public_key = public_key.to_string();
        self.dispatch(
            "xrp",
            peer_id,
            peer,
            channel_id,
            "n/a",
            &amount_for_telemetry,
            move |message_id, timestamp| {
                ClaimMessage::Xrp(XrpClaim {
                    version: "1.0".to_string(),
                    message_id,
                    timestamp,
                    sender_id,
                    channel_id: channel_id_owned,
                    amount,
                    signature,
                    public_key,
                })
            },
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn send_evm_claim(
        &self,
        peer_id: &str,
        peer: &dyn PeerHandle,
        sender_id: &str,
        channel_id: &str,
        nonce: u64,
        transferred_amount: &str,
        locked_amount: &str,
        locks_root: &str,
        signature: &str,
        signer_address: &str,
    ) -> SendOutcome {
        let transferred_amount = match DecimalAmount::parse_non_negative(transferred_amount) {
            Ok(a) => a,
            Err(e) => return invalid_outcome(e.to_string()),
        };
        let locked_amount = match DecimalAmount::parse_non_negative(locked_amount) {
            Ok(a) => a,
            Err(e) => return invalid_outcome(e.to_string()),
        };
        let amount_for_telemetry = transferred_amount.as_str().to_string();
        let sender_id = sender_id.to_string();
        let channel_id_owned = channel_id.to_string();
        let locks_root = locks_root.to_string();
        let signature = signature.to_string();
        let signer_address = signer_address.to_string();
        let nonce_or_slash = nonce.to_string();
        self.dispatch(
            "evm",
            peer_id,
            peer,
            channel_id,
            &nonce_or_slash,
            &amount_for_telemetry,
            move |message_id, timestamp| {
                ClaimMessage::Evm(EvmClaim {
                    version: "1.0".to_string(),
                    message_id,
                    timestamp,
                    sender_id,
                    channel_id: channel_id_owned,
                    nonce,
                    transferred_amount,
                    locked_amount,
                    locks_root,
                    signature,
                    signer_address,
                })
            },
        )
        .await
    }

    pub async fn send_aptos_claim(
        &self,
        peer_id: &str,
        peer: &dyn PeerHandle,
        sender_id: &str,
        channel_owner: &str,
        amount: &str,
        nonce: u64,
        signature: &str,
        public_key: &str,
    ) -> SendOutcome {
        let amount = match DecimalAmount::parse_positive(amount) {
            Ok(a) => a,
            Err(e) => return invalid_outcome(e.to_string()),
        };
        let amount_for_telemetry = amount.as_str().to_string();
        let sender_id = sender_id.to_string();
        let channel_owner_owned = channel_owner.to_string();
        let signature = signature.to_string();
        let public_key = public_key.to_string();
        let nonce_or_slash = nonce.to_string();
        self.dispatch(
            "aptos",
            peer_id,
            peer,
            channel_owner,
            &nonce_or_slash,
            &amount_for_telemetry,
            move |message_id, timestamp| {
                ClaimMessage::Aptos(AptosClaim {
                    version: "1.0".to_string(),
                    message_id,
                    timestamp,
                    sender_id,
                    channel_owner: channel_owner_owned,
                    amount,
                    nonce,
                    signature,
                    public_key,
                })
            },
        )
        .await
    }

    async fn dispatch(
        &self,
        chain: &str,
        peer_id: &str,
        peer: &dyn PeerHandle,
        channel_identifier: &str,
        nonce_or_slash: &str,
        amount_for_telemetry: &str,
        build: impl FnOnce(String, ClaimTimestamp) -> ClaimMessage,
    ) -> SendOutcome {
        let created_at_ms = now_millis();
        let message_id = build_message_id(chain, channel_identifier, nonce_or_slash, created_at_ms);
        let timestamp = ClaimTimestamp::now();
        let claim = build(message_id.clone(), timestamp);
        let payload_json = claim.to_json();

        let mut last_error = None;
        let mut success = false;
        for attempt in 0..self.retry_policy.max_attempts {
            match peer
                .send_protocol_data(PROTOCOL_NAME, CLAIM_CONTENT_TYPE, payload_json.clone().into_bytes())
                .await
            {
                Ok(()) => {
                    success = true;
                    last_error = None;
                    break;
                }
                Err(e) => {
                    last_error = Some(e.to_string());
                    if attempt + 1 < self.retry_policy.max_attempts {
                        tokio::time::sleep(self.retry_policy.delay_before_attempt(attempt)).await;
                    }
                }
            }
        }

        let record = SentClaimRecord {
            message_id: message_id.clone(),
            peer_id: peer_id.to_string(),
            blockchain: chain.to_string(),
            payload_json,
            created_at_ms,
        };
        match self.persist.insert_sent_claim(record).await {
            Ok(()) => {}
            Err(PersistError::Conflict(id)) => {
                warn!(message_id = %id, "duplicate sent-claim persistence, treating as idempotent");
            }
            Err(PersistError::Other(msg)) => {
                error!(error = %msg, "failed to persist sent claim");
            }
        }

        let event = TelemetryEvent::ClaimSent {
            node_id: self.node_id.clone(),
            peer_id: peer_id.to_string(),
            blockchain: chain.to_string(),
            message_id: message_id.clone(),
            amount: amount_for_telemetry.to_string(),
            success,
            error: last_error.clone(),
        };
        if let Err(e) = self.telemetry.emit(event).await {
            warn!(error = %e.to_string(), "failed to emit telemetry event");
        }

        SendOutcome {
            success,
            message_id,
            timestamp: timestamp.to_wire_string(),
            error: last_error,
        }
    }
}

fn invalid_outcome(reason: String) -> SendOutcome {
    SendOutcome {
        success: false,
        message_id: String::new(),
        timestamp: String::new(),
        error: Some(reason),
    }
}

fn build_message_id(chain: &str, channel_identifier: &str, nonce_or_slash: &str, millis: u128) -> String {
    let prefix: String = channel_identifier.chars().take(8).collect();
    format!("{chain}-{prefix}-{nonce_or_slash}-{millis}")
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the Unix epoch")
        .as_millis()
}
