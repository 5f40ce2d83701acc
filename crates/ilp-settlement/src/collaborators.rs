//! Collaborator contracts the settlement layer consumes.
//!
//! None of these traits are implemented in this crate: concrete chain RPC
//! clients, BTP peer sessions, persistence, and telemetry backends are host
//! application concerns injected at construction (see `connector/` for a
//! minimal in-memory demo wiring).

use crate::error::{ChainError, PersistError, TelemetryError, TransportError};
use async_trait::async_trait;
use ilp_types::util::DecimalAmount;
use tokio::sync::mpsc;

/// A connected BTP peer session, as seen by the claim sender.
#[async_trait]
pub trait PeerHandle: Send + Sync {
    async fn send_protocol_data(
        &self,
        protocol_name: &str,
        content_type: u16,
        data: Vec<u8>,
    ) -> Result<(), TransportError>;
}

/// A record of a claim that was handed to a peer handle, for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentClaimRecord {
    pub message_id: String,
    pub peer_id: String,
    pub blockchain: String,
    pub payload_json: String,
    pub created_at_ms: u128,
}

/// A settled claim, for persistence via the accounts collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRecord {
    pub peer_id: String,
    pub blockchain: String,
    pub channel_id: String,
    pub amount: String,
}

/// Minimal key-value-ish store for sent claims and settlements.
#[async_trait]
pub trait Persist: Send + Sync {
    /// Inserts a sent-claim row. `messageId` is a unique key; a conflicting
    /// insert is reported as [`PersistError::Conflict`], not a hard failure.
    async fn insert_sent_claim(&self, record: SentClaimRecord) -> Result<(), PersistError>;

    /// Records a completed settlement for the accounts subsystem.
    async fn record_settlement(&self, record: SettlementRecord) -> Result<(), PersistError>;
}

/// A single structured telemetry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    ClaimSent {
        node_id: String,
        peer_id: String,
        blockchain: String,
        message_id: String,
        amount: String,
        success: bool,
        error: Option<String>,
    },
}

/// Structured event sink. Emission failures are reported to the caller, which
/// logs and swallows them (see `spec.md` §7).
#[async_trait]
pub trait Telemetry: Send + Sync {
    async fn emit(&self, event: TelemetryEvent) -> Result<(), TelemetryError>;
}

/// A peer crossed its settlement threshold for a given token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRequiredEvent {
    pub peer_id: String,
    pub balance: String,
    pub token_id: String,
    pub timestamp_ms: u128,
}

/// Source of `SETTLEMENT_REQUIRED` events, delivered at least once. Modeled
/// as a channel rather than a callback so the executor can consume it as a
/// long-running task instead of invoking a handler inline.
pub trait SettlementMonitor: Send + Sync {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SettlementRequiredEvent>;
}

/// EVM-family chain SDK: opens payment channels.
#[async_trait]
pub trait EvmSettlementSdk: Send + Sync {
    async fn open_channel(&self, peer_id: &str, amount: &DecimalAmount) -> Result<String, ChainError>;
}

/// XRP Ledger channel lifecycle management.
#[async_trait]
pub trait XrpChannelManager: Send + Sync {
    async fn create_channel(&self, peer_id: &str, amount: &DecimalAmount) -> Result<String, ChainError>;
}

/// XRP Ledger claim signing.
#[async_trait]
pub trait XrpClaimSigner: Send + Sync {
    async fn sign_claim(&self, channel_id: &str, amount: &DecimalAmount) -> Result<String, ChainError>;

    /// The signer's Ed25519 public key, as `"ED" + 64 hex chars`.
    fn public_key(&self) -> String;
}

/// EVM-family claim signing. Not named explicitly in the published
/// collaborator contract list, but required for symmetry with
/// [`XrpClaimSigner`]: the executor cannot produce a valid EVM claim
/// signature without a signer any more than it can for XRP.
#[async_trait]
pub trait EvmClaimSigner: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn sign_claim(
        &self,
        channel_id: &str,
        transferred_amount: &DecimalAmount,
        locked_amount: &DecimalAmount,
        locks_root: &str,
        nonce: u64,
    ) -> Result<String, ChainError>;

    /// The signer's address, as `0x` + 40 hex chars.
    fn signer_address(&self) -> String;
}

/// Resolves a connected peer handle by peer id, for the settlement executor.
pub trait PeerDirectory: Send + Sync {
    fn peer_handle(&self, peer_id: &str) -> Option<std::sync::Arc<dyn PeerHandle>>;
}

/// A claim produced by the Aptos SDK's own signing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptosSignedClaim {
    pub channel_owner: String,
    pub amount: String,
    pub nonce: u64,
    pub signature: String,
    pub public_key: String,
}

/// Aptos Move chain SDK.
#[async_trait]
pub trait AptosSettlementSdk: Send + Sync {
    async fn open_channel(&self, peer_id: &str, amount: &DecimalAmount) -> Result<String, ChainError>;
    async fn sign_claim(
        &self,
        channel_owner: &str,
        amount: &DecimalAmount,
        nonce: u64,
    ) -> Result<AptosSignedClaim, ChainError>;
    async fn get_my_channels(&self) -> Result<Vec<String>, ChainError>;
}
