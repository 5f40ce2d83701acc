//! In-memory/console implementations of every collaborator contract, so the
//! binary can exercise the settlement core end to end without a real BTP
//! transport, database, or chain RPC client.

use async_trait::async_trait;
use dashmap::DashMap;
use ilp_settlement::collaborators::{
    AptosSettlementSdk, AptosSignedClaim, EvmClaimSigner, EvmSettlementSdk, PeerDirectory,
    PeerHandle, Persist, SentClaimRecord, SettlementMonitor, SettlementRecord,
    SettlementRequiredEvent, Telemetry, TelemetryEvent, XrpChannelManager, XrpClaimSigner,
};
use ilp_settlement::error::{ChainError, PersistError, TelemetryError, TransportError};
use ilp_types::util::DecimalAmount;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// A peer handle that logs what it was asked to send and always succeeds.
pub struct LoggingPeerHandle;

#[async_trait]
impl PeerHandle for LoggingPeerHandle {
    async fn send_protocol_data(
        &self,
        protocol_name: &str,
        content_type: u16,
        data: Vec<u8>,
    ) -> Result<(), TransportError> {
        info!(
            protocol_name,
            content_type,
            bytes = data.len(),
            "sending BTP protocol data"
        );
        Ok(())
    }
}

/// Resolves every peer id to the same [`LoggingPeerHandle`].
pub struct SinglePeerDirectory(Arc<dyn PeerHandle>);

impl SinglePeerDirectory {
    pub fn new() -> Self {
        SinglePeerDirectory(Arc::new(LoggingPeerHandle))
    }
}

impl PeerDirectory for SinglePeerDirectory {
    fn peer_handle(&self, _peer_id: &str) -> Option<Arc<dyn PeerHandle>> {
        Some(Arc::clone(&self.0))
    }
}

/// An in-process sent-claim and settlement store.
#[derive(Default)]
pub struct InMemoryPersist {
    sent_claims: DashMap<String, SentClaimRecord>,
    settlements: Mutex<Vec<SettlementRecord>>,
}

#[async_trait]
impl Persist for InMemoryPersist {
    async fn insert_sent_claim(&self, record: SentClaimRecord) -> Result<(), PersistError> {
        if self.sent_claims.contains_key(&record.message_id) {
            return Err(PersistError::Conflict(record.message_id));
        }
        self.sent_claims.insert(record.message_id.clone(), record);
        Ok(())
    }

    async fn record_settlement(&self, record: SettlementRecord) -> Result<(), PersistError> {
        self.settlements.lock().unwrap().push(record);
        Ok(())
    }
}

/// Emits telemetry events as structured log lines.
pub struct TracingTelemetry;

#[async_trait]
impl Telemetry for TracingTelemetry {
    async fn emit(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        match event {
            TelemetryEvent::ClaimSent {
                node_id,
                peer_id,
                blockchain,
                message_id,
                amount,
                success,
                error,
            } => {
                if success {
                    info!(node_id, peer_id, blockchain, message_id, amount, "CLAIM_SENT");
                } else {
                    warn!(
                        node_id,
                        peer_id,
                        blockchain,
                        message_id,
                        amount,
                        error,
                        "CLAIM_SENT"
                    );
                }
            }
        }
        Ok(())
    }
}

/// A `SettlementMonitor` whose events are injected by the demo's producer
/// side rather than a real accounts subsystem.
pub struct DemoSettlementMonitor {
    receiver: Mutex<Option<mpsc::UnboundedReceiver<SettlementRequiredEvent>>>,
}

impl DemoSettlementMonitor {
    pub fn new() -> (Self, mpsc::UnboundedSender<SettlementRequiredEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            DemoSettlementMonitor {
                receiver: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl SettlementMonitor for DemoSettlementMonitor {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SettlementRequiredEvent> {
        self.receiver
            .lock()
            .unwrap()
            .take()
            .expect("DemoSettlementMonitor only supports a single subscriber")
    }
}

/// A mock EVM chain SDK returning deterministic fake channel ids.
pub struct MockEvmSdk;

#[async_trait]
impl EvmSettlementSdk for MockEvmSdk {
    async fn open_channel(&self, peer_id: &str, amount: &DecimalAmount) -> Result<String, ChainError> {
        info!(peer_id, amount = amount.as_str(), "opening demo EVM channel");
        Ok(format!("0x{}", "11".repeat(32)))
    }
}

pub struct MockEvmSigner;

#[async_trait]
impl EvmClaimSigner for MockEvmSigner {
    async fn sign_claim(
        &self,
        _channel_id: &str,
        _transferred_amount: &DecimalAmount,
        _locked_amount: &DecimalAmount,
        _locks_root: &str,
        _nonce: u64,
    ) -> Result<String, ChainError> {
        Ok(format!("0x{}", "22".repeat(65)))
    }

    fn signer_address(&self) -> String {
        format!("0x{}", "33".repeat(20))
    }
}

pub struct MockXrpChannelManager;

#[async_trait]
impl XrpChannelManager for MockXrpChannelManager {
    async fn create_channel(&self, peer_id: &str, amount: &DecimalAmount) -> Result<String, ChainError> {
        info!(peer_id, amount = amount.as_str(), "opening demo XRP channel");
        Ok("A".repeat(64))
    }
}

pub struct MockXrpSigner;

#[async_trait]
impl XrpClaimSigner for MockXrpSigner {
    async fn sign_claim(&self, _channel_id: &str, _amount: &DecimalAmount) -> Result<String, ChainError> {
        Ok("0".repeat(128))
    }

    fn public_key(&self) -> String {
        format!("ED{}", "0".repeat(64))
    }
}

pub struct MockAptosSdk;

#[async_trait]
impl AptosSettlementSdk for MockAptosSdk {
    async fn open_channel(&self, peer_id: &str, amount: &DecimalAmount) -> Result<String, ChainError> {
        info!(peer_id, amount = amount.as_str(), "opening demo Aptos channel");
        Ok(format!("0x{}", "44".repeat(16)))
    }

    async fn sign_claim(
        &self,
        channel_owner: &str,
        amount: &DecimalAmount,
        nonce: u64,
    ) -> Result<AptosSignedClaim, ChainError> {
        Ok(AptosSignedClaim {
            channel_owner: channel_owner.to_string(),
            amount: amount.as_str().to_string(),
            nonce,
            signature: "55".repeat(32),
            public_key: "66".repeat(16),
        })
    }

    async fn get_my_channels(&self) -> Result<Vec<String>, ChainError> {
        Ok(Vec::new())
    }
}
