//! The unified settlement executor: an event-driven router from balance
//! threshold events to chain-specific channel open + claim sign + send.
//!
//! State machine per `(peer, chain)`: `None -> ChannelOpening -> Active ->
//! Settled`. Transitions are driven entirely by [`SettlementRequiredEvent`]s
//! and every action is idempotent: re-running a handler for a peer/chain
//! that already has a cached channel simply reuses it.

use crate::collaborators::{
    AptosSettlementSdk, EvmClaimSigner, EvmSettlementSdk, PeerDirectory, Persist,
    SettlementMonitor, SettlementRecord, SettlementRequiredEvent, Telemetry, XrpChannelManager,
    XrpClaimSigner,
};
use crate::error::ConfigError;
use crate::peer_config::{Chain, PeerSettlementConfig};
use crate::sender::ClaimSender;
use dashmap::DashMap;
use ilp_types::util::DecimalAmount;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Observability state for a `(peer, chain)` pair. Advisory: the executor's
/// actual behavior is driven by the cached channel identifier, not by this
/// enum, but it is kept so callers can inspect where a peer/chain stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    None,
    ChannelOpening,
    Active,
    Settled,
}

/// Chain-specific collaborators the executor dispatches to. Any chain whose
/// SDK is `None` is treated as unavailable for routing purposes.
#[derive(Default)]
pub struct ChainSdks {
    pub evm: Option<Arc<dyn EvmSettlementSdk>>,
    pub evm_signer: Option<Arc<dyn EvmClaimSigner>>,
    pub xrp_channels: Option<Arc<dyn XrpChannelManager>>,
    pub xrp_signer: Option<Arc<dyn XrpClaimSigner>>,
    pub aptos: Option<Arc<dyn AptosSettlementSdk>>,
}

/// Routes `SETTLEMENT_REQUIRED` events to the correct chain SDK, persists
/// settlements, and hands signed claims to the [`ClaimSender`].
pub struct SettlementExecutor {
    node_id: String,
    peers: Arc<DashMap<String, Arc<PeerSettlementConfig>>>,
    peer_locks: Arc<DashMap<String, Arc<AsyncMutex<()>>>>,
    states: Arc<DashMap<(String, &'static str), ChannelState>>,
    sdks: Arc<ChainSdks>,
    sender: Arc<ClaimSender>,
    persist: Arc<dyn Persist>,
    telemetry: Arc<dyn Telemetry>,
    peer_directory: Arc<dyn PeerDirectory>,
    cancellation: CancellationToken,
    tasks: TaskTracker,
}

impl SettlementExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        node_id: impl Into<String>,
        sdks: ChainSdks,
        persist: Arc<dyn Persist>,
        telemetry: Arc<dyn Telemetry>,
        peer_directory: Arc<dyn PeerDirectory>,
        sender: Arc<ClaimSender>,
    ) -> Self {
        SettlementExecutor {
            node_id: node_id.into(),
            peers: Arc::new(DashMap::new()),
            peer_locks: Arc::new(DashMap::new()),
            states: Arc::new(DashMap::new()),
            sdks: Arc::new(sdks),
            sender,
            persist,
            telemetry,
            peer_directory,
            cancellation: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn register_peer(&self, config: PeerSettlementConfig) {
        self.peers.insert(config.peer_id.clone(), Arc::new(config));
    }

    pub fn channel_state(&self, peer_id: &str, chain: Chain) -> ChannelState {
        self.states
            .get(&(peer_id.to_string(), chain.as_str()))
            .map(|s| *s)
            .unwrap_or(ChannelState::None)
    }

    /// Subscribes to `monitor` and spawns a long-running task that handles
    /// every event it delivers until [`Self::stop`] is called.
    pub fn start(self: &Arc<Self>, monitor: &dyn SettlementMonitor) {
        let mut events = monitor.subscribe();
        let executor = Arc::clone(self);
        let cancellation = self.cancellation.clone();
        self.tasks.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancellation.cancelled() => break,
                    event = events.recv() => {
                        match event {
                            Some(event) => {
                                let executor = Arc::clone(&executor);
                                let cancellation = cancellation.clone();
                                executor.tasks.spawn(async move {
                                    tokio::select! {
                                        _ = cancellation.cancelled() => {}
                                        result = executor.handle_settlement_required(event) => {
                                            if let Err(e) = result {
                                                warn!(error = %e, "settlement handler failed");
                                            }
                                        }
                                    }
                                });
                            }
                            None => break,
                        }
                    }
                }
            }
        });
    }

    /// Stops accepting new events and waits for in-flight handlers to finish
    /// their current action; no retries are scheduled once cancellation fires.
    pub async fn stop(&self) {
        self.cancellation.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }

    /// Handles a single `SETTLEMENT_REQUIRED` event end to end: chain
    /// selection, lazy channel open, claim signing, send, and settlement
    /// recording. Concurrent events for the same peer are serialized; events
    /// for distinct peers may run in parallel.
    pub async fn handle_settlement_required(
        &self,
        event: SettlementRequiredEvent,
    ) -> Result<(), ConfigError> {
        let Some(peer) = self.peers.get(&event.peer_id).map(|p| Arc::clone(&p)) else {
            warn!(peer_id = %event.peer_id, "settlement event for unknown peer, dropping");
            return Ok(());
        };

        let lock_entry = self
            .peer_locks
            .entry(event.peer_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())));
        let lock = Arc::clone(&lock_entry);
        let _guard = lock.lock().await;

        let chain = Chain::for_token(&event.token_id);
        if !peer.settlement_tokens.contains(&event.token_id) || !self.is_compatible(&peer, chain) {
            return Err(ConfigError("No compatible settlement method".to_string()));
        }

        let balance = DecimalAmount::parse_non_negative(&event.balance)
            .map_err(|e| ConfigError(format!("invalid balance {:?}: {e}", event.balance)))?;

        self.set_state(&event.peer_id, chain, ChannelState::ChannelOpening);
        let channel_id = self.ensure_channel(&peer, chain, &balance).await?;
        self.set_state(&event.peer_id, chain, ChannelState::Active);

        let peer_handle = self
            .peer_directory
            .peer_handle(&event.peer_id)
            .ok_or_else(|| ConfigError(format!("no connected peer handle for {}", event.peer_id)))?;

        let outcome = self
            .sign_and_send(&peer, chain, &channel_id, &balance, peer_handle.as_ref())
            .await?;

        if !outcome.success {
            error!(
                peer_id = %event.peer_id,
                chain = chain.as_str(),
                error = ?outcome.error,
                "claim send did not succeed after retries"
            );
        }

        self.set_state(&event.peer_id, chain, ChannelState::Settled);
        match self
            .persist
            .record_settlement(SettlementRecord {
                peer_id: event.peer_id.clone(),
                blockchain: chain.as_str().to_string(),
                channel_id,
                amount: balance.as_str().to_string(),
            })
            .await
        {
            Ok(()) => {}
            Err(e) => warn!(error = %e, "failed to record settlement"),
        }

        info!(peer_id = %event.peer_id, chain = chain.as_str(), "settlement handled");
        Ok(())
    }

    fn is_compatible(&self, peer: &PeerSettlementConfig, chain: Chain) -> bool {
        if !peer.accepts(chain) {
            return false;
        }
        match chain {
            Chain::Evm => self.sdks.evm.is_some() && self.sdks.evm_signer.is_some() && peer.evm_address.is_some(),
            Chain::Xrp => {
                self.sdks.xrp_channels.is_some()
                    && self.sdks.xrp_signer.is_some()
                    && peer.xrp_address.is_some()
            }
            Chain::Aptos => self.sdks.aptos.is_some() && peer.aptos_address.is_some(),
        }
    }

    async fn ensure_channel(
        &self,
        peer: &PeerSettlementConfig,
        chain: Chain,
        deposit: &DecimalAmount,
    ) -> Result<String, ConfigError> {
        if let Some(existing) = peer.cached_channel(chain) {
            return Ok(existing);
        }
        let channel_id = match chain {
            Chain::Evm => self
                .sdks
                .evm
                .as_ref()
                .expect("checked by is_compatible")
                .open_channel(&peer.peer_id, deposit)
                .await
                .map_err(|e| ConfigError(e.to_string()))?,
            Chain::Xrp => self
                .sdks
                .xrp_channels
                .as_ref()
                .expect("checked by is_compatible")
                .create_channel(&peer.peer_id, deposit)
                .await
                .map_err(|e| ConfigError(e.to_string()))?,
            Chain::Aptos => self
                .sdks
                .aptos
                .as_ref()
                .expect("checked by is_compatible")
                .open_channel(&peer.peer_id, deposit)
                .await
                .map_err(|e| ConfigError(e.to_string()))?,
        };
        peer.cache_channel(chain, channel_id.clone());
        Ok(channel_id)
    }

    async fn sign_and_send(
        &self,
        peer: &PeerSettlementConfig,
        chain: Chain,
        channel_id: &str,
        amount: &DecimalAmount,
        peer_handle: &dyn crate::collaborators::PeerHandle,
    ) -> Result<crate::sender::SendOutcome, ConfigError> {
        match chain {
            Chain::Xrp => {
                let signer = self.sdks.xrp_signer.as_ref().expect("checked by is_compatible");
                let signature = signer
                    .sign_claim(channel_id, amount)
                    .await
                    .map_err(|e| ConfigError(e.to_string()))?;
                let public_key = signer.public_key();
                Ok(self
                    .sender
                    .send_xrp_claim(
                        &peer.peer_id,
                        peer_handle,
                        &self.node_id,
                        channel_id,
                        amount.as_str(),
                        &signature,
                        &public_key,
                    )
                    .await)
            }
            Chain::Evm => {
                let signer = self.sdks.evm_signer.as_ref().expect("checked by is_compatible");
                let locked_amount = DecimalAmount::parse_non_negative("0").unwrap();
                let locks_root = format!("0x{}", "0".repeat(64));
                let nonce = 1u64;
                let signature = signer
                    .sign_claim(channel_id, amount, &locked_amount, &locks_root, nonce)
                    .await
                    .map_err(|e| ConfigError(e.to_string()))?;
                let signer_address = signer.signer_address();
                Ok(self
                    .sender
                    .send_evm_claim(
                        &peer.peer_id,
                        peer_handle,
                        &self.node_id,
                        channel_id,
                        nonce,
                        amount.as_str(),
                        locked_amount.as_str(),
                        &locks_root,
                        &signature,
                        &signer_address,
                    )
                    .await)
            }
            Chain::Aptos => {
                let sdk = self.sdks.aptos.as_ref().expect("checked by is_compatible");
                let nonce = 1u64;
                let signed = sdk
                    .sign_claim(channel_id, amount, nonce)
                    .await
                    .map_err(|e| ConfigError(e.to_string()))?;
                Ok(self
                    .sender
                    .send_aptos_claim(
                        &peer.peer_id,
                        peer_handle,
                        &self.node_id,
                        &signed.channel_owner,
                        &signed.amount,
                        signed.nonce,
                        &signed.signature,
                        &signed.public_key,
                    )
                    .await)
            }
        }
    }

    fn set_state(&self, peer_id: &str, chain: Chain, state: ChannelState) {
        self.states.insert((peer_id.to_string(), chain.as_str()), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{
        AptosSignedClaim, PeerHandle, SentClaimRecord, Telemetry, TelemetryEvent,
    };
    use crate::error::{ChainError, PersistError, TelemetryError, TransportError};
    use crate::peer_config::SettlementPreference;
    use async_trait::async_trait;
    use ilp_types::Address;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullPersist;
    #[async_trait]
    impl Persist for NullPersist {
        async fn insert_sent_claim(&self, _: SentClaimRecord) -> Result<(), PersistError> {
            Ok(())
        }
        async fn record_settlement(&self, _: SettlementRecord) -> Result<(), PersistError> {
            Ok(())
        }
    }

    struct NullTelemetry;
    #[async_trait]
    impl Telemetry for NullTelemetry {
        async fn emit(&self, _: TelemetryEvent) -> Result<(), TelemetryError> {
            Ok(())
        }
    }

    struct NoPeers;
    impl PeerDirectory for NoPeers {
        fn peer_handle(&self, _: &str) -> Option<Arc<dyn PeerHandle>> {
            None
        }
    }

    struct AlwaysOkPeerHandle;
    #[async_trait]
    impl PeerHandle for AlwaysOkPeerHandle {
        async fn send_protocol_data(&self, _: &str, _: u16, _: Vec<u8>) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct OnePeer(Arc<dyn PeerHandle>);
    impl PeerDirectory for OnePeer {
        fn peer_handle(&self, _: &str) -> Option<Arc<dyn PeerHandle>> {
            Some(Arc::clone(&self.0))
        }
    }

    struct CountingEvmSdk {
        open_channel_calls: AtomicUsize,
    }
    #[async_trait]
    impl EvmSettlementSdk for CountingEvmSdk {
        async fn open_channel(&self, _: &str, _: &DecimalAmount) -> Result<String, ChainError> {
            self.open_channel_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("0x{}", "ab".repeat(32)))
        }
    }

    struct StubEvmSigner;
    #[async_trait]
    impl EvmClaimSigner for StubEvmSigner {
        async fn sign_claim(
            &self,
            _: &str,
            _: &DecimalAmount,
            _: &DecimalAmount,
            _: &str,
            _: u64,
        ) -> Result<String, ChainError> {
            Ok(format!("0x{}", "cd".repeat(65)))
        }
        fn signer_address(&self) -> String {
            format!("0x{}", "12".repeat(20))
        }
    }

    fn base_executor(sdks: ChainSdks, peer_directory: Arc<dyn PeerDirectory>) -> Arc<SettlementExecutor> {
        let persist: Arc<dyn Persist> = Arc::new(NullPersist);
        let telemetry: Arc<dyn Telemetry> = Arc::new(NullTelemetry);
        let sender = Arc::new(ClaimSender::new("node-1", Arc::clone(&persist), Arc::clone(&telemetry)));
        Arc::new(SettlementExecutor::new(
            "node-1",
            sdks,
            persist,
            telemetry,
            peer_directory,
            sender,
        ))
    }

    #[tokio::test]
    async fn test_scenario_8_evm_routing_opens_channel() {
        let evm_sdk = Arc::new(CountingEvmSdk {
            open_channel_calls: AtomicUsize::new(0),
        });
        let executor = base_executor(
            ChainSdks {
                evm: Some(evm_sdk.clone()),
                evm_signer: Some(Arc::new(StubEvmSigner)),
                ..Default::default()
            },
            Arc::new(OnePeer(Arc::new(AlwaysOkPeerHandle))),
        );
        let mut peer = PeerSettlementConfig::new(
            "peer-1",
            Address::parse("g.peer1").unwrap(),
            SettlementPreference::Evm,
            HashSet::from(["USDC".to_string()]),
        );
        peer.evm_address = Some(format!("0x{}", "34".repeat(20)));
        executor.register_peer(peer);

        executor
            .handle_settlement_required(SettlementRequiredEvent {
                peer_id: "peer-1".to_string(),
                balance: "100".to_string(),
                token_id: "USDC".to_string(),
                timestamp_ms: 1,
            })
            .await
            .unwrap();

        assert_eq!(evm_sdk.open_channel_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scenario_8_incompatible_token_rejects_with_no_sdk_calls() {
        let evm_sdk = Arc::new(CountingEvmSdk {
            open_channel_calls: AtomicUsize::new(0),
        });
        let executor = base_executor(
            ChainSdks {
                evm: Some(evm_sdk.clone()),
                evm_signer: Some(Arc::new(StubEvmSigner)),
                ..Default::default()
            },
            Arc::new(NoPeers),
        );
        let mut peer = PeerSettlementConfig::new(
            "peer-1",
            Address::parse("g.peer1").unwrap(),
            SettlementPreference::Evm,
            HashSet::from(["USDC".to_string()]),
        );
        peer.evm_address = Some(format!("0x{}", "34".repeat(20)));
        executor.register_peer(peer);

        let err = executor
            .handle_settlement_required(SettlementRequiredEvent {
                peer_id: "peer-1".to_string(),
                balance: "100".to_string(),
                token_id: "XRP".to_string(),
                timestamp_ms: 1,
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "No compatible settlement method");
        assert_eq!(evm_sdk.open_channel_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_peer_is_dropped_not_errored() {
        let executor = base_executor(ChainSdks::default(), Arc::new(NoPeers));
        let result = executor
            .handle_settlement_required(SettlementRequiredEvent {
                peer_id: "ghost".to_string(),
                balance: "1".to_string(),
                token_id: "XRP".to_string(),
                timestamp_ms: 1,
            })
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_aptos_signed_claim_fields_are_owned() {
        let claim = AptosSignedClaim {
            channel_owner: "0xabc".to_string(),
            amount: "1".to_string(),
            nonce: 1,
            signature: "ab".to_string(),
            public_key: "cd".to_string(),
        };
        assert_eq!(claim.nonce, 1);
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_executor_is_send_sync() {
        assert_send_sync::<SettlementExecutor>();
    }
}
