//! Wires the settlement core to in-memory demo collaborators and runs it
//! until a shutdown signal arrives.

use crate::config::Config;
use crate::demo;
use ilp_settlement::collaborators::{PeerDirectory, Persist, SettlementRequiredEvent, Telemetry};
use ilp_settlement::util::SigDown;
use ilp_settlement::{ChainSdks, ClaimSender, PeerSettlementConfig, SettlementExecutor, SettlementPreference};
use ilp_types::Address;
use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

pub async fn run() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    crate::logging::init(config.log_level());

    let persist: Arc<dyn Persist> = Arc::new(demo::InMemoryPersist::default());
    let telemetry: Arc<dyn Telemetry> = Arc::new(demo::TracingTelemetry);
    let peer_directory: Arc<dyn PeerDirectory> = Arc::new(demo::SinglePeerDirectory::new());
    let sender = Arc::new(
        ClaimSender::new(config.node_id().to_string(), Arc::clone(&persist), Arc::clone(&telemetry))
            .with_retry_policy(config.retry_policy()),
    );

    let toggles = config.chains();
    let sdks = ChainSdks {
        evm: if toggles.evm { Some(Arc::new(demo::MockEvmSdk)) } else { None },
        evm_signer: if toggles.evm { Some(Arc::new(demo::MockEvmSigner)) } else { None },
        xrp_channels: if toggles.xrp { Some(Arc::new(demo::MockXrpChannelManager)) } else { None },
        xrp_signer: if toggles.xrp { Some(Arc::new(demo::MockXrpSigner)) } else { None },
        aptos: if toggles.aptos { Some(Arc::new(demo::MockAptosSdk)) } else { None },
    };

    let executor = Arc::new(SettlementExecutor::new(
        config.node_id().to_string(),
        sdks,
        persist,
        telemetry,
        peer_directory,
        sender,
    ));

    let configured_peers: Vec<PeerSettlementConfig> = config.peers().collect();
    if configured_peers.is_empty() {
        executor.register_peer(default_demo_peer()?);
    } else {
        for peer in configured_peers {
            executor.register_peer(peer);
        }
    }

    let (monitor, events_tx) = demo::DemoSettlementMonitor::new();
    executor.start(&monitor);

    let _ = events_tx.send(SettlementRequiredEvent {
        peer_id: "peer-1".to_string(),
        balance: "1000000".to_string(),
        token_id: "USDC".to_string(),
        timestamp_ms: now_millis(),
    });

    info!(node_id = config.node_id(), "ilp-connector demo running, waiting for shutdown signal");

    let sig_down = SigDown::try_new()?;
    sig_down.recv().await;

    info!("shutdown signal received, draining settlement executor");
    executor.stop().await;
    Ok(())
}

/// A runnable peer used when the config file configures none, so the demo
/// still exercises the executor end to end out of the box.
fn default_demo_peer() -> Result<PeerSettlementConfig, Box<dyn Error>> {
    let mut peer = PeerSettlementConfig::new(
        "peer-1",
        Address::parse("g.peer1").map_err(|e| e.to_string())?,
        SettlementPreference::Any,
        HashSet::from(["USDC".to_string(), "XRP".to_string(), "APT".to_string()]),
    );
    peer.evm_address = Some(format!("0x{}", "ab".repeat(20)));
    peer.xrp_address = Some("rDemoPeerAddress".to_string());
    peer.aptos_address = Some(format!("0x{}", "cd".repeat(16)));
    Ok(peer)
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the Unix epoch")
        .as_millis()
}
