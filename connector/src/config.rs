//! Configuration for the demo connector binary.
//!
//! A `--config`/`-c` path (env `CONFIG`, default `config.json`) points at a
//! JSON file carrying the node id, retry policy overrides, per-peer
//! settlement configs, and which demo chain SDKs to enable. Fields absent
//! from the file fall back to environment variables, then hardcoded
//! defaults, matching the teacher's `facilitator/src/config.rs` layering.

use clap::Parser;
use ilp_settlement::{PeerSettlementConfig, RetryPolicy, SettlementPreference};
use ilp_types::Address;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments for the demo connector binary.
#[derive(Parser, Debug)]
#[command(name = "ilp-connector")]
#[command(about = "Demo host binary for the ILP settlement core")]
struct CliArgs {
    /// Path to the JSON configuration file.
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

/// Resolved connector configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_node_id")]
    node_id: String,
    #[serde(default = "config_defaults::default_log_level")]
    log_level: String,
    #[serde(default)]
    retry: RetryOverrides,
    #[serde(default)]
    peers: Vec<PeerConfigEntry>,
    #[serde(default)]
    chains: ChainToggles,
}

/// Overrides for [`RetryPolicy`]; any field left absent keeps the default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetryOverrides {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    factor: Option<u32>,
}

impl RetryOverrides {
    fn resolve(&self) -> RetryPolicy {
        let base = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            base_delay: self
                .base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(base.base_delay),
            factor: self.factor.unwrap_or(base.factor),
        }
    }
}

/// A single peer's static settlement configuration, as read from the config
/// file. Converts into [`PeerSettlementConfig`] via
/// [`Self::into_peer_settlement_config`].
#[derive(Debug, Clone, Deserialize)]
pub struct PeerConfigEntry {
    pub peer_id: String,
    pub address: Address,
    #[serde(default = "default_preference")]
    pub settlement_preference: SettlementPreference,
    #[serde(default)]
    pub settlement_tokens: Vec<String>,
    #[serde(default)]
    pub evm_address: Option<String>,
    #[serde(default)]
    pub xrp_address: Option<String>,
    #[serde(default)]
    pub aptos_address: Option<String>,
    #[serde(default)]
    pub aptos_pubkey: Option<String>,
}

fn default_preference() -> SettlementPreference {
    SettlementPreference::Any
}

impl PeerConfigEntry {
    pub fn into_peer_settlement_config(self) -> PeerSettlementConfig {
        let mut config = PeerSettlementConfig::new(
            self.peer_id,
            self.address,
            self.settlement_preference,
            self.settlement_tokens.into_iter().collect::<HashSet<_>>(),
        );
        config.evm_address = self.evm_address;
        config.xrp_address = self.xrp_address;
        config.aptos_address = self.aptos_address;
        config.aptos_pubkey = self.aptos_pubkey;
        config
    }
}

/// Which demo chain SDKs `run.rs` should wire up.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainToggles {
    #[serde(default = "default_true")]
    pub evm: bool,
    #[serde(default = "default_true")]
    pub xrp: bool,
    #[serde(default = "default_true")]
    pub aptos: bool,
}

impl Default for ChainToggles {
    fn default() -> Self {
        ChainToggles {
            evm: true,
            xrp: true,
            aptos: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Errors loading and parsing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0:?}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    /// Loads configuration from the `--config`/`-c` path (env `CONFIG`,
    /// default `config.json`). A missing file at the default path is treated
    /// as an empty configuration; an explicitly named missing file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        if !cli_args.config.exists() {
            return Ok(serde_json::from_str("{}")?);
        }
        Self::load_from_path(cli_args.config)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.resolve()
    }

    pub fn peers(&self) -> impl Iterator<Item = PeerSettlementConfig> + '_ {
        self.peers.iter().cloned().map(PeerConfigEntry::into_peer_settlement_config)
    }

    pub fn chains(&self) -> &ChainToggles {
        &self.chains
    }
}

pub mod config_defaults {
    use std::env;

    pub const DEFAULT_NODE_ID: &str = "ilp-connector-demo";
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    pub fn default_node_id() -> String {
        env::var("NODE_ID").unwrap_or_else(|_| DEFAULT_NODE_ID.to_string())
    }

    pub fn default_log_level() -> String {
        env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.log_level(), config_defaults::default_log_level());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.peers().count(), 0);
        assert!(config.chains().evm);
    }

    #[test]
    fn test_retry_overrides_apply_selectively() {
        let config: Config = serde_json::from_str(r#"{"retry": {"max_attempts": 5}}"#).unwrap();
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, RetryPolicy::default().base_delay);
    }

    #[test]
    fn test_peer_entry_parses_and_converts() {
        let json = r#"{
            "peers": [{
                "peer_id": "peer-1",
                "address": "g.peer1",
                "settlement_preference": "evm",
                "settlement_tokens": ["USDC"],
                "evm_address": "0xabc"
            }]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let peers: Vec<_> = config.peers().collect();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].peer_id, "peer-1");
        assert_eq!(peers[0].evm_address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_missing_file_at_explicit_path_is_file_read_error() {
        let err = Config::load_from_path(PathBuf::from("/nonexistent/path/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_, _)));
    }
}
