//! Peer settlement configuration and the routing rule that picks a chain.

use ilp_types::Address;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::RwLock;

/// A settlement-relevant token identifier, e.g. `"XRP"`, `"APT"`, or an EVM
/// token contract address.
pub type TokenId = String;

/// Which chains a peer is willing to settle on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementPreference {
    Evm,
    Xrp,
    Aptos,
    Any,
}

impl SettlementPreference {
    fn allows(self, chain: Chain) -> bool {
        match self {
            SettlementPreference::Any => true,
            SettlementPreference::Evm => chain == Chain::Evm,
            SettlementPreference::Xrp => chain == Chain::Xrp,
            SettlementPreference::Aptos => chain == Chain::Aptos,
        }
    }
}

/// The chain family a claim settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Xrp,
    Evm,
    Aptos,
}

impl Chain {
    /// Resolves the chain a `tokenId` settles on: the literal `"XRP"` and
    /// `"APT"` tokens route to their native chains, everything else is
    /// assumed to be an EVM token contract address.
    pub fn for_token(token_id: &str) -> Chain {
        match token_id {
            "XRP" => Chain::Xrp,
            "APT" => Chain::Aptos,
            _ => Chain::Evm,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Xrp => "xrp",
            Chain::Evm => "evm",
            Chain::Aptos => "aptos",
        }
    }
}

/// Static per-peer settlement configuration plus the executor's lazily
/// cached channel identifiers, keyed by chain.
#[derive(Debug)]
pub struct PeerSettlementConfig {
    pub peer_id: String,
    pub address: Address,
    pub settlement_preference: SettlementPreference,
    pub settlement_tokens: HashSet<TokenId>,
    pub evm_address: Option<String>,
    pub xrp_address: Option<String>,
    pub aptos_address: Option<String>,
    pub aptos_pubkey: Option<String>,
    channels: RwLock<ChannelCache>,
}

#[derive(Debug, Default)]
struct ChannelCache {
    xrp: Option<String>,
    evm: Option<String>,
    aptos: Option<String>,
}

impl PeerSettlementConfig {
    pub fn new(
        peer_id: impl Into<String>,
        address: Address,
        settlement_preference: SettlementPreference,
        settlement_tokens: HashSet<TokenId>,
    ) -> Self {
        PeerSettlementConfig {
            peer_id: peer_id.into(),
            address,
            settlement_preference,
            settlement_tokens,
            evm_address: None,
            xrp_address: None,
            aptos_address: None,
            aptos_pubkey: None,
            channels: RwLock::new(ChannelCache::default()),
        }
    }

    /// `true` if this peer accepts the given chain both by token acceptance
    /// and by its own settlement preference.
    pub fn accepts(&self, chain: Chain) -> bool {
        self.settlement_preference.allows(chain)
    }

    pub fn cached_channel(&self, chain: Chain) -> Option<String> {
        let cache = self.channels.read().expect("channel cache lock poisoned");
        match chain {
            Chain::Xrp => cache.xrp.clone(),
            Chain::Evm => cache.evm.clone(),
            Chain::Aptos => cache.aptos.clone(),
        }
    }

    pub fn cache_channel(&self, chain: Chain, channel_id: String) {
        let mut cache = self.channels.write().expect("channel cache lock poisoned");
        match chain {
            Chain::Xrp => cache.xrp = Some(channel_id),
            Chain::Evm => cache.evm = Some(channel_id),
            Chain::Aptos => cache.aptos = Some(channel_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_routing() {
        assert_eq!(Chain::for_token("XRP"), Chain::Xrp);
        assert_eq!(Chain::for_token("APT"), Chain::Aptos);
        assert_eq!(Chain::for_token("0xUSDC"), Chain::Evm);
    }

    #[test]
    fn test_preference_allows_only_matching_chain() {
        assert!(SettlementPreference::Evm.allows(Chain::Evm));
        assert!(!SettlementPreference::Evm.allows(Chain::Xrp));
        assert!(SettlementPreference::Any.allows(Chain::Aptos));
    }

    #[test]
    fn test_settlement_preference_deserializes_lowercase() {
        let pref: SettlementPreference = serde_json::from_str("\"xrp\"").unwrap();
        assert_eq!(pref, SettlementPreference::Xrp);
        let pref: SettlementPreference = serde_json::from_str("\"any\"").unwrap();
        assert_eq!(pref, SettlementPreference::Any);
    }

    #[test]
    fn test_channel_cache_round_trip() {
        let config = PeerSettlementConfig::new(
            "peer-1",
            Address::parse("g.peer1").unwrap(),
            SettlementPreference::Evm,
            HashSet::from(["USDC".to_string()]),
        );
        assert_eq!(config.cached_channel(Chain::Evm), None);
        config.cache_channel(Chain::Evm, "0xabc".to_string());
        assert_eq!(config.cached_channel(Chain::Evm), Some("0xabc".to_string()));
    }
}
