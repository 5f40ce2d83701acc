#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Claim sender and unified settlement executor for ILP payment-channel claims.
//!
//! This crate is the async half of the connector's settlement stack: it
//! consumes the pure wire types from [`ilp_types`] and adds the I/O-bound
//! pieces — retried delivery over a BTP peer, persistence, telemetry, and an
//! event-driven router from balance-threshold signals to signed claims.
//! Every collaborator (peer transport, persistence, telemetry, chain SDKs)
//! is a trait in [`collaborators`], injected at construction; this crate
//! implements none of them.
//!
//! # Modules
//!
//! - [`collaborators`] - trait contracts for peers, persistence, telemetry, and chain SDKs
//! - [`retry`] - the exponential-backoff retry policy
//! - [`sender`] - [`sender::ClaimSender`], idempotent retried claim dispatch
//! - [`peer_config`] - per-peer settlement configuration and chain routing
//! - [`executor`] - [`executor::SettlementExecutor`], the event-driven settlement router
//! - [`error`] - the settlement layer's error taxonomy
//! - [`util`] - graceful shutdown helpers

pub mod collaborators;
pub mod error;
pub mod executor;
pub mod peer_config;
pub mod retry;
pub mod sender;
pub mod util;

pub use executor::{ChainSdks, ChannelState, SettlementExecutor};
pub use peer_config::{Chain, PeerSettlementConfig, SettlementPreference, TokenId};
pub use retry::RetryPolicy;
pub use sender::{ClaimSender, SendOutcome};
