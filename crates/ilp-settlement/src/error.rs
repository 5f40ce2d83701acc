//! Error taxonomy for the settlement layer.
//!
//! Codecs (in `ilp-types`) never retry and never swallow; this crate is
//! where retry, persistence-conflict, and telemetry-failure policy lives.

use thiserror::Error;

/// A send over a [`crate::collaborators::PeerHandle`] failed. Retried by the
/// claim sender up to the configured [`crate::retry::RetryPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Outcome of a [`crate::collaborators::Persist`] write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    /// Unique-constraint violation on `messageId`; recovered as warn-and-continue.
    #[error("duplicate messageId {0}")]
    Conflict(String),
    #[error("persistence error: {0}")]
    Other(String),
}

/// A [`crate::collaborators::Telemetry`] emission failed. Logged and swallowed
/// by the claim sender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("telemetry error: {0}")]
pub struct TelemetryError(pub String);

/// A chain SDK collaborator call failed. These propagate to the executor's caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chain SDK error: {0}")]
pub struct ChainError(pub String);

/// Executor-level configuration/routing failure, e.g. no compatible settlement method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);
