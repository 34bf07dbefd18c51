//! Environment error types.

use shellgym_engine::EngineError;
use thiserror::Error;

/// Errors that can escape `reset`/`step`. Timeouts never appear here (they
/// become observations) and teardown failures never escape `close`.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Caller violated the action contract (wrong discriminator, empty
    /// command). Programmer error; fails before any session interaction.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// The engine could not provision a session. Fatal, no retry.
    #[error("Session provisioning failed: {0}")]
    Provisioning(#[source] EngineError),

    /// Unclassified execution-layer error. Fatal, propagated unchanged.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EnvError {
    /// Create a new protocol-violation error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}
