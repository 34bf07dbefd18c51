//! Engine error types.

use std::io;
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Session provisioning failed.
    #[error("Session provisioning failed: {0}")]
    Provisioning(String),

    /// Command execution failed for a reason other than the command itself
    /// exiting non-zero.
    #[error("Command execution failed: {0}")]
    Exec(String),

    /// Command exceeded its wall-clock budget. Carries whatever stdout was
    /// captured before the deadline.
    #[error("Command timed out after {timeout_secs} seconds")]
    Timeout {
        /// Configured budget that was exceeded.
        timeout_secs: u64,
        /// Partial stdout captured before the deadline (may be empty).
        partial_stdout: String,
    },

    /// The engine backend is not usable (e.g. no docker binary on PATH).
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Create a new provisioning error.
    pub fn provisioning(msg: impl Into<String>) -> Self {
        Self::Provisioning(msg.into())
    }

    /// Create a new execution error.
    pub fn exec(msg: impl Into<String>) -> Self {
        Self::Exec(msg.into())
    }

    /// Check whether this error is the timeout variant.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
