//! Action, observation, and step types.
//!
//! The serde shapes stay wire-compatible with the conventional agent-loop
//! JSON: actions as `{"tool":"bash","cmd":"..."}`, observations as
//! `{"stdout":...,"stderr":...,"exit":...}`.

use serde::{Deserialize, Serialize};

/// Execution modality discriminator. Only shell execution exists today;
/// deserializing any other tag fails, which is how malformed actions are
/// rejected before touching a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Run a bash command.
    Bash,
}

/// One shell command to execute in the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BashAction {
    /// Execution modality.
    pub tool: ToolKind,

    /// Command string handed to the shell.
    pub cmd: String,
}

impl BashAction {
    /// Create a bash action for the given command.
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            tool: ToolKind::Bash,
            cmd: cmd.into(),
        }
    }
}

/// Observation returned by one step: both output streams capped, plus the
/// process exit status. `exit == -1` is the reserved timeout sentinel, not a
/// real exit code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BashObs {
    /// Captured standard output (capped).
    pub stdout: String,

    /// Captured standard error (capped).
    pub stderr: String,

    /// Process exit status (0 = success, -1 = timeout sentinel).
    pub exit: i32,
}

/// Side-channel flags accompanying an observation. The two flags never
/// co-occur: `truncated` is only set on the normal path, `timed_out` only on
/// the timeout path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    /// A stream exceeded the output cap before truncation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,

    /// The command exceeded its wall-clock budget.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}

/// Result of one environment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// The observation.
    pub obs: BashObs,

    /// Scalar reward. Fixed 0.0 under the default policy.
    pub reward: f64,

    /// Episode-terminal flag. Fixed false under the default policy.
    pub done: bool,

    /// Auxiliary flags.
    pub info: StepInfo,
}
