//! Gym-style shell-command environment over sandboxed execution sessions.
//!
//! A [`SandboxSession`] owns exactly one isolated execution context at a time
//! and exposes the familiar `reset()/step()/close()` loop to agent code: each
//! step forwards one bash command into the live session under a wall-clock
//! budget and returns a bounded, fixed-shape observation.
//!
//! ```no_run
//! use shellgym::{BashAction, EnvConfig, SandboxSession};
//! use shellgym_engine::DockerEngine;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), shellgym::EnvError> {
//! let mut env = SandboxSession::new(Arc::new(DockerEngine::new()), EnvConfig::default());
//! env.reset().await?;
//! let step = env.step(&BashAction::new("echo 42")).await?;
//! assert_eq!(step.obs.exit, 0);
//! env.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod reward;
pub mod session;
pub mod types;

pub use config::EnvConfig;
pub use error::EnvError;
pub use reward::{RewardPolicy, ZeroReward};
pub use session::{SandboxSession, OUTPUT_CAP, TIMEOUT_EXIT, TIMEOUT_MARKER};
pub use types::{BashAction, BashObs, Step, StepInfo, ToolKind};

/// Result type for environment operations.
pub type Result<T> = std::result::Result<T, EnvError>;
