//! Execution-engine backends for ShellGym sandbox sessions.
//!
//! An [`Engine`] provisions isolated execution contexts ("sessions"), runs
//! shell commands inside them with a wall-clock budget, and tears them down.
//! Two backends are provided:
//! - [`DockerEngine`] - one detached container per session, via the docker CLI
//! - [`LocalEngine`] - plain subprocesses with no isolation, for development
//!   and CI environments without a container runtime

pub mod docker;
pub mod engine;
pub mod error;
pub mod local;

pub use docker::DockerEngine;
pub use engine::{Engine, ExecOutcome, SessionHandle, SessionSpec, Teardown};
pub use error::EngineError;
pub use local::LocalEngine;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
