//! Local subprocess engine.
//!
//! Runs commands as plain `/bin/sh -c` children with **no isolation**: each
//! session is just a scratch directory used as the working dir. Intended for
//! development and CI environments without a container runtime; never point
//! it at untrusted commands.

use crate::engine::{run_with_budget, Engine, ExecOutcome, SessionHandle, SessionSpec, Teardown};
use crate::error::EngineError;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

/// Engine that executes commands in unisolated local subprocesses.
pub struct LocalEngine {
    /// Shell used for command execution.
    shell: String,

    /// Shell flag introducing the command string.
    shell_flag: String,

    /// Live session scratch directories, keyed by session ID. Dropping the
    /// `TempDir` deletes the directory.
    sessions: Mutex<HashMap<String, TempDir>>,
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEngine {
    /// Create a local engine using `/bin/sh -c`.
    pub fn new() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
            shell_flag: "-c".to_string(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Use a different shell (e.g. `/bin/bash`).
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Number of currently live sessions.
    pub fn live_sessions(&self) -> usize {
        self.sessions.lock().expect("session map poisoned").len()
    }
}

#[async_trait]
impl Engine for LocalEngine {
    async fn create_session(&self, spec: &SessionSpec) -> Result<SessionHandle> {
        let dir = TempDir::new()
            .map_err(|e| EngineError::provisioning(format!("scratch dir creation failed: {}", e)))?;
        let workdir = dir.path().to_path_buf();
        let id = Uuid::new_v4().to_string();

        self.sessions
            .lock()
            .expect("session map poisoned")
            .insert(id.clone(), dir);

        debug!(session = %id, workdir = %workdir.display(), "provisioned local session");
        Ok(SessionHandle {
            id,
            user: spec.user.clone(),
            workdir,
        })
    }

    async fn exec(
        &self,
        handle: &SessionHandle,
        command: &str,
        budget: Duration,
    ) -> Result<ExecOutcome> {
        if !self
            .sessions
            .lock()
            .expect("session map poisoned")
            .contains_key(&handle.id)
        {
            return Err(EngineError::exec(format!(
                "no live session {}",
                handle.id
            )));
        }

        debug!(session = %handle.id, command, "local exec");

        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.shell_flag)
            .arg(command)
            .current_dir(&handle.workdir);

        let result = run_with_budget(cmd, budget).await;
        if matches!(result, Err(EngineError::Timeout { .. })) {
            warn!(session = %handle.id, command, "command timed out");
        }
        result
    }

    async fn destroy_session(&self, handle: &SessionHandle) -> Teardown {
        match self
            .sessions
            .lock()
            .expect("session map poisoned")
            .remove(&handle.id)
        {
            Some(_dir) => {
                debug!(session = %handle.id, "removed local session");
                Teardown::Removed
            }
            None => Teardown::Failed(format!("no live session {}", handle.id)),
        }
    }
}
