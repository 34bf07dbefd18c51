//! Docker-backed engine.
//!
//! One detached container per session, driven through the docker CLI:
//! `docker run -d -t` to provision, `docker exec` per command, `docker rm -f`
//! to destroy.

use crate::engine::{run_with_budget, Engine, ExecOutcome, SessionHandle, SessionSpec, Teardown};
use crate::error::EngineError;
use crate::Result;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Engine backed by a local docker daemon.
pub struct DockerEngine {
    /// Docker binary to invoke (normally just "docker").
    binary: String,
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerEngine {
    /// Create an engine using the `docker` binary from PATH.
    pub fn new() -> Self {
        Self {
            binary: "docker".to_string(),
        }
    }

    /// Use an explicit docker binary path.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Verify the docker CLI and daemon are reachable.
    pub async fn available(&self) -> Result<()> {
        let output = Command::new(&self.binary)
            .args(["version", "--format", "{{.Server.Version}}"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineError::Unavailable(format!("docker binary not runnable: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(EngineError::Unavailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

#[async_trait]
impl Engine for DockerEngine {
    async fn create_session(&self, spec: &SessionSpec) -> Result<SessionHandle> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["run", "-d"]);
        if spec.interactive {
            cmd.arg("-t");
        }
        cmd.arg("-u")
            .arg(&spec.user)
            .arg("-w")
            .arg(&spec.workdir)
            .arg(&spec.image)
            .stdin(Stdio::null());

        let output = cmd
            .output()
            .await
            .map_err(|e| EngineError::provisioning(format!("failed to run docker: {}", e)))?;

        if !output.status.success() {
            return Err(EngineError::provisioning(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(EngineError::provisioning(
                "docker run produced no container ID",
            ));
        }

        debug!(container = %id, image = %spec.image, "provisioned container session");
        Ok(SessionHandle {
            id,
            user: spec.user.clone(),
            workdir: spec.workdir.clone(),
        })
    }

    async fn exec(
        &self,
        handle: &SessionHandle,
        command: &str,
        budget: Duration,
    ) -> Result<ExecOutcome> {
        debug!(container = %handle.id, command, "docker exec");

        let mut cmd = Command::new(&self.binary);
        cmd.arg("exec")
            .arg("-u")
            .arg(&handle.user)
            .arg("-w")
            .arg(&handle.workdir)
            .arg(&handle.id)
            .args(["bash", "-lc", command]);

        // On timeout only the local client process is killed; the
        // in-container process is reclaimed when the container is removed
        // at episode end.
        let result = run_with_budget(cmd, budget).await;
        if matches!(result, Err(EngineError::Timeout { .. })) {
            warn!(container = %handle.id, command, "command timed out");
        }
        result
    }

    async fn destroy_session(&self, handle: &SessionHandle) -> Teardown {
        let result = Command::new(&self.binary)
            .args(["rm", "-f"])
            .arg(&handle.id)
            .stdin(Stdio::null())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                debug!(container = %handle.id, "removed container session");
                Teardown::Removed
            }
            Ok(output) => {
                let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
                warn!(container = %handle.id, "container removal failed: {}", reason);
                Teardown::Failed(reason)
            }
            Err(e) => {
                warn!(container = %handle.id, "container removal failed: {}", e);
                Teardown::Failed(e.to_string())
            }
        }
    }
}
