//! The engine contract: provision, execute, destroy.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Safety limit on bytes captured per stream, regardless of what callers
/// later truncate observations to. Bounds memory against runaway producers
/// like `yes` or `cat /dev/zero`.
pub(crate) const CAPTURE_LIMIT: usize = 10 * 1024 * 1024;

/// Specification for a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSpec {
    /// Container image or template identifier.
    pub image: String,

    /// Non-privileged user commands run as.
    pub user: String,

    /// Working directory inside the session.
    pub workdir: PathBuf,

    /// Allocate an interactive-capable TTY.
    #[serde(default = "default_true")]
    pub interactive: bool,
}

fn default_true() -> bool {
    true
}

impl SessionSpec {
    /// Create a spec with the given image and default user/workdir.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            user: "agent".to_string(),
            workdir: PathBuf::from("/workspace"),
            interactive: true,
        }
    }

    /// Set the execution user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the working directory.
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }
}

/// Handle to one live session. Opaque to callers; only engines interpret the
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    /// Backend-specific identifier (container ID, local session UUID, ...).
    pub id: String,

    /// User commands run as inside the session.
    pub user: String,

    /// Working directory commands run in.
    pub workdir: PathBuf,
}

/// Output of one command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecOutcome {
    /// Captured standard output (uncapped, up to the engine capture limit).
    pub stdout: String,

    /// Captured standard error (uncapped, up to the engine capture limit).
    pub stderr: String,

    /// Process exit status (0 = success).
    pub exit_code: i32,

    /// Wall-clock execution duration in milliseconds.
    pub duration_ms: u64,
}

/// Best-effort result of destroying a session. Destruction never fails the
/// caller; a failed removal is reported here and may be ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Teardown {
    /// The session was removed.
    Removed,

    /// The backend reported an error during removal.
    Failed(String),
}

impl Teardown {
    /// Check whether the session was actually removed.
    pub fn removed(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

/// An execution engine: provisions isolated sessions, runs commands in them,
/// and destroys them.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Provision a new isolated session. Fatal on failure; no retry.
    async fn create_session(&self, spec: &SessionSpec) -> Result<SessionHandle>;

    /// Execute one shell command in the session under its user and working
    /// directory, subject to a wall-clock budget.
    ///
    /// On timeout the local waiting call is abandoned and the child killed;
    /// returns [`EngineError::Timeout`] carrying any partial stdout.
    ///
    /// [`EngineError::Timeout`]: crate::EngineError::Timeout
    async fn exec(
        &self,
        handle: &SessionHandle,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecOutcome>;

    /// Force-destroy the session. Best-effort: never raises.
    async fn destroy_session(&self, handle: &SessionHandle) -> Teardown;
}

/// Grace period after killing a timed-out child, giving the stream readers a
/// chance to flush what the pipe already holds.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Spawn a prepared command and wait for it under a wall-clock budget,
/// capturing both output streams. On timeout the child is killed and
/// [`EngineError::Timeout`] returned with any partial stdout.
///
/// [`EngineError::Timeout`]: crate::EngineError::Timeout
pub(crate) async fn run_with_budget(
    mut cmd: tokio::process::Command,
    budget: Duration,
) -> Result<ExecOutcome> {
    use crate::error::EngineError;
    use std::process::Stdio;

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let start = std::time::Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(|e| EngineError::exec(format!("failed to spawn command: {}", e)))?;

    // Captured bytes live in shared buffers so partial output survives a
    // timeout even if a grandchild keeps the pipe open past the kill.
    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));
    let stdout_task = tokio::spawn(capture_stream(
        child.stdout.take(),
        Arc::clone(&stdout_buf),
        CAPTURE_LIMIT,
    ));
    let stderr_task = tokio::spawn(capture_stream(
        child.stderr.take(),
        Arc::clone(&stderr_buf),
        CAPTURE_LIMIT,
    ));

    match tokio::time::timeout(budget, child.wait()).await {
        Ok(Ok(status)) => {
            let _ = stdout_task.await;
            let _ = stderr_task.await;
            Ok(ExecOutcome {
                stdout: take_string(&stdout_buf),
                stderr: take_string(&stderr_buf),
                exit_code: exit_status_code(status),
                duration_ms: start.elapsed().as_millis() as u64,
            })
        }
        Ok(Err(e)) => Err(EngineError::exec(format!(
            "failed to wait for command: {}",
            e
        ))),
        Err(_) => {
            if let Err(e) = child.start_kill() {
                tracing::warn!("failed to kill timed-out child: {}", e);
            }
            let _ = child.wait().await;
            // If a grandchild still holds the pipe open past the grace
            // period, settle for what the buffer already has.
            let _ = tokio::time::timeout(DRAIN_GRACE, async {
                let _ = stdout_task.await;
            })
            .await;
            stderr_task.abort();
            Err(EngineError::Timeout {
                timeout_secs: budget.as_secs(),
                partial_stdout: take_string(&stdout_buf),
            })
        }
    }
}

/// Map an exit status to an observable code. Signal deaths follow the shell
/// convention of `128 + signal` (e.g. SIGKILL -> 137), which also matches
/// what `docker exec` reports; -1 stays reserved for the timeout sentinel.
fn exit_status_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    // Terminated with neither a code nor a signal: report a generic
    // abnormal-exit code rather than the reserved sentinel.
    128
}

fn take_string(buf: &Arc<Mutex<Vec<u8>>>) -> String {
    let bytes = std::mem::take(&mut *buf.lock().expect("capture buffer poisoned"));
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Read an async stream to EOF into a shared buffer, storing at most `limit`
/// bytes but draining the rest so the child is never blocked on a full pipe.
pub(crate) async fn capture_stream(
    handle: Option<impl tokio::io::AsyncRead + Unpin>,
    buf: Arc<Mutex<Vec<u8>>>,
    limit: usize,
) {
    let Some(mut stream) = handle else {
        return;
    };

    let mut chunk = [0u8; 8192];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let mut stored = buf.lock().expect("capture buffer poisoned");
                let room = limit.saturating_sub(stored.len());
                stored.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) => {
                tracing::warn!("error reading stream: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder() {
        let spec = SessionSpec::new("shellgym-bash:0.1")
            .with_user("worker")
            .with_workdir("/srv/job");
        assert_eq!(spec.image, "shellgym-bash:0.1");
        assert_eq!(spec.user, "worker");
        assert_eq!(spec.workdir, PathBuf::from("/srv/job"));
        assert!(spec.interactive);
    }

    #[test]
    fn test_teardown_report() {
        assert!(Teardown::Removed.removed());
        assert!(!Teardown::Failed("gone".to_string()).removed());
    }

    #[tokio::test]
    async fn test_capture_stream_limit() {
        let data = vec![b'x'; 64 * 1024];
        let buf = Arc::new(Mutex::new(Vec::new()));
        capture_stream(Some(&data[..]), Arc::clone(&buf), 1024).await;
        assert_eq!(buf.lock().unwrap().len(), 1024);
    }

    #[tokio::test]
    async fn test_capture_stream_none() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        capture_stream(None::<&[u8]>, Arc::clone(&buf), 1024).await;
        assert!(buf.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_with_budget_success() {
        let mut cmd = tokio::process::Command::new("/bin/sh");
        cmd.args(["-c", "printf hello"]);
        let out = run_with_budget(cmd, Duration::from_secs(5)).await.unwrap();
        assert_eq!(out.stdout, "hello");
        assert_eq!(out.exit_code, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_with_budget_signal_death() {
        let mut cmd = tokio::process::Command::new("/bin/sh");
        cmd.args(["-c", "kill -9 $$"]);
        let out = run_with_budget(cmd, Duration::from_secs(5)).await.unwrap();
        // SIGKILL maps to 128 + 9, never the timeout sentinel.
        assert_eq!(out.exit_code, 137);
    }

    #[tokio::test]
    async fn test_run_with_budget_timeout() {
        let mut cmd = tokio::process::Command::new("/bin/sh");
        cmd.args(["-c", "sleep 10"]);
        let err = run_with_budget(cmd, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
