//! Sandbox session lifecycle and command mediation.

use crate::config::EnvConfig;
use crate::error::EnvError;
use crate::reward::{RewardPolicy, ZeroReward};
use crate::types::{BashAction, BashObs, Step, StepInfo};
use crate::Result;
use shellgym_engine::{Engine, EngineError, SessionHandle, Teardown};
use std::sync::Arc;
use tracing::{debug, warn};

/// Bytes retained per captured output stream.
pub const OUTPUT_CAP: usize = 4096;

/// Reserved exit status for synthetic timeout observations.
pub const TIMEOUT_EXIT: i32 = -1;

/// Literal stderr marker for synthetic timeout observations.
pub const TIMEOUT_MARKER: &str = "TIMEOUT";

/// Owns the lifecycle of exactly one isolated execution context and mediates
/// command execution against it.
///
/// At most one session is live per instance at any time. `reset()` replaces
/// the live session, `step()` lazily provisions one when needed, `close()`
/// releases it. Dropping the value spawns a best-effort teardown when a
/// runtime is available, but `close()` is the guaranteed release path.
pub struct SandboxSession {
    engine: Arc<dyn Engine>,
    config: EnvConfig,
    policy: Box<dyn RewardPolicy>,
    handle: Option<SessionHandle>,
}

impl SandboxSession {
    /// Create an unprovisioned session over the given engine.
    ///
    /// The config is validated when the first session is provisioned; an
    /// invalid one (e.g. a zero timeout) fails `reset`/`step` with
    /// [`EnvError::Config`] before any engine interaction.
    pub fn new(engine: Arc<dyn Engine>, config: EnvConfig) -> Self {
        Self {
            engine,
            config,
            policy: Box::new(ZeroReward),
            handle: None,
        }
    }

    /// Replace the reward policy.
    pub fn with_reward_policy(mut self, policy: Box<dyn RewardPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Whether a session is currently live.
    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Handle of the live session, if any.
    pub fn handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }

    /// Start a new episode: destroy any live session, then provision a fresh
    /// one. On provisioning failure no session is considered live.
    pub async fn reset(&mut self) -> Result<()> {
        self.provision().await.map(|_| ())
    }

    /// Execute one command in the live session, provisioning one first if
    /// needed, and return the bounded observation.
    ///
    /// A command that exceeds the wall-clock budget is not an error: it
    /// yields an observation with exit [`TIMEOUT_EXIT`], stderr
    /// [`TIMEOUT_MARKER`], any partial stdout, and `info.timed_out` set.
    pub async fn step(&mut self, action: &BashAction) -> Result<Step> {
        if action.cmd.trim().is_empty() {
            return Err(EnvError::protocol("empty command string"));
        }

        let handle = self.ensure_session().await?;

        match self
            .engine
            .exec(&handle, &action.cmd, self.config.timeout())
            .await
        {
            Ok(outcome) => {
                let (stdout, stdout_over) = cap_stream(outcome.stdout);
                let (stderr, stderr_over) = cap_stream(outcome.stderr);
                let obs = BashObs {
                    stdout,
                    stderr,
                    exit: outcome.exit_code,
                };
                let info = StepInfo {
                    truncated: stdout_over || stderr_over,
                    timed_out: false,
                };
                let (reward, done) = self.policy.judge(action, &obs);
                Ok(Step {
                    obs,
                    reward,
                    done,
                    info,
                })
            }
            Err(EngineError::Timeout { partial_stdout, .. }) => {
                let (stdout, _) = cap_stream(partial_stdout);
                let obs = BashObs {
                    stdout,
                    stderr: TIMEOUT_MARKER.to_string(),
                    exit: TIMEOUT_EXIT,
                };
                let info = StepInfo {
                    truncated: false,
                    timed_out: true,
                };
                let (reward, done) = self.policy.judge(action, &obs);
                Ok(Step {
                    obs,
                    reward,
                    done,
                    info,
                })
            }
            Err(e) => Err(EnvError::Engine(e)),
        }
    }

    /// Tear down the live session, if any. Teardown failures are logged and
    /// swallowed; calling this with nothing live is a no-op.
    pub async fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            match self.engine.destroy_session(&handle).await {
                Teardown::Removed => debug!(session = %handle.id, "session destroyed"),
                Teardown::Failed(reason) => {
                    warn!(session = %handle.id, "session teardown failed (ignored): {}", reason)
                }
            }
        }
    }

    async fn ensure_session(&mut self) -> Result<SessionHandle> {
        match &self.handle {
            Some(handle) => Ok(handle.clone()),
            None => self.provision().await,
        }
    }

    async fn provision(&mut self) -> Result<SessionHandle> {
        // Configs built by hand bypass parse-time validation; reject them
        // before any engine interaction.
        self.config.validate()?;

        // Guaranteed cleanup before re-provisioning.
        self.close().await;

        let handle = self
            .engine
            .create_session(&self.config.session_spec())
            .await
            .map_err(EnvError::Provisioning)?;
        debug!(session = %handle.id, image = %self.config.image, "session provisioned");
        self.handle = Some(handle.clone());
        Ok(handle)
    }
}

impl Drop for SandboxSession {
    fn drop(&mut self) {
        // Safety net only; close() is the guaranteed release path.
        if let Some(handle) = self.handle.take() {
            let engine = Arc::clone(&self.engine);
            match tokio::runtime::Handle::try_current() {
                Ok(rt) => {
                    rt.spawn(async move {
                        let _ = engine.destroy_session(&handle).await;
                    });
                }
                Err(_) => {
                    warn!(
                        session = %handle.id,
                        "session dropped outside a runtime; call close() to guarantee teardown"
                    );
                }
            }
        }
    }
}

/// Truncate a stream to [`OUTPUT_CAP`] bytes, backing off to the nearest
/// UTF-8 boundary. Returns the capped stream and whether the original
/// exceeded the cap.
fn cap_stream(mut s: String) -> (String, bool) {
    if s.len() <= OUTPUT_CAP {
        return (s, false);
    }
    let mut cut = OUTPUT_CAP;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    (s, true)
}
