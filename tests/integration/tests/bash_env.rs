//! End-to-end environment scenarios over real subprocesses.
//!
//! These run through `LocalEngine` so they work in CI without a container
//! runtime; the docker backend shares the same exec/timeout plumbing.

use shellgym::{BashAction, EnvConfig, SandboxSession, OUTPUT_CAP, TIMEOUT_EXIT, TIMEOUT_MARKER};
use shellgym_engine::LocalEngine;
use std::sync::Arc;

fn local_env(timeout_secs: u64) -> SandboxSession {
    SandboxSession::new(
        Arc::new(LocalEngine::new()),
        EnvConfig::default().with_timeout_secs(timeout_secs),
    )
}

#[tokio::test]
async fn test_echo_ok() {
    let mut env = local_env(2);
    env.reset().await.unwrap();

    let step = env.step(&BashAction::new("echo 42")).await.unwrap();
    assert_eq!(step.obs.exit, 0);
    assert_eq!(step.obs.stdout.trim(), "42");
    assert_eq!(step.reward, 0.0);
    assert!(!step.done);
    assert!(!step.info.truncated);
    assert!(!step.info.timed_out);

    env.close().await;
}

#[tokio::test]
async fn test_timeout() {
    let mut env = local_env(2);
    env.reset().await.unwrap();

    let step = env.step(&BashAction::new("sleep 5")).await.unwrap();
    assert_eq!(step.obs.exit, TIMEOUT_EXIT);
    assert_eq!(step.obs.stderr, TIMEOUT_MARKER);
    assert!(step.info.timed_out);
    assert!(!step.info.truncated);

    env.close().await;
}

#[tokio::test]
async fn test_timeout_preserves_partial_stdout() {
    let mut env = local_env(1);
    env.reset().await.unwrap();

    let step = env
        .step(&BashAction::new("echo before; sleep 5"))
        .await
        .unwrap();
    assert_eq!(step.obs.exit, TIMEOUT_EXIT);
    assert_eq!(step.obs.stdout.trim(), "before");

    env.close().await;
}

#[tokio::test]
async fn test_truncation() {
    let mut env = local_env(5);
    env.reset().await.unwrap();

    let long = "x".repeat(5 * 1024);
    let step = env
        .step(&BashAction::new(format!("printf '{long}'")))
        .await
        .unwrap();
    assert_eq!(step.obs.stdout.len(), OUTPUT_CAP);
    assert_eq!(step.obs.stdout, long[..OUTPUT_CAP]);
    assert!(step.info.truncated);

    env.close().await;
}

#[tokio::test]
async fn test_output_at_cap_not_flagged() {
    let mut env = local_env(5);
    env.reset().await.unwrap();

    let exact = "x".repeat(OUTPUT_CAP);
    let step = env
        .step(&BashAction::new(format!("printf '{exact}'")))
        .await
        .unwrap();
    assert_eq!(step.obs.stdout, exact);
    assert!(!step.info.truncated);

    env.close().await;
}

#[tokio::test]
async fn test_step_without_reset_bootstraps() {
    let mut env = local_env(2);

    let step = env.step(&BashAction::new("echo lazy")).await.unwrap();
    assert_eq!(step.obs.exit, 0);
    assert_eq!(step.obs.stdout.trim(), "lazy");
    assert!(env.is_live());

    env.close().await;
}

#[tokio::test]
async fn test_state_persists_within_episode() {
    let mut env = local_env(2);
    env.reset().await.unwrap();

    env.step(&BashAction::new("echo data > state.txt"))
        .await
        .unwrap();
    let step = env.step(&BashAction::new("cat state.txt")).await.unwrap();
    assert_eq!(step.obs.stdout.trim(), "data");

    env.close().await;
}

#[tokio::test]
async fn test_reset_starts_fresh_session() {
    let engine = Arc::new(LocalEngine::new());
    let mut env = SandboxSession::new(
        engine.clone(),
        EnvConfig::default().with_timeout_secs(2),
    );

    env.reset().await.unwrap();
    env.step(&BashAction::new("touch stale.txt")).await.unwrap();
    env.reset().await.unwrap();
    assert_eq!(engine.live_sessions(), 1);

    let step = env.step(&BashAction::new("ls")).await.unwrap();
    assert!(!step.obs.stdout.contains("stale.txt"));

    env.close().await;
    assert_eq!(engine.live_sessions(), 0);
}

#[tokio::test]
async fn test_double_close_is_noop() {
    let mut env = local_env(2);
    env.reset().await.unwrap();
    env.close().await;
    env.close().await;
    assert!(!env.is_live());
}

#[tokio::test]
async fn test_wrong_discriminator_rejected_before_execution() {
    // Actions arrive as JSON from the agent loop; a non-bash tool tag never
    // deserializes into an action, so no session is ever touched.
    let parsed = serde_json::from_str::<BashAction>(r#"{"tool":"python","cmd":"echo 42"}"#);
    assert!(parsed.is_err());
}

#[tokio::test]
async fn test_signal_killed_command_is_not_timeout_shaped() {
    let mut env = local_env(5);
    env.reset().await.unwrap();

    let step = env.step(&BashAction::new("kill -9 $$")).await.unwrap();
    // Signal deaths report 128 + signal; -1 stays reserved for timeouts.
    assert_eq!(step.obs.exit, 137);
    assert_ne!(step.obs.exit, TIMEOUT_EXIT);
    assert_ne!(step.obs.stderr, TIMEOUT_MARKER);
    assert!(!step.info.timed_out);

    env.close().await;
}

#[tokio::test]
async fn test_command_failure_is_observed_not_raised() {
    let mut env = local_env(2);
    env.reset().await.unwrap();

    let step = env
        .step(&BashAction::new("ls /definitely/not/here"))
        .await
        .unwrap();
    assert_ne!(step.obs.exit, 0);
    assert!(!step.obs.stderr.is_empty());
    assert_eq!(step.reward, 0.0);
    assert!(!step.done);

    env.close().await;
}
