//! Run a couple of commands through a sandbox session.
//!
//! Uses the docker backend when a daemon is reachable, otherwise falls back
//! to unisolated local subprocesses:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example basic
//! ```

use shellgym::{BashAction, EnvConfig, SandboxSession};
use shellgym_engine::{DockerEngine, Engine, LocalEngine};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let docker = DockerEngine::new();
    let engine: Arc<dyn Engine> = match docker.available().await {
        Ok(()) => Arc::new(docker),
        Err(e) => {
            eprintln!("docker unavailable ({e}), using local subprocesses");
            Arc::new(LocalEngine::new())
        }
    };

    let mut env = SandboxSession::new(engine, EnvConfig::default());
    env.reset().await?;

    for cmd in ["echo 42", "pwd", "sleep 5"] {
        let step = env.step(&BashAction::new(cmd)).await?;
        println!(
            "$ {cmd}\n  exit={} stdout={:?} stderr={:?} info={:?}",
            step.obs.exit, step.obs.stdout, step.obs.stderr, step.info
        );
    }

    env.close().await;
    Ok(())
}
