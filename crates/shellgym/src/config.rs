//! Environment configuration.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};
use shellgym_engine::SessionSpec;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Constructor-time configuration, fixed for a session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Sandbox image or template identifier.
    #[serde(default = "default_image")]
    pub image: String,

    /// Per-command wall-clock budget in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Non-privileged user commands run as inside the session.
    #[serde(default = "default_user")]
    pub user: String,

    /// Working directory inside the session.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
}

fn default_image() -> String {
    "shellgym-bash:0.1".to_string()
}

fn default_timeout() -> u64 {
    2
}

fn default_user() -> String {
    "agent".to_string()
}

fn default_workdir() -> PathBuf {
    PathBuf::from("/workspace")
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            timeout_secs: default_timeout(),
            user: default_user(),
            workdir: default_workdir(),
        }
    }
}

impl EnvConfig {
    /// Create a config with the given image and default everything else.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    /// Set the per-command timeout in seconds.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
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

    /// Per-command budget as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Session spec handed to the engine on provisioning.
    pub fn session_spec(&self) -> SessionSpec {
        SessionSpec::new(self.image.clone())
            .with_user(self.user.clone())
            .with_workdir(self.workdir.clone())
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, EnvError> {
        let content = fs::read_to_string(path)
            .map_err(|e| EnvError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn parse(content: &str) -> Result<Self, EnvError> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| EnvError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), EnvError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| EnvError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| EnvError::Config(format!("{}: {}", parent.display(), e)))?;
        }
        fs::write(path, content)
            .map_err(|e| EnvError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), EnvError> {
        let mut errors = Vec::new();

        if self.image.trim().is_empty() {
            errors.push("image must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            errors.push("timeout_secs must be at least 1".to_string());
        }
        if self.user.trim().is_empty() {
            errors.push("user must not be empty".to_string());
        }
        if !self.workdir.is_absolute() {
            errors.push(format!(
                "workdir must be absolute, got {}",
                self.workdir.display()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EnvError::Config(errors.join("; ")))
        }
    }
}
