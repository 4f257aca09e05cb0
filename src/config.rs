//! Configuration loader and validator for the sync client.
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::QueueTuning;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub api: Api,
    pub queue: Queue,
    #[serde(default)]
    pub journal: Option<Journal>,
}

/// Persistence-service endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub base_url: String,
    pub timeout_ms: u64,
}

/// Queue tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Queue {
    pub max_pending: usize,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
}

/// Durable journal settings; omit the section to run purely in memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Journal {
    pub path: String,
}

impl Config {
    pub fn tuning(&self) -> QueueTuning {
        QueueTuning {
            max_pending: self.queue.max_pending,
            max_attempts: self.queue.max_attempts,
            backoff_base: Duration::from_millis(self.queue.backoff_base_ms),
            backoff_cap: Duration::from_millis(self.queue.backoff_cap_ms),
        }
    }

    /// Ensure the journal's parent directory exists (no-op without a journal).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if let Some(journal) = &self.journal {
            if let Some(parent) = Path::new(&journal.path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        Ok(())
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `padsync.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("padsync.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    if reqwest::Url::parse(&cfg.api.base_url).is_err() {
        return Err(ConfigError::Invalid("api.base_url must be a valid URL"));
    }
    if cfg.api.timeout_ms == 0 {
        return Err(ConfigError::Invalid("api.timeout_ms must be > 0"));
    }

    if cfg.queue.max_pending == 0 {
        return Err(ConfigError::Invalid("queue.max_pending must be > 0"));
    }
    if cfg.queue.max_attempts == 0 {
        return Err(ConfigError::Invalid("queue.max_attempts must be >= 1"));
    }
    if cfg.queue.backoff_cap_ms < cfg.queue.backoff_base_ms {
        return Err(ConfigError::Invalid(
            "queue.backoff_cap_ms must be >= queue.backoff_base_ms",
        ));
    }

    if let Some(journal) = &cfg.journal {
        if journal.path.trim().is_empty() {
            return Err(ConfigError::Invalid("journal.path must be non-empty"));
        }
    }

    Ok(())
}

/// Example configuration document used in docs and tests.
pub fn example() -> &'static str {
    r#"api:
  base_url: "https://pads.example.com/api/v1/"
  timeout_ms: 10000

queue:
  max_pending: 256
  max_attempts: 3
  backoff_base_ms: 250
  backoff_cap_ms: 5000

journal:
  path: "./data/padsync.db"
"#
}
