use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fetchq_model::{ModelError, QueueBackend, QueueConfig};
use fetchq_observe::LoggerConfig;

/// Names the JSON configuration file.
pub const CONFIG_ENV: &str = "FETCHQ_CONFIG";
pub const LISTEN_ENV: &str = "FETCHQ_LISTEN";
pub const BACKEND_ENV: &str = "FETCHQ_BACKEND";
pub const WORKERS_ENV: &str = "FETCHQ_WORKERS";

const DEFAULT_PROXY_URL: &str = "https://proxy.golang.org";
const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {var}")]
    Override { var: &'static str, value: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub logger: LoggerConfig,
    pub queue: QueueConfig,
    /// Module proxy the fetch processor resolves versions against.
    pub proxy_url: String,
    /// Socket address of the HTTP listener.
    pub listen: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            logger: LoggerConfig::default(),
            queue: QueueConfig::default(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

impl AgentConfig {
    /// Load from the file named by `FETCHQ_CONFIG` (defaults when unset), then
    /// apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path.trim())?,
            _ => Self::default(),
        };
        cfg.apply_overrides(|var| std::env::var(var).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(listen) = lookup(LISTEN_ENV) {
            self.listen = listen;
        }
        if let Some(value) = lookup(BACKEND_ENV) {
            self.queue.backend = value.parse::<QueueBackend>().map_err(|_| ConfigError::Override {
                var: BACKEND_ENV,
                value,
            })?;
        }
        if let Some(value) = lookup(WORKERS_ENV) {
            self.queue.workers = value.trim().parse().map_err(|_| ConfigError::Override {
                var: WORKERS_ENV,
                value,
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.queue.validate()?;
        if self.listen.trim().is_empty() {
            return Err(ModelError::MissingField("listen").into());
        }
        if self.proxy_url.trim().is_empty() {
            return Err(ModelError::MissingField("proxy_url").into());
        }
        Ok(())
    }
}
