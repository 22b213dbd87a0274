use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SERVICE_ENV, DEFAULT_WORKER_COUNT, MAX_POOL_SIZE, ModelError,
    ModelResult, QueueEndpoint, config::QueueBackend,
};

/// Default REST base URL of the managed task service.
const DEFAULT_API_BASE: &str = "https://cloudtasks.googleapis.com";

/// Scheduling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Backend selected at startup.
    pub backend: QueueBackend,
    /// Number of concurrent in-process executions.
    pub workers: usize,
    /// Capacity of the in-process pending queue.
    pub capacity: usize,
    /// Managed task service settings; required when `backend = gcp`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpConfig>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            workers: DEFAULT_WORKER_COUNT,
            capacity: DEFAULT_QUEUE_CAPACITY,
            gcp: None,
        }
    }
}

impl QueueConfig {
    /// Check the settings the selected backend depends on.
    pub fn validate(&self) -> ModelResult<()> {
        match self.backend {
            QueueBackend::InMemory => {
                if self.workers == 0 {
                    return Err(ModelError::Invalid("workers cannot be zero".into()));
                }
                if self.capacity == 0 {
                    return Err(ModelError::Invalid("capacity cannot be zero".into()));
                }
                if self.workers > MAX_POOL_SIZE {
                    return Err(ModelError::Invalid(format!(
                        "workers cannot exceed {MAX_POOL_SIZE}"
                    )));
                }
                if self.capacity > MAX_POOL_SIZE {
                    return Err(ModelError::Invalid(format!(
                        "capacity cannot exceed {MAX_POOL_SIZE}"
                    )));
                }
                Ok(())
            }
            QueueBackend::Gcp => self
                .gcp
                .as_ref()
                .ok_or(ModelError::MissingField("gcp"))?
                .validate(),
        }
    }
}

/// Managed task service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpConfig {
    #[serde(flatten)]
    pub endpoint: QueueEndpoint,
    /// Environment variable holding the target service name, read at submission time.
    #[serde(default = "default_service_env")]
    pub service_env: String,
    /// REST base URL of the task service.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Static OAuth bearer token; omitted when the transport authenticates by other means.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl GcpConfig {
    pub fn new(endpoint: QueueEndpoint) -> Self {
        Self {
            endpoint,
            service_env: default_service_env(),
            api_base: default_api_base(),
            bearer_token: None,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.endpoint.validate()?;
        if self.service_env.trim().is_empty() {
            return Err(ModelError::MissingField("service_env"));
        }
        if self.api_base.trim().is_empty() {
            return Err(ModelError::MissingField("api_base"));
        }
        Ok(())
    }
}

fn default_service_env() -> String {
    DEFAULT_SERVICE_ENV.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
