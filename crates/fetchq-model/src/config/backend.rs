use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Which scheduling backend the process runs with.
///
/// - `InMemory` — bounded in-process worker pool, for local development and tests.
/// - `Gcp`      — managed task service with push delivery and time-bucket deduplication.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    #[default]
    InMemory,
    Gcp,
}

impl QueueBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueBackend::InMemory => "in_memory",
            QueueBackend::Gcp => "gcp",
        }
    }
}

impl FromStr for QueueBackend {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "in-memory" | "inmemory" | "memory" | "" => Ok(QueueBackend::InMemory),
            "gcp" | "cloudtasks" | "cloud-tasks" => Ok(QueueBackend::Gcp),
            other => Err(ModelError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for QueueBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
