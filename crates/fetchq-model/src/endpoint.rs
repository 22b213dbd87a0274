use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ModelError, ModelResult};

/// Location of a queue on the managed task service.
///
/// Configured once at construction and immutable for the process lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEndpoint {
    pub project_id: String,
    pub location_id: String,
    pub queue_id: String,
}

impl QueueEndpoint {
    pub fn new(
        project_id: impl Into<String>,
        location_id: impl Into<String>,
        queue_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location_id: location_id.into(),
            queue_id: queue_id.into(),
        }
    }

    /// Fully qualified queue name: `projects/{p}/locations/{l}/queues/{q}`.
    pub fn queue_name(&self) -> String {
        format!(
            "projects/{}/locations/{}/queues/{}",
            self.project_id, self.location_id, self.queue_id
        )
    }

    /// Fully qualified task name for the given task id.
    ///
    /// A non-empty suffix is appended verbatim after a `-`.
    pub fn task_name(&self, task_id: &str, suffix: &str) -> String {
        let mut name = format!("{}/tasks/{task_id}", self.queue_name());
        if !suffix.is_empty() {
            name.push('-');
            name.push_str(suffix);
        }
        name
    }

    /// Reject endpoints with blank components.
    pub fn validate(&self) -> ModelResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(ModelError::MissingField("project_id"));
        }
        if self.location_id.trim().is_empty() {
            return Err(ModelError::MissingField("location_id"));
        }
        if self.queue_id.trim().is_empty() {
            return Err(ModelError::MissingField("queue_id"));
        }
        Ok(())
    }
}

impl fmt::Display for QueueEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.queue_name())
    }
}
