use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request body pieces of a task-creation call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTaskRequest {
    /// Fully qualified queue name the task is created in.
    pub parent: String,
    pub task: Task,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Fully qualified task name; the service deduplicates on it.
    pub name: String,
    pub app_engine_http_request: AppEngineHttpRequest,
}

/// Push delivery to an app-engine style service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEngineHttpRequest {
    pub http_method: String,
    pub relative_uri: String,
    pub app_engine_routing: AppEngineRouting,
}

impl AppEngineHttpRequest {
    /// A `POST` to `relative_uri` on `service`.
    pub fn post(relative_uri: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            http_method: "POST".to_string(),
            relative_uri: relative_uri.into(),
            app_engine_routing: AppEngineRouting {
                service: service.into(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEngineRouting {
    /// Target service; empty routes to the default service.
    #[serde(default)]
    pub service: String,
}

#[derive(Debug, Error)]
pub enum TasksApiError {
    /// A task with the same name exists or existed recently.
    #[error("task already exists")]
    AlreadyExists,

    #[error("task service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client seam of the task service.
#[async_trait]
pub trait TasksApi: Send + Sync + 'static {
    async fn create_task(&self, req: &CreateTaskRequest) -> Result<(), TasksApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_serializes_in_wire_form() {
        let task = Task {
            name: "projects/p/locations/l/queues/q/tasks/abc".into(),
            app_engine_http_request: AppEngineHttpRequest::post(
                "/fetch/example.com/foo/@v/v1.0.0",
                "worker",
            ),
        };
        let v = serde_json::to_value(&task).unwrap();

        assert_eq!(v["name"], "projects/p/locations/l/queues/q/tasks/abc");
        assert_eq!(v["appEngineHttpRequest"]["httpMethod"], "POST");
        assert_eq!(
            v["appEngineHttpRequest"]["relativeUri"],
            "/fetch/example.com/foo/@v/v1.0.0"
        );
        assert_eq!(
            v["appEngineHttpRequest"]["appEngineRouting"]["service"],
            "worker"
        );
    }
}
