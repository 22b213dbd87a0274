use async_trait::async_trait;
use fetchq_model::GcpConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{trace, warn};

use crate::api::{CreateTaskRequest, Task, TasksApi, TasksApiError};

/// REST client of the task service (`POST {base}/v2/{parent}/tasks`).
#[derive(Clone, Debug)]
pub struct HttpTasksApi {
    client: reqwest::Client,
    base: String,
    bearer_token: Option<String>,
}

impl HttpTasksApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
            bearer_token: None,
        }
    }

    pub fn from_config(cfg: &GcpConfig) -> Self {
        let api = Self::new(cfg.api_base.clone());
        match &cfg.bearer_token {
            Some(token) => api.with_bearer_token(token.clone()),
            None => api,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn create_url(&self, parent: &str) -> String {
        format!("{}/v2/{parent}/tasks", self.base.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct CreateTaskBody<'a> {
    task: &'a Task,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorStatus,
}

#[derive(Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// Map a non-success response onto [`TasksApiError`].
fn classify(status: StatusCode, body: &str) -> TasksApiError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let already_exists = status == StatusCode::CONFLICT
        || parsed
            .as_ref()
            .is_some_and(|b| b.error.status == "ALREADY_EXISTS");
    if already_exists {
        return TasksApiError::AlreadyExists;
    }

    let message = match parsed {
        Some(b) if !b.error.message.is_empty() => b.error.message,
        _ => body.trim().to_string(),
    };
    TasksApiError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Like [`classify`], for a response whose body could not be read.
fn classify_unreadable(status: StatusCode, err: impl Display) -> TasksApiError {
    if status == StatusCode::CONFLICT {
        return TasksApiError::AlreadyExists;
    }
    TasksApiError::Status {
        status: status.as_u16(),
        message: format!("read body: {err}"),
    }
}

#[async_trait]
impl TasksApi for HttpTasksApi {
    async fn create_task(&self, req: &CreateTaskRequest) -> Result<(), TasksApiError> {
        let url = self.create_url(&req.parent);
        trace!(%url, task = %req.task.name, "creating task");

        let mut call = self
            .client
            .post(url)
            .json(&CreateTaskBody { task: &req.task });
        if let Some(token) = &self.bearer_token {
            call = call.bearer_auth(token);
        }

        let resp = call.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        match resp.text().await {
            Ok(body) => Err(classify(status, &body)),
            Err(e) => {
                warn!(status = status.as_u16(), error = %e, "failed to read error response body");
                Err(classify_unreadable(status, e))
            }
        }
    }
}
