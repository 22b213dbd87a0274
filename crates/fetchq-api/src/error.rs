use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use fetchq_core::{FetchError, QueueError};
use fetchq_model::ModelError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("metrics unavailable: {0}")]
    Metrics(String),
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        ApiError::InvalidRequest(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(e) => {
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Queue(e) => match e {
                QueueError::Canceled | QueueError::Closed => StatusCode::SERVICE_UNAVAILABLE,
                QueueError::SubmitTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                QueueError::Submit { .. } => StatusCode::BAD_GATEWAY,
                QueueError::Config(_) | QueueError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
