use std::time::Duration;

use thiserror::Error;

use fetchq_model::ModelError;

/// Boxed source of a failed remote call.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("{call} failed: {source}")]
    Submit {
        call: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("task submission timed out after {0:?}")]
    SubmitTimeout(Duration),

    #[error("scheduling canceled")]
    Canceled,

    #[error("queue is closed")]
    Closed,

    #[error("invalid queue configuration: {0}")]
    Config(String),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl QueueError {
    /// Low-cardinality label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            QueueError::Submit { .. } => "submit",
            QueueError::SubmitTimeout(_) => "submit_timeout",
            QueueError::Canceled => "canceled",
            QueueError::Closed => "closed",
            QueueError::Config(_) => "config",
            QueueError::Model(_) => "model",
        }
    }
}
