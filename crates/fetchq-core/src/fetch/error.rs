use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("module version not found: {0}")]
    NotFound(String),

    #[error("module proxy error: {0}")]
    Proxy(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("fetch canceled")]
    Canceled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// HTTP-like status code reported for this failure.
    pub fn status(&self) -> u16 {
        match self {
            FetchError::NotFound(_) => 404,
            FetchError::Proxy(_) => 502,
            FetchError::Timeout(_) => 504,
            FetchError::Canceled => 503,
            FetchError::Storage(_) | FetchError::Internal(_) => 500,
        }
    }
}
