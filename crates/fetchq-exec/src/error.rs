use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid module proxy url: {0}")]
    InvalidProxyUrl(String),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}
