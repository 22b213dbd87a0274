use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown queue backend: {0}")]
    UnknownBackend(String),

    #[error("invalid fetch route: {0}")]
    InvalidRoute(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
