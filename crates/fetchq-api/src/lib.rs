//! HTTP surface of the fetch queue.
//!
//! Routes:
//! - `POST /fetch/{module}/@v/{version}`: push-delivery target, runs the fetch inline
//! - `POST /queue/{module}/@v/{version}?suffix=`: schedules a fetch on the configured backend
//! - `GET /metrics`: Prometheus exposition, when a registry is attached
//! - `GET /healthz`
mod error;
pub use error::ApiError;

mod handler;
pub use handler::FetchHandler;

mod adapter;
pub use adapter::QueueAdapter;

mod http;
pub use http::HttpApi;
