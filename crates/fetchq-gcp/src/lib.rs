//! Distributed queue backend on a managed cloud task service.
//!
//! Each scheduled fetch becomes one task whose push delivery posts to
//! `/fetch/{module}/@v/{version}` on the configured service.
mod api;
pub use api::{AppEngineHttpRequest, AppEngineRouting, CreateTaskRequest, Task, TasksApi, TasksApiError};

mod http;
pub use http::HttpTasksApi;

mod queue;
pub use queue::{GcpQueue, ServiceName};
