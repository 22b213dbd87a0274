mod constants;
pub use constants::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SERVICE_ENV, DEFAULT_WORKER_COUNT, FETCH_ROUTE_PREFIX,
    FETCH_TIMEOUT, MAX_POOL_SIZE, QUEUE_ROUTE_PREFIX, SUBMIT_TIMEOUT, TASK_ID_CHANGE_INTERVAL,
    VERSION_SEPARATOR,
};

/// Module path as published by a module proxy (e.g. `example.com/foo`).
///
/// Opaque at this layer: it is neither validated nor normalized.
pub type ModulePath = String;

/// Module version (e.g. `v1.0.0`). Opaque, like [`ModulePath`].
pub type Version = String;

/// Caller-chosen suffix appended to a distributed task name.
///
/// An empty suffix keeps the task subject to time-bucket deduplication.
pub type Suffix = String;
