//! Well-known values shared by every queue backend and the HTTP surface.
use std::time::Duration;

/// How often the task id for a given module and version changes.
///
/// This is the width of the deduplication window on the distributed backend.
pub const TASK_ID_CHANGE_INTERVAL: Duration = Duration::from_secs(3 * 60 * 60);

/// Upper bound for a single task submission to the managed task service.
///
/// The service rejects deadlines longer than 30 seconds.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for a single in-process fetch execution.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default capacity of the in-process pending queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default number of concurrent in-process fetch executions.
pub const DEFAULT_WORKER_COUNT: usize = 10;

/// Largest accepted worker count or pending capacity of the in-process queue.
///
/// Matches the permit limit of tokio's semaphore, which backs both.
pub const MAX_POOL_SIZE: usize = usize::MAX >> 3;

/// Environment variable naming the backend service that receives pushed tasks.
pub const DEFAULT_SERVICE_ENV: &str = "GAE_SERVICE";

/// Route prefix of the push-delivery callback.
pub const FETCH_ROUTE_PREFIX: &str = "/fetch";

/// Route prefix of the enqueue endpoint.
pub const QUEUE_ROUTE_PREFIX: &str = "/queue";

/// Separator between module path and version in fetch routes.
pub const VERSION_SEPARATOR: &str = "/@v/";
