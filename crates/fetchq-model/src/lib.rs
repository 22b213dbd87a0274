mod domain;
pub use domain::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SERVICE_ENV, DEFAULT_WORKER_COUNT, FETCH_ROUTE_PREFIX,
    FETCH_TIMEOUT, MAX_POOL_SIZE, QUEUE_ROUTE_PREFIX, SUBMIT_TIMEOUT, TASK_ID_CHANGE_INTERVAL,
    VERSION_SEPARATOR,
};
pub use domain::{ModulePath, Suffix, Version};

mod error;
pub use error::{ModelError, ModelResult};

mod request;
pub use request::{FetchRequest, ModuleVersion};

mod endpoint;
pub use endpoint::QueueEndpoint;

mod config;
pub use config::{GcpConfig, QueueBackend, QueueConfig};

mod info;
pub use info::VersionInfo;
