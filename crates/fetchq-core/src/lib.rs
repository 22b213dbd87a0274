pub mod error;
pub mod fetch;
pub mod metrics;
pub mod queue;
pub mod task_id;

pub use error::QueueError;
pub use fetch::{
    FetchDeps, FetchError, ModuleProxy, ModuleStore, Processor, ProcessorHandle, ProxyHandle,
    StoreHandle, execute,
};
pub use metrics::{FetchOutcome, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};
pub use queue::{InMemoryQueue, InMemoryQueueBuilder, Queue, QueueHandle, QueueState};
pub use task_id::{TimeBucket, derive_task_id};

pub mod prelude {
    pub use crate::error::QueueError;
    pub use crate::fetch::{FetchDeps, Processor};
    pub use crate::queue::{InMemoryQueue, Queue};
    pub use tokio_util::sync::CancellationToken;
}
