mod backend;
pub use backend::QueueBackend;

mod queue;
pub use queue::{GcpConfig, QueueConfig};
