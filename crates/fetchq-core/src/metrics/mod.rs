//! Metrics collection abstraction for fetch scheduling.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are injected into the queues.
mod backend;
pub use backend::{FetchOutcome, MetricsBackend, MetricsHandle};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
