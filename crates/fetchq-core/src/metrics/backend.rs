use std::sync::Arc;

use crate::fetch::FetchError;

/// Fetch execution outcome for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Processor returned a status.
    Success,
    /// Processor failed.
    Failure,
    /// Execution canceled.
    Canceled,
    /// Execution exceeded its time limit.
    Timeout,
}

impl FetchOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchOutcome::Success => "success",
            FetchOutcome::Failure => "failure",
            FetchOutcome::Canceled => "canceled",
            FetchOutcome::Timeout => "timeout",
        }
    }

    /// Classify a processing result.
    pub fn of<T>(res: &Result<T, FetchError>) -> Self {
        match res {
            Ok(_) => FetchOutcome::Success,
            Err(FetchError::Timeout(_)) => FetchOutcome::Timeout,
            Err(FetchError::Canceled) => FetchOutcome::Canceled,
            Err(_) => FetchOutcome::Failure,
        }
    }
}

/// Backend metrics collection interface.
///
/// Implementations are injected into the queues and the HTTP layer.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a fetch accepted by a queue backend.
    ///
    /// # Arguments
    /// - `backend`: Queue backend label (`in_memory`, `gcp`)
    fn record_fetch_scheduled(&self, backend: &str);
    /// Record a submission the task service rejected as a duplicate.
    ///
    /// Duplicates count as scheduled; this is tracked separately to observe dedup hits.
    fn record_duplicate_ignored(&self, backend: &str);
    /// Record a scheduling failure surfaced to the caller.
    ///
    /// # Arguments
    /// - `backend`: Queue backend label
    /// - `error_kind`: Error category
    fn record_schedule_error(&self, backend: &str, error_kind: &str);
    /// Record fetch completion with outcome and duration.
    fn record_fetch_completed(&self, outcome: FetchOutcome, duration_ms: u64);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
