use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use fetchq_core::{FetchOutcome, MetricsBackend};

const NAMESPACE: &str = "fetchq";

/// Prometheus implementation of [`MetricsBackend`].
///
/// Label values are bounded:
/// - `backend`: "in_memory", "gcp"
/// - `outcome`: "success", "failure", "canceled", "timeout"
/// - `error_kind`: [`fetchq_core::QueueError::kind`] values
#[derive(Clone)]
pub struct PrometheusMetrics {
    scheduled: CounterVec,
    duplicates: CounterVec,
    schedule_errors: CounterVec,
    completed: CounterVec,
    duration: Histogram,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register the fetch metrics on `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let scheduled = CounterVec::new(
            Opts::new("fetches_scheduled_total", "Fetches accepted by a queue backend")
                .namespace(NAMESPACE),
            &["backend"],
        )?;
        registry.register(Box::new(scheduled.clone()))?;

        let duplicates = CounterVec::new(
            Opts::new(
                "duplicates_ignored_total",
                "Submissions rejected by the task service as duplicates",
            )
            .namespace(NAMESPACE),
            &["backend"],
        )?;
        registry.register(Box::new(duplicates.clone()))?;

        let schedule_errors = CounterVec::new(
            Opts::new("schedule_errors_total", "Scheduling calls that failed")
                .namespace(NAMESPACE),
            &["backend", "error_kind"],
        )?;
        registry.register(Box::new(schedule_errors.clone()))?;

        let completed = CounterVec::new(
            Opts::new("fetches_completed_total", "Fetch executions that finished")
                .namespace(NAMESPACE),
            &["outcome"],
        )?;
        registry.register(Box::new(completed.clone()))?;

        let duration = Histogram::with_opts(
            HistogramOpts::new("fetch_duration_seconds", "Fetch execution time in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        )?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            scheduled,
            duplicates,
            schedule_errors,
            completed,
            duration,
            registry,
        })
    }

    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render every registered metric in the text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_fetch_scheduled(&self, backend: &str) {
        self.scheduled.with_label_values(&[backend]).inc();
    }

    fn record_duplicate_ignored(&self, backend: &str) {
        self.duplicates.with_label_values(&[backend]).inc();
    }

    fn record_schedule_error(&self, backend: &str, error_kind: &str) {
        self.schedule_errors
            .with_label_values(&[backend, error_kind])
            .inc();
    }

    fn record_fetch_completed(&self, outcome: FetchOutcome, duration_ms: u64) {
        self.completed
            .with_label_values(&[outcome.as_label()])
            .inc();
        self.duration.observe(duration_ms as f64 / 1000.0);
    }
}
