use crate::metrics::backend::{FetchOutcome, MetricsBackend};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_fetch_scheduled(&self, _: &str) {}

    #[inline(always)]
    fn record_duplicate_ignored(&self, _: &str) {}

    #[inline(always)]
    fn record_schedule_error(&self, _: &str, _: &str) {}

    #[inline(always)]
    fn record_fetch_completed(&self, _: FetchOutcome, _: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpMetrics>(), 0);
    }
}
