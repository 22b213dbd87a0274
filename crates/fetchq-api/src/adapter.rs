use std::time::{Duration, Instant};

use async_trait::async_trait;
use fetchq_core::{
    FetchDeps, FetchOutcome, MetricsHandle, ProcessorHandle, QueueHandle, execute, noop_metrics,
};
use fetchq_model::{FETCH_TIMEOUT, FetchRequest, ModuleVersion};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{error::ApiError, handler::FetchHandler};

/// [`FetchHandler`] delegating to a queue and a processor.
pub struct QueueAdapter {
    queue: QueueHandle,
    processor: ProcessorHandle,
    deps: FetchDeps,
    fetch_timeout: Duration,
    metrics: MetricsHandle,
    shutdown: CancellationToken,
}

impl QueueAdapter {
    /// `shutdown` is the parent token of every fetch and scheduling call.
    pub fn new(
        queue: QueueHandle,
        processor: ProcessorHandle,
        deps: FetchDeps,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            queue,
            processor,
            deps,
            fetch_timeout: FETCH_TIMEOUT,
            metrics: noop_metrics(),
            shutdown,
        }
    }

    pub fn with_fetch_timeout(mut self, limit: Duration) -> Self {
        self.fetch_timeout = limit;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }
}

#[async_trait]
impl FetchHandler for QueueAdapter {
    #[instrument(level = "info", skip_all, fields(target = %target))]
    async fn fetch(&self, target: ModuleVersion) -> Result<u16, ApiError> {
        let started = Instant::now();
        let res = execute(
            self.processor.as_ref(),
            &self.shutdown,
            &target,
            &self.deps,
            self.fetch_timeout,
        )
        .await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.metrics
            .record_fetch_completed(FetchOutcome::of(&res), elapsed_ms);

        match res {
            Ok(status) => {
                info!(status, elapsed_ms, "fetch delivered");
                Ok(status)
            }
            Err(e) => {
                warn!(status = e.status(), error = %e, "fetch delivery failed");
                Err(e.into())
            }
        }
    }

    async fn enqueue(&self, req: FetchRequest) -> Result<(), ApiError> {
        let ctx = self.shutdown.child_token();
        self.queue.schedule(&ctx, &req).await?;
        Ok(())
    }
}
