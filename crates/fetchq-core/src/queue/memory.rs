//! In-process queue backed by a bounded FIFO and a fixed pool of worker permits.
//!
//! Meant for local development and tests, where no managed task service is available.
//! Failed fetches are logged and never retried.
//!
//! Layout:
//! - `schedule_fetch` pushes onto a bounded channel (backpressure when full);
//! - a single dispatch loop pops requests in arrival order and acquires a permit for each;
//! - every request then runs in its own task, which releases the permit when it ends.
use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use fetchq_model::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT, FETCH_TIMEOUT, MAX_POOL_SIZE, ModuleVersion,
    QueueBackend, QueueConfig,
};
use tokio::{
    sync::{
        Semaphore,
        mpsc::{self, error::TrySendError},
    },
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use crate::{
    error::QueueError,
    fetch::{FetchDeps, ProcessorHandle, execute},
    metrics::{FetchOutcome, MetricsHandle, noop_metrics},
    queue::Queue,
};

/// Lifecycle of an [`InMemoryQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QueueState {
    /// Accepting and dispatching requests.
    Running = 0,
    /// Drain started; no new requests are accepted.
    Draining = 1,
    /// Drain finished; all permits are held and the dispatch loop has exited.
    Stopped = 2,
}

impl QueueState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => QueueState::Running,
            1 => QueueState::Draining,
            _ => QueueState::Stopped,
        }
    }
}

/// Builder for [`InMemoryQueue`].
pub struct InMemoryQueueBuilder {
    processor: ProcessorHandle,
    deps: FetchDeps,
    workers: usize,
    capacity: usize,
    fetch_timeout: Duration,
    metrics: MetricsHandle,
    span: Span,
}

impl InMemoryQueueBuilder {
    /// Number of concurrent executions.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Capacity of the pending FIFO.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Take worker count and capacity from a [`QueueConfig`].
    pub fn with_config(self, cfg: &QueueConfig) -> Self {
        self.with_workers(cfg.workers).with_capacity(cfg.capacity)
    }

    /// Time limit of a single execution.
    pub fn with_fetch_timeout(mut self, limit: Duration) -> Self {
        self.fetch_timeout = limit;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Span every log line of this queue (and of its executions) is recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Start the dispatch loop and return the running queue.
    ///
    /// `ctx` governs the dispatch loop and is the parent of every execution's token.
    /// Must be called from within a tokio runtime.
    pub fn start(self, ctx: CancellationToken) -> Result<InMemoryQueue, QueueError> {
        if self.workers == 0 {
            return Err(QueueError::Config("workers cannot be zero".into()));
        }
        if self.capacity == 0 {
            return Err(QueueError::Config("capacity cannot be zero".into()));
        }
        let limit = MAX_POOL_SIZE.min(Semaphore::MAX_PERMITS);
        if self.workers > limit {
            return Err(QueueError::Config(format!("workers cannot exceed {limit}")));
        }
        if self.capacity > limit {
            return Err(QueueError::Config(format!("capacity cannot exceed {limit}")));
        }

        let Self {
            processor,
            deps,
            workers,
            capacity,
            fetch_timeout,
            metrics,
            span,
        } = self;

        let (tx, rx) = mpsc::channel(capacity);
        let permits = Arc::new(Semaphore::new(workers));
        let closing = CancellationToken::new();
        let dispatched = CancellationToken::new();
        let worker = Arc::new(Worker {
            processor,
            deps,
            metrics: Arc::clone(&metrics),
            fetch_timeout,
            workers,
        });

        tokio::spawn(
            dispatch(
                rx,
                Arc::clone(&permits),
                ctx,
                closing.clone(),
                dispatched.clone(),
                worker,
                span.clone(),
            )
            .instrument(span.clone()),
        );
        info!(parent: &span, workers, capacity, "in-memory queue started");

        Ok(InMemoryQueue {
            sender: tx,
            closing,
            dispatched,
            permits,
            workers,
            capacity,
            state: AtomicU8::new(QueueState::Running as u8),
            metrics,
            span,
        })
    }
}

/// Bounded in-process worker pool implementing [`Queue`].
pub struct InMemoryQueue {
    sender: mpsc::Sender<ModuleVersion>,
    /// Cancelled once a drain starts; the dispatch loop then closes the FIFO.
    closing: CancellationToken,
    /// Cancelled by the dispatch loop when it exits.
    dispatched: CancellationToken,
    permits: Arc<Semaphore>,
    workers: usize,
    capacity: usize,
    state: AtomicU8,
    metrics: MetricsHandle,
    span: Span,
}

impl InMemoryQueue {
    /// Start building a queue that runs `processor` with `deps`.
    pub fn builder(processor: ProcessorHandle, deps: FetchDeps) -> InMemoryQueueBuilder {
        InMemoryQueueBuilder {
            processor,
            deps,
            workers: DEFAULT_WORKER_COUNT,
            capacity: DEFAULT_QUEUE_CAPACITY,
            fetch_timeout: FETCH_TIMEOUT,
            metrics: noop_metrics(),
            span: info_span!("fetch_queue", backend = QueueBackend::InMemory.as_str()),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> QueueState {
        QueueState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Permits not held by an execution (or by a finished drain).
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Requests waiting in the FIFO.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Wait until every scheduled fetch has finished, then stop the queue.
    ///
    /// Closes the FIFO, waits for the dispatch loop to hand out what is already queued,
    /// then acquires every worker permit. Holding all permits means no
    /// execution is still running. Cancelling `ctx` returns [`QueueError::Canceled`]
    /// and releases the permits taken so far; the call may be retried.
    ///
    /// Test-only teardown: do not call concurrently with `schedule_fetch`.
    pub async fn wait_for_testing(&self, ctx: &CancellationToken) -> Result<(), QueueError> {
        if self.state() == QueueState::Stopped {
            return Ok(());
        }
        self.state
            .store(QueueState::Draining as u8, Ordering::Release);
        debug!(parent: &self.span, "draining in-memory queue");

        self.closing.cancel();
        tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(QueueError::Canceled),
            _ = self.dispatched.cancelled() => {}
        }

        // `acquire_many` takes a u32, so large pools are drained in chunks.
        let mut held = Vec::new();
        let mut remaining = self.workers;
        while remaining > 0 {
            let chunk = u32::try_from(remaining).unwrap_or(u32::MAX);
            let permit = tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    debug!(
                        parent: &self.span,
                        acquired = self.workers - remaining,
                        "drain canceled while fetches are in flight"
                    );
                    return Err(QueueError::Canceled);
                }
                permit = self.permits.acquire_many(chunk) => permit.map_err(|_| QueueError::Closed)?,
            };
            held.push(permit);
            remaining -= chunk as usize;
        }
        held.into_iter().for_each(|p| p.forget());

        self.state
            .store(QueueState::Stopped as u8, Ordering::Release);
        info!(parent: &self.span, "in-memory queue drained");
        Ok(())
    }

    async fn enqueue(
        &self,
        ctx: &CancellationToken,
        target: ModuleVersion,
    ) -> Result<(), QueueError> {
        if self.closing.is_cancelled() {
            return Err(QueueError::Closed);
        }

        let tx = &self.sender;
        match tx.try_send(target) {
            Ok(()) => Ok(()),
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
            Err(TrySendError::Full(target)) => {
                debug!(parent: &self.span, pending = %target, "pending queue full, waiting");
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => Err(QueueError::Canceled),
                    res = tx.send(target) => res.map_err(|_| QueueError::Closed),
                }
            }
        }
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    fn backend(&self) -> QueueBackend {
        QueueBackend::InMemory
    }

    /// Push a fetch onto the local FIFO. `suffix` is ignored: nothing is deduplicated here.
    async fn schedule_fetch(
        &self,
        ctx: &CancellationToken,
        module_path: &str,
        version: &str,
        _suffix: &str,
    ) -> Result<(), QueueError> {
        let backend = self.backend();
        match self.enqueue(ctx, ModuleVersion::new(module_path, version)).await {
            Ok(()) => {
                self.metrics.record_fetch_scheduled(backend.as_str());
                Ok(())
            }
            Err(e) => {
                self.metrics
                    .record_schedule_error(backend.as_str(), e.kind());
                Err(e)
            }
        }
    }
}

/// Shared state of the execution units.
struct Worker {
    processor: ProcessorHandle,
    deps: FetchDeps,
    metrics: MetricsHandle,
    fetch_timeout: Duration,
    workers: usize,
}

impl Worker {
    async fn run(&self, ctx: &CancellationToken, target: ModuleVersion) {
        info!(
            module = %target.module_path,
            version = %target.version,
            workers = self.workers,
            processor = self.processor.name(),
            "fetch requested"
        );
        let started = Instant::now();
        let res = execute(
            self.processor.as_ref(),
            ctx,
            &target,
            &self.deps,
            self.fetch_timeout,
        )
        .await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.metrics
            .record_fetch_completed(FetchOutcome::of(&res), elapsed_ms);

        match res {
            Ok(status) => debug!(
                module = %target.module_path,
                version = %target.version,
                status,
                elapsed_ms,
                "fetch finished"
            ),
            Err(e) => error!(
                module = %target.module_path,
                version = %target.version,
                status = e.status(),
                error = %e,
                "fetch failed"
            ),
        }
    }
}

/// Single coordinating task: pops requests in order and gates each behind a permit.
///
/// Once `closing` fires the FIFO stops accepting requests; what is already queued is
/// still handed out before the loop exits. `dispatched` is cancelled on every exit path.
async fn dispatch(
    mut rx: mpsc::Receiver<ModuleVersion>,
    permits: Arc<Semaphore>,
    ctx: CancellationToken,
    closing: CancellationToken,
    dispatched: CancellationToken,
    worker: Arc<Worker>,
    span: Span,
) {
    let _done = dispatched.drop_guard();
    let mut closed = false;
    loop {
        let target = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!("dispatch loop canceled");
                return;
            }
            _ = closing.cancelled(), if !closed => {
                rx.close();
                closed = true;
                continue;
            }
            next = rx.recv() => match next {
                Some(target) => target,
                None => {
                    debug!("pending queue closed, dispatch loop exiting");
                    return;
                }
            },
        };

        let permit = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!(pending = %target, "dispatch loop canceled while waiting for a worker");
                return;
            }
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("worker pool closed, dispatch loop exiting");
                    return;
                }
            },
        };

        let worker = Arc::clone(&worker);
        let ctx = ctx.clone();
        tokio::spawn(
            async move {
                let _permit = permit;
                worker.run(&ctx, target).await;
            }
            .instrument(span.clone()),
        );
    }
}
