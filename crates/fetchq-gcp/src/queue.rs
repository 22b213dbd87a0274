use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use fetchq_core::{MetricsHandle, Queue, QueueError, derive_task_id, noop_metrics};
use fetchq_model::{GcpConfig, ModuleVersion, QueueBackend, QueueEndpoint, SUBMIT_TIMEOUT};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{Span, info, info_span, warn};

use crate::{
    api::{AppEngineHttpRequest, CreateTaskRequest, Task, TasksApi, TasksApiError},
    http::HttpTasksApi,
};

/// Where the push-delivery target service name comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceName {
    /// Read from this environment variable on every submission; unset means empty.
    Env(String),
    Fixed(String),
}

impl ServiceName {
    fn resolve(&self) -> String {
        match self {
            ServiceName::Env(var) => std::env::var(var).unwrap_or_default(),
            ServiceName::Fixed(name) => name.clone(),
        }
    }
}

enum Submitted {
    Created,
    Duplicate,
}

/// Queue backend submitting one task per fetch to the managed task service.
///
/// Task names are derived from the module, the version and a coarse time bucket,
/// so identical requests inside one bucket collapse into a single task.
pub struct GcpQueue<A = HttpTasksApi> {
    api: Arc<A>,
    endpoint: QueueEndpoint,
    service: ServiceName,
    submit_timeout: Duration,
    clock: fn() -> OffsetDateTime,
    metrics: MetricsHandle,
    span: Span,
}

impl GcpQueue<HttpTasksApi> {
    /// Build a queue talking REST to the endpoint described by `cfg`.
    pub fn from_config(cfg: &GcpConfig) -> Result<Self, QueueError> {
        cfg.validate()?;
        Ok(GcpQueue::new(cfg.endpoint.clone(), HttpTasksApi::from_config(cfg))
            .with_service(ServiceName::Env(cfg.service_env.clone())))
    }
}

impl<A: TasksApi> GcpQueue<A> {
    pub fn new(endpoint: QueueEndpoint, api: A) -> Self {
        Self {
            api: Arc::new(api),
            endpoint,
            service: ServiceName::Env(fetchq_model::DEFAULT_SERVICE_ENV.to_string()),
            submit_timeout: SUBMIT_TIMEOUT,
            clock: OffsetDateTime::now_utc,
            metrics: noop_metrics(),
            span: info_span!("fetch_queue", backend = QueueBackend::Gcp.as_str()),
        }
    }

    pub fn with_service(mut self, service: ServiceName) -> Self {
        self.service = service;
        self
    }

    /// Upper bound on one task-creation call.
    pub fn with_submit_timeout(mut self, limit: Duration) -> Self {
        self.submit_timeout = limit;
        self
    }

    /// Source of the current time used to derive task ids.
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn endpoint(&self) -> &QueueEndpoint {
        &self.endpoint
    }

    fn task_request(
        &self,
        module_path: &str,
        version: &str,
        suffix: &str,
    ) -> CreateTaskRequest {
        let task_id = derive_task_id(module_path, version, (self.clock)());
        let route = ModuleVersion::new(module_path, version).fetch_route();
        CreateTaskRequest {
            parent: self.endpoint.queue_name(),
            task: Task {
                name: self.endpoint.task_name(&task_id, suffix),
                app_engine_http_request: AppEngineHttpRequest::post(
                    route,
                    self.service.resolve(),
                ),
            },
        }
    }

    async fn submit(
        &self,
        ctx: &CancellationToken,
        module_path: &str,
        version: &str,
        suffix: &str,
    ) -> Result<Submitted, QueueError> {
        let req = self.task_request(module_path, version, suffix);
        let limit = self.submit_timeout;

        let res = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(QueueError::Canceled),
            res = tokio::time::timeout(limit, self.api.create_task(&req)) => {
                res.map_err(|_| QueueError::SubmitTimeout(limit))?
            }
        };

        match res {
            Ok(()) => {
                info!(
                    parent: &self.span,
                    module = module_path,
                    version,
                    task = %req.task.name,
                    "scheduled fetch task"
                );
                Ok(Submitted::Created)
            }
            Err(TasksApiError::AlreadyExists) => {
                info!(
                    parent: &self.span,
                    module = module_path,
                    version,
                    task = %req.task.name,
                    "ignoring duplicate task ID"
                );
                Ok(Submitted::Duplicate)
            }
            Err(e) => {
                warn!(
                    parent: &self.span,
                    module = module_path,
                    version,
                    error = %e,
                    "task creation failed"
                );
                Err(QueueError::Submit {
                    call: "create_task",
                    source: Box::new(e),
                })
            }
        }
    }
}

#[async_trait]
impl<A: TasksApi> Queue for GcpQueue<A> {
    fn backend(&self) -> QueueBackend {
        QueueBackend::Gcp
    }

    async fn schedule_fetch(
        &self,
        ctx: &CancellationToken,
        module_path: &str,
        version: &str,
        suffix: &str,
    ) -> Result<(), QueueError> {
        let backend = self.backend();
        match self.submit(ctx, module_path, version, suffix).await {
            Ok(Submitted::Created) => {
                self.metrics.record_fetch_scheduled(backend.as_str());
                Ok(())
            }
            Ok(Submitted::Duplicate) => {
                self.metrics.record_duplicate_ignored(backend.as_str());
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

#[cfg(test)]
mod tests {
    use super::*;
    use fetchq_core::{FetchOutcome, MetricsBackend};
    use std::{
        collections::HashSet,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    /// Task service double that remembers task names like the real one.
    #[derive(Default)]
    struct FakeTasks {
        names: Mutex<HashSet<String>>,
        created: Mutex<Vec<CreateTaskRequest>>,
        calls: AtomicUsize,
        hang: bool,
        reject: Option<u16>,
    }

    #[async_trait]
    impl TasksApi for FakeTasks {
        async fn create_task(&self, req: &CreateTaskRequest) -> Result<(), TasksApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            if let Some(status) = self.reject {
                return Err(TasksApiError::Status {
                    status,
                    message: "denied".into(),
                });
            }
            if !self.names.lock().unwrap().insert(req.task.name.clone()) {
                return Err(TasksApiError::AlreadyExists);
            }
            self.created.lock().unwrap().push(req.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Counters {
        scheduled: AtomicUsize,
        duplicates: AtomicUsize,
        errors: Mutex<Vec<String>>,
    }

    impl MetricsBackend for Counters {
        fn record_fetch_scheduled(&self, backend: &str) {
            assert_eq!(backend, "gcp");
            self.scheduled.fetch_add(1, Ordering::SeqCst);
        }

        fn record_duplicate_ignored(&self, _: &str) {
            self.duplicates.fetch_add(1, Ordering::SeqCst);
        }

        fn record_schedule_error(&self, _: &str, kind: &str) {
            self.errors.lock().unwrap().push(kind.to_string());
        }

        fn record_fetch_completed(&self, _: FetchOutcome, _: u64) {}
    }

    // 2024-05-01T13:47:12Z
    fn fixed_now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_714_571_232).unwrap()
    }

    fn endpoint() -> QueueEndpoint {
        QueueEndpoint::new("proj", "us-central1", "fetch")
    }

    fn queue(api: FakeTasks) -> (GcpQueue<FakeTasks>, Arc<Counters>) {
        let metrics = Arc::new(Counters::default());
        let q = GcpQueue::new(endpoint(), api)
            .with_service(ServiceName::Fixed("worker".into()))
            .with_clock(fixed_now)
            .with_metrics(metrics.clone());
        (q, metrics)
    }

    #[tokio::test]
    async fn creates_task_with_derived_name_and_route() {
        let (q, metrics) = queue(FakeTasks::default());
        let ctx = CancellationToken::new();

        q.schedule_fetch(&ctx, "example.com/foo", "v1.0.0", "")
            .await
            .unwrap();

        let created = q.api.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        let req = &created[0];
        let id = derive_task_id("example.com/foo", "v1.0.0", fixed_now());

        assert_eq!(req.parent, "projects/proj/locations/us-central1/queues/fetch");
        assert_eq!(
            req.task.name,
            format!("projects/proj/locations/us-central1/queues/fetch/tasks/{id}")
        );
        assert_eq!(req.task.app_engine_http_request.http_method, "POST");
        assert_eq!(
            req.task.app_engine_http_request.relative_uri,
            "/fetch/example.com/foo/@v/v1.0.0"
        );
        assert_eq!(
            req.task.app_engine_http_request.app_engine_routing.service,
            "worker"
        );
        assert_eq!(metrics.scheduled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_in_same_bucket_is_success() {
        let (q, metrics) = queue(FakeTasks::default());
        let ctx = CancellationToken::new();

        q.schedule_fetch(&ctx, "example.com/foo", "v1.0.0", "")
            .await
            .unwrap();
        q.schedule_fetch(&ctx, "example.com/foo", "v1.0.0", "")
            .await
            .unwrap();

        assert_eq!(q.api.calls.load(Ordering::SeqCst), 2);
        assert_eq!(q.api.created.lock().unwrap().len(), 1);
        assert_eq!(metrics.scheduled.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.duplicates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn suffix_forces_a_new_task() {
        let (q, _) = queue(FakeTasks::default());
        let ctx = CancellationToken::new();

        q.schedule_fetch(&ctx, "example.com/foo", "v1.0.0", "")
            .await
            .unwrap();
        q.schedule_fetch(&ctx, "example.com/foo", "v1.0.0", "retry1")
            .await
            .unwrap();

        let created = q.api.created.lock().unwrap();
        assert_eq!(created.len(), 2);
        assert!(created[1].task.name.ends_with("-retry1"));
        assert_eq!(
            created[1].task.name.trim_end_matches("-retry1"),
            created[0].task.name
        );
    }

    #[tokio::test]
    async fn repeated_suffix_in_same_bucket_is_deduplicated() {
        let (q, metrics) = queue(FakeTasks::default());
        let ctx = CancellationToken::new();

        for _ in 0..2 {
            q.schedule_fetch(&ctx, "example.com/foo", "v1.0.0", "retry1")
                .await
                .unwrap();
        }

        assert_eq!(q.api.calls.load(Ordering::SeqCst), 2);
        let created = q.api.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert!(created[0].task.name.ends_with("-retry1"));
        assert_eq!(metrics.scheduled.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.duplicates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn service_errors_surface_as_submit_failures() {
        let (q, metrics) = queue(FakeTasks {
            reject: Some(403),
            ..Default::default()
        });

        let err = q
            .schedule_fetch(&CancellationToken::new(), "example.com/foo", "v1.0.0", "")
            .await
            .unwrap_err();

        assert!(matches!(err, QueueError::Submit { call: "create_task", .. }));
        assert!(err.to_string().contains("403"));
        assert_eq!(*metrics.errors.lock().unwrap(), vec!["submit".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_service_times_out_after_submit_limit() {
        let (q, metrics) = queue(FakeTasks {
            hang: true,
            ..Default::default()
        });
        let started = tokio::time::Instant::now();

        let err = q
            .schedule_fetch(&CancellationToken::new(), "example.com/foo", "v1.0.0", "")
            .await
            .unwrap_err();

        assert!(matches!(err, QueueError::SubmitTimeout(d) if d == SUBMIT_TIMEOUT));
        assert!(started.elapsed() >= SUBMIT_TIMEOUT);
        assert_eq!(
            *metrics.errors.lock().unwrap(),
            vec!["submit_timeout".to_string()]
        );
    }

    #[tokio::test]
    async fn canceled_context_aborts_submission() {
        let (q, _) = queue(FakeTasks {
            hang: true,
            ..Default::default()
        });
        let ctx = CancellationToken::new();
        ctx.cancel();

        let err = q
            .schedule_fetch(&ctx, "example.com/foo", "v1.0.0", "")
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Canceled));
    }

    #[tokio::test]
    async fn unset_service_variable_routes_to_default_service() {
        let (q, _) = queue(FakeTasks::default());
        let q = q.with_service(ServiceName::Env("FETCHQ_TEST_SERVICE_THAT_IS_NEVER_SET".into()));

        q.schedule_fetch(&CancellationToken::new(), "example.com/foo", "v1.0.0", "")
            .await
            .unwrap();

        let created = q.api.created.lock().unwrap();
        assert_eq!(
            created[0].task.app_engine_http_request.app_engine_routing.service,
            ""
        );
    }

    #[test]
    fn from_config_rejects_blank_endpoint() {
        let cfg = GcpConfig::new(QueueEndpoint::new("", "l", "q"));
        assert!(matches!(
            GcpQueue::from_config(&cfg),
            Err(QueueError::Model(_))
        ));
    }
}
