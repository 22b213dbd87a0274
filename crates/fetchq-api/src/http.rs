use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use fetchq_model::{FETCH_ROUTE_PREFIX, FetchRequest, ModuleVersion, QUEUE_ROUTE_PREFIX};
use fetchq_prometheus::PrometheusMetrics;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, handler::FetchHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
    metrics: Option<Arc<PrometheusMetrics>>,
}

impl<H> HttpApi<H>
where
    H: FetchHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            metrics: None,
        }
    }

    /// Expose `metrics` on `GET /metrics`.
    pub fn with_metrics(mut self, metrics: Arc<PrometheusMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn router(self) -> Router {
        let mut router = Router::new()
            .route(&format!("{FETCH_ROUTE_PREFIX}/{{*path}}"), post(fetch::<H>))
            .route(&format!("{QUEUE_ROUTE_PREFIX}/{{*path}}"), post(enqueue::<H>))
            .with_state(self.handler)
            .route("/healthz", get(|| async { "ok" }));

        if let Some(metrics) = self.metrics {
            router = router.merge(
                Router::new()
                    .route("/metrics", get(render_metrics))
                    .with_state(metrics),
            );
        }
        router
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FetchResponse {
    module: String,
    version: String,
    status: u16,
}

#[derive(Debug, Default, Deserialize)]
struct EnqueueQuery {
    #[serde(default)]
    suffix: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnqueueResponse {
    module: String,
    version: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    suffix: String,
}

/// POST /fetch/{module}/@v/{version}
async fn fetch<H>(
    State(handler): State<Arc<H>>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: FetchHandler,
{
    let target = ModuleVersion::from_route_path(&path)?;
    let status = handler.fetch(target.clone()).await?;
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);

    Ok((
        code,
        Json(FetchResponse {
            module: target.module_path,
            version: target.version,
            status,
        }),
    ))
}

/// POST /queue/{module}/@v/{version}?suffix=
async fn enqueue<H>(
    State(handler): State<Arc<H>>,
    Path(path): Path<String>,
    Query(query): Query<EnqueueQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    H: FetchHandler,
{
    let target = ModuleVersion::from_route_path(&path)?;
    let req = FetchRequest::new(target.module_path, target.version).with_suffix(query.suffix);

    handler.enqueue(req.clone()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueResponse {
            module: req.target.module_path,
            version: req.target.version,
            suffix: req.suffix,
        }),
    ))
}

/// GET /metrics
async fn render_metrics(
    State(metrics): State<Arc<PrometheusMetrics>>,
) -> Result<impl IntoResponse, ApiError> {
    let body = metrics
        .encode_text()
        .map_err(|e| ApiError::Metrics(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueueAdapter;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use fetchq_core::{
        FetchDeps, FetchError, InMemoryQueue, MetricsBackend, Processor, QueueError,
    };
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    #[derive(Default)]
    struct Recording {
        fetched: Mutex<Vec<ModuleVersion>>,
        enqueued: Mutex<Vec<FetchRequest>>,
        fail_with: Option<u16>,
    }

    #[async_trait]
    impl FetchHandler for Recording {
        async fn fetch(&self, target: ModuleVersion) -> Result<u16, ApiError> {
            self.fetched.lock().unwrap().push(target.clone());
            match self.fail_with {
                Some(404) => Err(FetchError::NotFound(target.to_string()).into()),
                Some(_) => Err(QueueError::Closed.into()),
                None => Ok(200),
            }
        }

        async fn enqueue(&self, req: FetchRequest) -> Result<(), ApiError> {
            if self.fail_with.is_some() {
                return Err(QueueError::Closed.into());
            }
            self.enqueued.lock().unwrap().push(req);
            Ok(())
        }
    }

    fn post(uri: &str) -> Request<Body> {
        Request::post(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn fetch_route_parses_nested_module_path() {
        let handler = Arc::new(Recording::default());
        let app = HttpApi::new(handler.clone()).router();

        let resp = app
            .oneshot(post("/fetch/github.com/foo/bar/@v/v1.2.3"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["module"], "github.com/foo/bar");
        assert_eq!(body["version"], "v1.2.3");
        assert_eq!(
            *handler.fetched.lock().unwrap(),
            vec![ModuleVersion::new("github.com/foo/bar", "v1.2.3")]
        );
    }

    #[tokio::test]
    async fn fetch_failure_uses_error_status() {
        let handler = Arc::new(Recording {
            fail_with: Some(404),
            ..Default::default()
        });
        let resp = HttpApi::new(handler)
            .router()
            .oneshot(post("/fetch/example.com/gone/@v/v0.0.1"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("example.com/gone"));
    }

    #[tokio::test]
    async fn malformed_route_is_bad_request() {
        let handler = Arc::new(Recording::default());
        let resp = HttpApi::new(handler.clone())
            .router()
            .oneshot(post("/fetch/example.com/foo"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(handler.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn queue_route_accepts_with_suffix() {
        let handler = Arc::new(Recording::default());
        let resp = HttpApi::new(handler.clone())
            .router()
            .oneshot(post("/queue/example.com/foo/@v/v1.0.0?suffix=retry1"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(
            *handler.enqueued.lock().unwrap(),
            vec![FetchRequest::new("example.com/foo", "v1.0.0").with_suffix("retry1")]
        );
    }

    #[tokio::test]
    async fn closed_queue_is_service_unavailable() {
        let handler = Arc::new(Recording {
            fail_with: Some(503),
            ..Default::default()
        });
        let resp = HttpApi::new(handler)
            .router()
            .oneshot(post("/queue/example.com/foo/@v/v1.0.0"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn metrics_route_renders_registry() {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        metrics.record_fetch_scheduled("in_memory");

        let resp = HttpApi::new(Arc::new(Recording::default()))
            .with_metrics(metrics)
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains(r#"fetchq_fetches_scheduled_total{backend="in_memory"} 1"#));
    }

    #[tokio::test]
    async fn metrics_route_is_absent_without_registry() {
        let resp = HttpApi::new(Arc::new(Recording::default()))
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    struct Echo;

    #[async_trait]
    impl Processor for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn process(
            &self,
            _ctx: CancellationToken,
            module_path: &str,
            _version: &str,
            _deps: &FetchDeps,
        ) -> Result<u16, FetchError> {
            if module_path.ends_with("/missing") {
                Err(FetchError::NotFound(module_path.to_string()))
            } else {
                Ok(201)
            }
        }
    }

    #[tokio::test]
    async fn adapter_runs_fetches_and_schedules_on_the_queue() {
        let shutdown = CancellationToken::new();
        let queue = Arc::new(
            InMemoryQueue::builder(Arc::new(Echo), FetchDeps::default())
                .with_workers(2)
                .start(shutdown.clone())
                .unwrap(),
        );
        let adapter =
            QueueAdapter::new(queue.clone(), Arc::new(Echo), FetchDeps::default(), shutdown);
        let app = HttpApi::new(Arc::new(adapter)).router();

        let resp = app
            .clone()
            .oneshot(post("/fetch/example.com/foo/@v/v1.0.0"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app
            .clone()
            .oneshot(post("/fetch/example.com/missing/@v/v1.0.0"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(post("/queue/example.com/foo/@v/v1.0.0"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        queue
            .wait_for_testing(&CancellationToken::new())
            .await
            .unwrap();
    }
}
