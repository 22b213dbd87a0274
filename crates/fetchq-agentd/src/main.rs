mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fetchq_api::{HttpApi, QueueAdapter};
use fetchq_core::{FetchDeps, InMemoryQueue, ProcessorHandle, QueueHandle};
use fetchq_exec::{FetchAndStore, HttpModuleProxy, MemoryStore};
use fetchq_gcp::GcpQueue;
use fetchq_model::QueueBackend;
use fetchq_observe::init_logger;
use fetchq_prometheus::PrometheusMetrics;

use crate::config::AgentConfig;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) config + logger
    let cfg = AgentConfig::load().context("load configuration")?;
    init_logger(&cfg.logger)?;
    info!(backend = %cfg.queue.backend, listen = %cfg.listen, "starting fetch agent");

    let shutdown = CancellationToken::new();
    let metrics = Arc::new(PrometheusMetrics::new()?);

    // 2) collaborators
    let deps = FetchDeps::new(
        Arc::new(HttpModuleProxy::new(cfg.proxy_url.clone())?),
        Arc::new(MemoryStore::new()),
    );
    let processor: ProcessorHandle = Arc::new(FetchAndStore);

    // 3) queue backend
    let queue: QueueHandle = match cfg.queue.backend {
        QueueBackend::InMemory => Arc::new(
            InMemoryQueue::builder(processor.clone(), deps.clone())
                .with_config(&cfg.queue)
                .with_metrics(metrics.clone())
                .start(shutdown.clone())?,
        ),
        QueueBackend::Gcp => {
            let gcp = cfg
                .queue
                .gcp
                .as_ref()
                .context("queue.gcp is required for the gcp backend")?;
            Arc::new(GcpQueue::from_config(gcp)?.with_metrics(metrics.clone()))
        }
    };

    // 4) http
    let adapter = QueueAdapter::new(queue, processor, deps, shutdown.clone())
        .with_metrics(metrics.clone());
    let app = HttpApi::new(Arc::new(adapter))
        .with_metrics(metrics)
        .router();

    let listener = tokio::net::TcpListener::bind(&cfg.listen)
        .await
        .with_context(|| format!("bind {}", cfg.listen))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    info!("fetch agent stopped");
    Ok(())
}

async fn wait_for_signal(shutdown: CancellationToken) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
        }
        _ = shutdown.cancelled() => {}
    }
    info!("shutting down");
    shutdown.cancel();
}
