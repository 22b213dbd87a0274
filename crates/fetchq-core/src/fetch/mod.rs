//! Boundary to the fetch-and-persist pipeline.
//!
//! The queue only needs to invoke a [`Processor`] with a cancellation token and the
//! external collaborators ([`ModuleProxy`], [`ModuleStore`]); their internals live elsewhere.
mod error;
pub use error::FetchError;

mod deps;
pub use deps::{FetchDeps, NoProxy, NoStore};

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use fetchq_model::{ModuleVersion, VersionInfo};
use tokio_util::sync::CancellationToken;

/// Client of a module proxy.
#[async_trait]
pub trait ModuleProxy: Send + Sync + 'static {
    /// Resolve version metadata for `module_path@version`.
    async fn info(&self, module_path: &str, version: &str) -> Result<VersionInfo, FetchError>;
}

/// Persistence layer for fetched module versions.
#[async_trait]
pub trait ModuleStore: Send + Sync + 'static {
    async fn insert(&self, module_path: &str, info: VersionInfo) -> Result<(), FetchError>;

    async fn get(&self, module_path: &str, version: &str)
    -> Result<Option<VersionInfo>, FetchError>;
}

pub type ProxyHandle = Arc<dyn ModuleProxy>;
pub type StoreHandle = Arc<dyn ModuleStore>;

/// Fetch-and-persist pipeline invoked by the queues.
///
/// Returns an HTTP-like status code on success. Implementations should watch `ctx`
/// and stop early once it is cancelled.
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    /// Processor name used in logs.
    fn name(&self) -> &'static str;

    async fn process(
        &self,
        ctx: CancellationToken,
        module_path: &str,
        version: &str,
        deps: &FetchDeps,
    ) -> Result<u16, FetchError>;
}

pub type ProcessorHandle = Arc<dyn Processor>;

/// Run one processing invocation bounded by `limit`.
///
/// The processor receives a child of `parent`; the child is cancelled once the call
/// returns or the limit elapses, whichever comes first.
pub async fn execute(
    processor: &dyn Processor,
    parent: &CancellationToken,
    target: &ModuleVersion,
    deps: &FetchDeps,
    limit: Duration,
) -> Result<u16, FetchError> {
    let ctx = parent.child_token();
    let _guard = ctx.clone().drop_guard();

    let call = processor.process(ctx, &target.module_path, &target.version, deps);
    match tokio::time::timeout(limit, call).await {
        Ok(res) => res,
        Err(_) => Err(FetchError::Timeout(limit)),
    }
}
