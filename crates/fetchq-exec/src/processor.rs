use async_trait::async_trait;
use fetchq_core::{FetchDeps, FetchError, Processor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Resolve a module version through the proxy and persist its metadata.
///
/// Versions already present in the store are not fetched again.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchAndStore;

#[async_trait]
impl Processor for FetchAndStore {
    fn name(&self) -> &'static str {
        "fetch-and-store"
    }

    async fn process(
        &self,
        ctx: CancellationToken,
        module_path: &str,
        version: &str,
        deps: &FetchDeps,
    ) -> Result<u16, FetchError> {
        if deps.store().get(module_path, version).await?.is_some() {
            debug!(module = module_path, version, "already stored");
            return Ok(200);
        }

        let info = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(FetchError::Canceled),
            res = deps.proxy().info(module_path, version) => res?,
        };

        tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(FetchError::Canceled),
            res = deps.store().insert(module_path, info.clone()) => res?,
        }

        info!(
            module = module_path,
            requested = version,
            resolved = %info.version,
            "module version stored"
        );
        Ok(200)
    }
}
