//! Scheduling contract shared by every queue backend.
//!
//! Callers obtain one [`QueueHandle`] at startup and call [`Queue::schedule_fetch`]
//! per job without knowing which backend executes it.
mod memory;
pub use memory::{InMemoryQueue, InMemoryQueueBuilder, QueueState};

use std::sync::Arc;

use async_trait::async_trait;
use fetchq_model::{FetchRequest, QueueBackend};
use tokio_util::sync::CancellationToken;

use crate::error::QueueError;

/// Asynchronous scheduling of fetch jobs.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Backend kind, used in logs and metrics labels.
    fn backend(&self) -> QueueBackend;

    /// Schedule a fetch of `module_path@version`.
    ///
    /// `ctx` bounds the scheduling call only, never the eventual execution.
    /// A non-empty `suffix` asks backends that deduplicate to create a fresh task.
    async fn schedule_fetch(
        &self,
        ctx: &CancellationToken,
        module_path: &str,
        version: &str,
        suffix: &str,
    ) -> Result<(), QueueError>;

    /// Schedule a fetch described by a [`FetchRequest`].
    async fn schedule(&self, ctx: &CancellationToken, req: &FetchRequest) -> Result<(), QueueError> {
        self.schedule_fetch(ctx, req.module_path(), req.version(), &req.suffix)
            .await
    }
}

pub type QueueHandle = Arc<dyn Queue>;
