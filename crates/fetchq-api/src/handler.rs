use async_trait::async_trait;
use fetchq_model::{FetchRequest, ModuleVersion};

use crate::error::ApiError;

/// Backend of the HTTP routes.
///
/// [`crate::QueueAdapter`] is the stock implementation; wrap it to add auth or
/// rate limiting.
#[async_trait]
pub trait FetchHandler: Send + Sync + 'static {
    /// Run the fetch for `target` now and return its status code.
    async fn fetch(&self, target: ModuleVersion) -> Result<u16, ApiError>;

    /// Hand `req` to the queue backend.
    async fn enqueue(&self, req: FetchRequest) -> Result<(), ApiError>;
}
