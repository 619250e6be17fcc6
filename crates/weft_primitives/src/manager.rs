//! Resource manager contract.

use async_trait::async_trait;
use std::sync::Arc;
use weft_core::CoreResult;

use crate::aggregator::ResultAggregator;
use crate::cancellation::CancellationEntryFactory;
use crate::completion::TaskCompletionSource;
use crate::computation::Payload;
use crate::counter::DistributedCounter;
use crate::queue::JobQueue;

/// Capabilities the engine consumes from the surrounding runtime.
///
/// Every primitive handed out must be linearizable across concurrently
/// executing jobs; the engine performs no additional locking of its own.
#[async_trait]
pub trait ResourceManager: Send + Sync + 'static {
    /// Allocate a shared counter starting at `initial`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store is unavailable.
    async fn request_counter(&self, initial: u64) -> CoreResult<Arc<dyn DistributedCounter>>;

    /// Allocate a result aggregator with the given slot capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store is unavailable.
    async fn request_aggregator<T>(
        &self,
        capacity: usize,
    ) -> CoreResult<Arc<dyn ResultAggregator<T>>>
    where
        T: Payload + Clone;

    /// Allocate a completion source for a new task.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store is unavailable.
    async fn request_completion_source<T>(
        &self,
    ) -> CoreResult<Arc<dyn TaskCompletionSource<T>>>
    where
        T: Payload + Clone;

    /// Factory for cancellation entries.
    fn cancellation_factory(&self) -> Arc<dyn CancellationEntryFactory>;

    /// The scheduler's job queue.
    fn job_queue(&self) -> Arc<dyn JobQueue>;
}
