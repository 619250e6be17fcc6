//! In-memory resource manager.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use weft_core::{CoreResult, WorkerId};
use weft_primitives::{
    CancellationEntryFactory, DistributedCancellationToken, DistributedCounter, ExecutionContext,
    JobMonitor, JobQueue, Payload, ResourceManager, ResultAggregator, TaskCompletionSource,
};

use crate::aggregator::InMemoryAggregator;
use crate::cancellation::InMemoryCancellationFactory;
use crate::completion::InMemoryCompletionSource;
use crate::counter::InMemoryCounter;
use crate::queue::InMemoryJobQueue;

/// Snapshot of resource-manager request accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceStats {
    /// Counters handed out.
    pub counters: u64,
    /// Aggregators handed out.
    pub aggregators: u64,
    /// Completion sources handed out.
    pub completion_sources: u64,
}

impl ResourceStats {
    /// Total primitives handed out.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.counters + self.aggregators + self.completion_sources
    }
}

/// Resource manager handing out process-local primitives.
///
/// Every `request_*` call is counted, so tests can assert that a code path
/// acquired nothing.
pub struct InMemoryResourceManager {
    factory: Arc<InMemoryCancellationFactory>,
    queue: Arc<InMemoryJobQueue>,
    counters_requested: AtomicU64,
    aggregators_requested: AtomicU64,
    sources_requested: AtomicU64,
}

impl InMemoryResourceManager {
    /// Create a manager with a fresh factory and queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factory: Arc::new(InMemoryCancellationFactory::new()),
            queue: Arc::new(InMemoryJobQueue::new()),
            counters_requested: AtomicU64::new(0),
            aggregators_requested: AtomicU64::new(0),
            sources_requested: AtomicU64::new(0),
        }
    }

    /// Concrete handle to the in-memory queue, for dispatch and tests.
    #[must_use]
    pub fn queue(&self) -> Arc<InMemoryJobQueue> {
        self.queue.clone()
    }

    /// Snapshot of request accounting.
    #[must_use]
    pub fn stats(&self) -> ResourceStats {
        ResourceStats {
            counters: self.counters_requested.load(Ordering::SeqCst),
            aggregators: self.aggregators_requested.load(Ordering::SeqCst),
            completion_sources: self.sources_requested.load(Ordering::SeqCst),
        }
    }

    /// Build a root execution context: fresh root token, the given monitor
    /// and worker identity. Entry point for driving the engine from
    /// outside any job.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cancellation entry cannot be created.
    pub async fn root_context(
        &self,
        monitor: Arc<dyn JobMonitor>,
        worker_id: WorkerId,
    ) -> CoreResult<ExecutionContext> {
        let token =
            DistributedCancellationToken::create(self.factory.as_ref(), &[], false).await?;
        Ok(ExecutionContext::new(monitor, worker_id, token))
    }
}

impl Default for InMemoryResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceManager for InMemoryResourceManager {
    async fn request_counter(&self, initial: u64) -> CoreResult<Arc<dyn DistributedCounter>> {
        self.counters_requested.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryCounter::new(initial)))
    }

    async fn request_aggregator<T>(
        &self,
        capacity: usize,
    ) -> CoreResult<Arc<dyn ResultAggregator<T>>>
    where
        T: Payload + Clone,
    {
        self.aggregators_requested.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryAggregator::new(capacity)))
    }

    async fn request_completion_source<T>(
        &self,
    ) -> CoreResult<Arc<dyn TaskCompletionSource<T>>>
    where
        T: Payload + Clone,
    {
        self.sources_requested.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryCompletionSource::new()))
    }

    fn cancellation_factory(&self) -> Arc<dyn CancellationEntryFactory> {
        self.factory.clone()
    }

    fn job_queue(&self) -> Arc<dyn JobQueue> {
        self.queue.clone()
    }
}
