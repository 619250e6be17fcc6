//! WEFT In-Memory Runtime
//!
//! Reference realization of every primitive contract the engine consumes:
//! cancellation entries, counters, result aggregators, completion sources,
//! a job queue with worker affinity, and a local worker pool that drives
//! queued jobs on tokio tasks.
//!
//! A clustered deployment replaces this crate with implementations backed
//! by real distributed storage and transport; the engine is unchanged.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod cancellation;
pub mod completion;
pub mod counter;
pub mod pool;
pub mod queue;
pub mod resources;

// Re-exports
pub use aggregator::InMemoryAggregator;
pub use cancellation::{InMemoryCancellationEntry, InMemoryCancellationFactory};
pub use completion::InMemoryCompletionSource;
pub use counter::InMemoryCounter;
pub use pool::{CountingMonitor, DispatcherConfig, PoolStats, WorkerPool};
pub use queue::InMemoryJobQueue;
pub use resources::{InMemoryResourceManager, ResourceStats};
