//! WEFT Primitive Contracts
//!
//! The value types and contracts the combinator engine is built from: the
//! three-way continuation protocol, execution contexts, computation
//! capabilities, distributed cancellation tokens, result aggregators,
//! counters, task completion sources, cloud jobs, and the resource manager
//! that hands all of these out.
//!
//! Everything here is either a pure value or an `async` trait to be
//! implemented by a surrounding runtime; the in-process reference
//! implementation lives in `weft_runtime`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod cancellation;
pub mod completion;
pub mod computation;
pub mod context;
pub mod continuation;
pub mod counter;
pub mod job;
pub mod manager;
pub mod queue;

// Re-exports
pub use aggregator::ResultAggregator;
pub use cancellation::{CancellationEntry, CancellationEntryFactory, DistributedCancellationToken};
pub use completion::{TaskCompletionSource, TaskOutcome, TaskStatus};
pub use computation::{Computation, Payload};
pub use context::{ExecutionContext, JobMonitor};
pub use continuation::Continuation;
pub use counter::DistributedCounter;
pub use job::{CloudJob, JobKind};
pub use manager::ResourceManager;
pub use queue::{JobQueue, WorkerRef};
