//! Execution context threaded through every computation step.

use std::sync::Arc;
use weft_core::{Fault, WorkerId};

use crate::cancellation::DistributedCancellationToken;

/// Per-job execution monitor.
///
/// Every job path that does not continue into a parent continuation must
/// signal completion exactly once, so the hosting worker can reclaim its
/// slot. Dropping the signal is a resource leak, not a cosmetic issue.
pub trait JobMonitor: Send + Sync {
    /// The current job finished its own work.
    fn trigger_completion(&self);

    /// The current job hit a runtime-level failure that could not travel
    /// the continuation channel.
    fn trigger_fault(&self, fault: Fault);
}

/// Ambient state carried through every computation step.
///
/// Immutable value; combinators derive a new context (token swapped) when
/// crossing a cancellation boundary, they never mutate one in place.
#[derive(Clone)]
pub struct ExecutionContext {
    monitor: Arc<dyn JobMonitor>,
    worker_id: WorkerId,
    cancellation: DistributedCancellationToken,
}

impl ExecutionContext {
    /// Create a context for a job hosted by the given worker.
    #[must_use]
    pub fn new(
        monitor: Arc<dyn JobMonitor>,
        worker_id: WorkerId,
        cancellation: DistributedCancellationToken,
    ) -> Self {
        Self { monitor, worker_id, cancellation }
    }

    /// The job execution monitor of the hosting worker.
    #[must_use]
    pub fn monitor(&self) -> &Arc<dyn JobMonitor> {
        &self.monitor
    }

    /// Identity of the worker executing the current job.
    #[must_use]
    pub const fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    /// The currently active cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &DistributedCancellationToken {
        &self.cancellation
    }

    /// Derive a context with a different active cancellation token.
    #[must_use]
    pub fn with_cancellation(&self, cancellation: DistributedCancellationToken) -> Self {
        Self {
            monitor: self.monitor.clone(),
            worker_id: self.worker_id,
            cancellation,
        }
    }

    /// Signal that the current job finished its own work.
    pub fn trigger_completion(&self) {
        self.monitor.trigger_completion();
    }

    /// Signal a runtime-level failure of the current job.
    pub fn trigger_fault(&self, fault: Fault) {
        self.monitor.trigger_fault(fault);
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("worker_id", &self.worker_id)
            .field("cancellation", &self.cancellation.id())
            .finish_non_exhaustive()
    }
}
