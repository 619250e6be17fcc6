//! Execution engine front type and shared fan-in machinery.

use std::sync::Arc;
use tokio::sync::Mutex;
use weft_core::{CancellationCause, Fault};
use weft_primitives::{
    Continuation, DistributedCancellationToken, DistributedCounter, ExecutionContext,
    ResourceManager,
};

/// Binds the combinators to a resource manager.
///
/// The engine holds no state of its own beyond the resource handle; every
/// combinator invocation acquires what it needs, submits its jobs, and
/// ends the current job. It never blocks waiting for children.
pub struct ExecutionEngine<R> {
    resources: Arc<R>,
}

impl<R: ResourceManager> ExecutionEngine<R> {
    /// Create an engine over the given resource manager.
    #[must_use]
    pub fn new(resources: Arc<R>) -> Self {
        Self { resources }
    }

    /// The resource manager this engine acquires primitives from.
    #[must_use]
    pub fn resources(&self) -> &Arc<R> {
        &self.resources
    }
}

impl<R> Clone for ExecutionEngine<R> {
    fn clone(&self) -> Self {
        Self { resources: self.resources.clone() }
    }
}

impl<R> std::fmt::Debug for ExecutionEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine").finish_non_exhaustive()
    }
}

/// Shared slot holding the parent continuation of a fan-out.
///
/// All child callbacks close over one cell; taking the continuation out
/// transfers exclusive ownership to the race winner, so the parent can
/// never be driven twice even if the arbitration protocol were violated.
pub(crate) struct ContinuationCell<T> {
    inner: Mutex<Option<Continuation<T>>>,
}

impl<T> ContinuationCell<T> {
    pub(crate) fn shared(continuation: Continuation<T>) -> Arc<Self> {
        Arc::new(Self { inner: Mutex::new(Some(continuation)) })
    }

    pub(crate) async fn take(&self) -> Option<Continuation<T>> {
        self.inner.lock().await.take()
    }
}

/// Terminal event competing for the right to drive the parent.
pub(crate) enum Terminal {
    Fault(Fault),
    Cancelled(CancellationCause),
}

/// First-increment-wins arbitration for terminal events.
///
/// The unique caller whose increment returns 1 cancels the sibling cohort
/// and forwards the event to the parent continuation, with the caller's
/// original token restored so a dead cohort token never leaks upward.
/// Every other caller only signals its own job completion.
pub(crate) async fn forward_first<P>(
    ctx: ExecutionContext,
    winner_counter: Arc<dyn DistributedCounter>,
    cohort_token: DistributedCancellationToken,
    caller_token: DistributedCancellationToken,
    parent: Arc<ContinuationCell<P>>,
    terminal: Terminal,
) {
    match winner_counter.increment().await {
        Ok(1) => {
            if let Err(err) = cohort_token.cancel().await {
                ctx.trigger_fault(Fault::resource(err.to_string()));
                return;
            }
            let parent_ctx = ctx.with_cancellation(caller_token);
            match parent.take().await {
                Some(parent) => match terminal {
                    Terminal::Fault(fault) => parent.failure(parent_ctx, fault).await,
                    Terminal::Cancelled(cause) => parent.cancelled(parent_ctx, cause).await,
                },
                None => ctx.trigger_completion(),
            }
        }
        Ok(_) => ctx.trigger_completion(),
        Err(err) => ctx.trigger_fault(Fault::resource(err.to_string())),
    }
}
