//! Three-way continuation protocol.
//!
//! Every computation reports its outcome through exactly one arm of a
//! [`Continuation`], exactly once. Invocation consumes the continuation, so
//! the exactly-once guarantee is structural rather than a runtime check.

use futures::future::BoxFuture;
use std::future::Future;
use weft_core::{CancellationCause, Fault};

use crate::context::ExecutionContext;

/// One arm of a continuation: a boxed one-shot callback driving the rest of
/// the workflow from the reported payload.
pub type ContinuationArm<P> =
    Box<dyn FnOnce(ExecutionContext, P) -> BoxFuture<'static, ()> + Send>;

/// The three-way outcome channel of a computation.
///
/// Owned by whoever scheduled the job and closed over by the job's
/// callbacks. The portability tag records whether the closed-over state can
/// cross worker boundaries; combinators consult it before distributing.
pub struct Continuation<T> {
    on_success: ContinuationArm<T>,
    on_failure: ContinuationArm<Fault>,
    on_cancelled: ContinuationArm<CancellationCause>,
    portable: bool,
}

impl<T> Continuation<T> {
    /// Create a continuation from its three arms.
    #[must_use]
    pub fn new<S, SF, F, FF, C, CF>(on_success: S, on_failure: F, on_cancelled: C) -> Self
    where
        S: FnOnce(ExecutionContext, T) -> SF + Send + 'static,
        SF: Future<Output = ()> + Send + 'static,
        F: FnOnce(ExecutionContext, Fault) -> FF + Send + 'static,
        FF: Future<Output = ()> + Send + 'static,
        C: FnOnce(ExecutionContext, CancellationCause) -> CF + Send + 'static,
        CF: Future<Output = ()> + Send + 'static,
    {
        Self {
            on_success: Box::new(move |ctx, value| Box::pin(on_success(ctx, value))),
            on_failure: Box::new(move |ctx, fault| Box::pin(on_failure(ctx, fault))),
            on_cancelled: Box::new(move |ctx, cause| Box::pin(on_cancelled(ctx, cause))),
            portable: true,
        }
    }

    /// Tag this continuation as unable to cross worker boundaries.
    #[must_use]
    pub fn local_only(mut self) -> Self {
        self.portable = false;
        self
    }

    /// Whether the closed-over state can cross worker boundaries.
    #[must_use]
    pub fn is_portable(&self) -> bool {
        self.portable
    }

    /// Report success.
    pub async fn success(self, ctx: ExecutionContext, value: T) {
        (self.on_success)(ctx, value).await;
    }

    /// Report an exception.
    pub async fn failure(self, ctx: ExecutionContext, fault: Fault) {
        (self.on_failure)(ctx, fault).await;
    }

    /// Report cancellation.
    pub async fn cancelled(self, ctx: ExecutionContext, cause: CancellationCause) {
        (self.on_cancelled)(ctx, cause).await;
    }
}

impl<T> std::fmt::Debug for Continuation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Continuation")
            .field("portable", &self.portable)
            .finish_non_exhaustive()
    }
}
