//! Computation capabilities and the payload portability oracle.
//!
//! A computation is an opaque unit of work executed by handing it an
//! execution context and a continuation. Whether a computation, a
//! continuation, or a produced value may cross worker boundaries is decided
//! by explicit portability oracles rather than by the transport layer.

use futures::future::BoxFuture;
use std::future::Future;
use weft_core::Fault;

use crate::context::ExecutionContext;
use crate::continuation::Continuation;

/// Portability oracle for values produced by computations.
///
/// `type_portable` answers at the type level, before any resource is
/// acquired for a workflow; `portable` answers for a concrete value about
/// to cross into shared distributed state.
pub trait Payload: Send + 'static {
    /// Whether values of this type can ever cross a worker boundary.
    #[must_use]
    fn type_portable() -> bool {
        true
    }

    /// Whether this specific value can cross a worker boundary.
    #[must_use]
    fn portable(&self) -> bool {
        Self::type_portable()
    }
}

impl Payload for () {}
impl Payload for bool {}
impl Payload for i32 {}
impl Payload for i64 {}
impl Payload for u32 {}
impl Payload for u64 {}
impl Payload for usize {}
impl Payload for f64 {}
impl Payload for String {}

impl<T: Payload> Payload for Option<T> {
    fn type_portable() -> bool {
        T::type_portable()
    }

    fn portable(&self) -> bool {
        self.as_ref().map_or(true, Payload::portable)
    }
}

impl<T: Payload> Payload for Vec<T> {
    fn type_portable() -> bool {
        T::type_portable()
    }

    fn portable(&self) -> bool {
        self.iter().all(Payload::portable)
    }
}

impl<A: Payload, B: Payload> Payload for (A, B) {
    fn type_portable() -> bool {
        A::type_portable() && B::type_portable()
    }

    fn portable(&self) -> bool {
        self.0.portable() && self.1.portable()
    }
}

type ComputationBody<T> =
    Box<dyn FnOnce(ExecutionContext, Continuation<T>) -> BoxFuture<'static, ()> + Send>;

/// An opaque unit of cloud work.
///
/// Running a computation hands it the ambient context and a continuation;
/// the computation must invoke exactly one continuation arm, exactly once.
pub struct Computation<T> {
    body: ComputationBody<T>,
    portable: bool,
}

impl<T: Payload> Computation<T> {
    /// Create a computation from an async body.
    #[must_use]
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(ExecutionContext, Continuation<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            body: Box::new(move |ctx, cont| Box::pin(body(ctx, cont))),
            portable: true,
        }
    }

    /// A computation that immediately succeeds with the given value.
    #[must_use]
    pub fn completed(value: T) -> Self {
        Self::new(move |ctx, cont| async move {
            cont.success(ctx, value).await;
        })
    }

    /// A computation that immediately reports the given fault.
    #[must_use]
    pub fn faulted(fault: Fault) -> Self {
        Self::new(move |ctx, cont| async move {
            cont.failure(ctx, fault).await;
        })
    }

    /// Create a computation whose closed-over state cannot cross worker
    /// boundaries.
    #[must_use]
    pub fn local_only<F, Fut>(body: F) -> Self
    where
        F: FnOnce(ExecutionContext, Continuation<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut computation = Self::new(body);
        computation.portable = false;
        computation
    }

    /// Whether the closed-over state can cross worker boundaries.
    #[must_use]
    pub fn is_portable(&self) -> bool {
        self.portable
    }

    /// Produce a value-isolated copy for inline execution.
    ///
    /// Exclusive ownership of the body already guarantees that no mutable
    /// state is shared with the submitting job; a computation tagged
    /// non-portable fails here exactly as it would when scheduled remotely.
    ///
    /// # Errors
    ///
    /// Returns a closure-portability fault if the computation cannot be
    /// isolated.
    pub fn isolate(self) -> Result<Self, Fault> {
        if self.portable {
            Ok(self)
        } else {
            Err(Fault::closure_not_portable("inlined computation"))
        }
    }

    /// Run the computation in the current job.
    pub async fn run(self, ctx: ExecutionContext, continuation: Continuation<T>) {
        (self.body)(ctx, continuation).await;
    }
}

impl<T> std::fmt::Debug for Computation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computation")
            .field("portable", &self.portable)
            .finish_non_exhaustive()
    }
}
