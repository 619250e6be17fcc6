//! Parallel combinator: fan out sub-computations, fan back into one
//! index-ordered result array.
//!
//! Fan-in protocol, per child callback:
//!
//! - a portable success value is written to its aggregator slot; the unique
//!   write that fills the last slot cancels the sibling cohort and drives
//!   the parent's success arm with the index-ordered snapshot;
//! - a non-portable success value, an exception, or a cancellation enters
//!   the first-increment-wins race; the unique winner cancels the cohort
//!   and drives the parent; every loser only signals its own completion.
//!
//! The combinator itself never waits for children: it submits the batch
//! and ends the current job.

use std::sync::Arc;
use weft_core::{CoreError, Fault};
use weft_primitives::{
    CloudJob, Computation, Continuation, DistributedCancellationToken, DistributedCounter,
    ExecutionContext, JobKind, Payload, ResourceManager, ResultAggregator, WorkerRef,
};

use crate::engine::{forward_first, ContinuationCell, ExecutionEngine, Terminal};
use crate::scope::JobScope;

impl<R: ResourceManager> ExecutionEngine<R> {
    /// Run sub-computations in parallel, yielding their results ordered by
    /// input index, or failing/cancelling as a single unit.
    ///
    /// Each input entry pairs a computation with an optional worker pin.
    /// An `Err` entry models a failing input enumeration: the fault is
    /// reported through the continuation and nothing is scheduled.
    pub async fn run_parallel<T>(
        &self,
        ctx: ExecutionContext,
        scope: JobScope,
        computations: Vec<Result<(Computation<T>, Option<WorkerRef>), Fault>>,
        continuation: Continuation<Vec<T>>,
    ) where
        T: Payload + Clone,
    {
        // Materialize the input sequence before anything else.
        let collected: Result<Vec<_>, Fault> = computations.into_iter().collect();
        let mut entries = match collected {
            Ok(entries) => entries,
            Err(fault) => return continuation.failure(ctx, fault).await,
        };

        if entries.is_empty() {
            return continuation.success(ctx, Vec::new()).await;
        }

        // A lone unpinned child runs in the current job.
        if entries.len() == 1 && entries[0].1.is_none() {
            let Some((computation, _target)) = entries.pop() else {
                return;
            };
            return run_single_inline(ctx, computation, continuation).await;
        }

        // A result type that can never cross a worker boundary fails before
        // any shared resource exists for this workflow.
        if !T::type_portable() {
            let fault = Fault::result_type_not_portable(std::any::type_name::<T>());
            return continuation.failure(ctx, fault).await;
        }

        if !continuation.is_portable() || entries.iter().any(|(c, _)| !c.is_portable()) {
            return continuation.failure(ctx, Fault::closure_not_portable("parallel batch")).await;
        }

        let total = entries.len();
        let caller_token = ctx.cancellation().clone();
        let factory = self.resources().cancellation_factory();
        let acquired = async {
            let cohort_token = DistributedCancellationToken::create(
                factory.as_ref(),
                std::slice::from_ref(&caller_token),
                true,
            )
            .await?;
            let aggregator: Arc<dyn ResultAggregator<T>> =
                self.resources().request_aggregator(total).await?;
            let counter = self.resources().request_counter(0).await?;
            Ok::<_, CoreError>((cohort_token, aggregator, counter))
        }
        .await;
        let (cohort_token, aggregator, counter) = match acquired {
            Ok(primitives) => primitives,
            Err(err) => return continuation.failure(ctx, Fault::resource(err.to_string())).await,
        };

        let parent = ContinuationCell::shared(continuation);
        let mut batch = Vec::with_capacity(total);
        for (index, (computation, target)) in entries.into_iter().enumerate() {
            let child = child_continuation(
                index,
                parent.clone(),
                aggregator.clone(),
                counter.clone(),
                cohort_token.clone(),
                caller_token.clone(),
            );
            let job = CloudJob::create(
                scope.dependencies().to_vec(),
                scope.process_id(),
                scope.parent_task(),
                JobKind::ParallelChild { index },
                cohort_token.clone(),
                scope.fault_policy(),
                child,
                computation,
            );
            batch.push((job, target));
        }

        tracing::debug!(jobs = total, process = %scope.process_id(), "submitting parallel fan-out");
        match self.resources().job_queue().enqueue_batch(batch).await {
            Ok(()) => ctx.trigger_completion(),
            Err(err) => {
                // nothing was scheduled, so the parent is still ours to drive
                if let Some(parent) = parent.take().await {
                    parent.failure(ctx, Fault::resource(err.to_string())).await;
                }
            }
        }
    }
}

/// Isolate and run a single child in the current job, mapping its result
/// into a one-element array.
async fn run_single_inline<T: Payload + Clone>(
    ctx: ExecutionContext,
    computation: Computation<T>,
    continuation: Continuation<Vec<T>>,
) {
    if !continuation.is_portable() {
        return continuation
            .failure(ctx, Fault::closure_not_portable("inlined continuation"))
            .await;
    }

    match computation.isolate() {
        Err(fault) => continuation.failure(ctx, fault).await,
        Ok(computation) => {
            let parent = ContinuationCell::shared(continuation);
            let on_success = parent.clone();
            let on_failure = parent.clone();
            let on_cancelled = parent;
            let inner = Continuation::new(
                move |ctx, value: T| async move {
                    if let Some(parent) = on_success.take().await {
                        parent.success(ctx, vec![value]).await;
                    }
                },
                move |ctx, fault| async move {
                    if let Some(parent) = on_failure.take().await {
                        parent.failure(ctx, fault).await;
                    }
                },
                move |ctx, cause| async move {
                    if let Some(parent) = on_cancelled.take().await {
                        parent.cancelled(ctx, cause).await;
                    }
                },
            );
            computation.run(ctx, inner).await;
        }
    }
}

/// Continuation handed to the child at `index`.
fn child_continuation<T: Payload + Clone>(
    index: usize,
    parent: Arc<ContinuationCell<Vec<T>>>,
    aggregator: Arc<dyn ResultAggregator<T>>,
    counter: Arc<dyn DistributedCounter>,
    cohort_token: DistributedCancellationToken,
    caller_token: DistributedCancellationToken,
) -> Continuation<T> {
    let on_success = {
        let parent = parent.clone();
        let counter = counter.clone();
        let cohort_token = cohort_token.clone();
        let caller_token = caller_token.clone();
        move |ctx: ExecutionContext, value: T| async move {
            if !value.portable() {
                let fault = Fault::result_not_portable(format!("parallel slot {index}"));
                forward_first(ctx, counter, cohort_token, caller_token, parent, Terminal::Fault(fault))
                    .await;
                return;
            }
            match aggregator.set_result(index, value, true).await {
                Ok(true) => {
                    // last slot filled; this callback owns the parent now
                    if let Err(err) = cohort_token.cancel().await {
                        ctx.trigger_fault(Fault::resource(err.to_string()));
                        return;
                    }
                    match aggregator.to_vec().await {
                        Ok(results) => {
                            let parent_ctx = ctx.with_cancellation(caller_token);
                            match parent.take().await {
                                Some(parent) => parent.success(parent_ctx, results).await,
                                None => ctx.trigger_completion(),
                            }
                        }
                        Err(err) => ctx.trigger_fault(Fault::resource(err.to_string())),
                    }
                }
                Ok(false) => ctx.trigger_completion(),
                Err(err) => ctx.trigger_fault(Fault::resource(err.to_string())),
            }
        }
    };

    let on_failure = {
        let parent = parent.clone();
        let counter = counter.clone();
        let cohort_token = cohort_token.clone();
        let caller_token = caller_token.clone();
        move |ctx: ExecutionContext, fault: Fault| async move {
            forward_first(ctx, counter, cohort_token, caller_token, parent, Terminal::Fault(fault))
                .await;
        }
    };

    let on_cancelled = move |ctx: ExecutionContext, cause| async move {
        forward_first(
            ctx,
            counter,
            cohort_token,
            caller_token,
            parent,
            Terminal::Cancelled(cause),
        )
        .await;
    };

    Continuation::new(on_success, on_failure, on_cancelled)
}
