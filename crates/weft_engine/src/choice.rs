//! Choice combinator: fan out sub-computations, return the first hit.
//!
//! Children yield `Option<T>`. The first `Some` found across the cohort
//! wins; if every child completes with `None` the combinator succeeds with
//! `None`. Both terminal outcomes short-circuit outstanding siblings.
//!
//! Two counters arbitrate fan-in: a completion counter counts `None`
//! results (only the increment reaching the cohort size can be the last
//! one, so no extra race is needed there), and a winner counter picks
//! exactly one callback among `Some` results, exceptions, and
//! cancellations. Which `Some` wins when several arrive concurrently is
//! deliberately unspecified.

use std::sync::Arc;
use weft_core::{CoreError, Fault};
use weft_primitives::{
    CloudJob, Computation, Continuation, DistributedCancellationToken, DistributedCounter,
    ExecutionContext, JobKind, Payload, ResourceManager, WorkerRef,
};

use crate::engine::{forward_first, ContinuationCell, ExecutionEngine, Terminal};
use crate::scope::JobScope;

impl<R: ResourceManager> ExecutionEngine<R> {
    /// Run sub-computations until one yields `Some`, returning that value,
    /// or `None` once every child has completed empty.
    ///
    /// Each input entry pairs a computation with an optional worker pin.
    /// An `Err` entry models a failing input enumeration: the fault is
    /// reported through the continuation and nothing is scheduled.
    pub async fn run_choice<T>(
        &self,
        ctx: ExecutionContext,
        scope: JobScope,
        computations: Vec<Result<(Computation<Option<T>>, Option<WorkerRef>), Fault>>,
        continuation: Continuation<Option<T>>,
    ) where
        T: Payload + Clone,
    {
        let collected: Result<Vec<_>, Fault> = computations.into_iter().collect();
        let mut entries = match collected {
            Ok(entries) => entries,
            Err(fault) => return continuation.failure(ctx, fault).await,
        };

        if entries.is_empty() {
            return continuation.success(ctx, None).await;
        }

        // A lone unpinned child runs in the current job; ownership transfer
        // of the isolated computation is the value-isolated copy.
        if entries.len() == 1 && entries[0].1.is_none() {
            let Some((computation, _target)) = entries.pop() else {
                return;
            };
            if !continuation.is_portable() {
                return continuation
                    .failure(ctx, Fault::closure_not_portable("inlined continuation"))
                    .await;
            }
            return match computation.isolate() {
                Err(fault) => continuation.failure(ctx, fault).await,
                Ok(computation) => computation.run(ctx, continuation).await,
            };
        }

        if !T::type_portable() {
            let fault = Fault::result_type_not_portable(std::any::type_name::<T>());
            return continuation.failure(ctx, fault).await;
        }

        if !continuation.is_portable() || entries.iter().any(|(c, _)| !c.is_portable()) {
            return continuation.failure(ctx, Fault::closure_not_portable("choice batch")).await;
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
            let completion_counter = self.resources().request_counter(0).await?;
            let winner_counter = self.resources().request_counter(0).await?;
            Ok::<_, CoreError>((cohort_token, completion_counter, winner_counter))
        }
        .await;
        let (cohort_token, completion_counter, winner_counter) = match acquired {
            Ok(primitives) => primitives,
            Err(err) => return continuation.failure(ctx, Fault::resource(err.to_string())).await,
        };

        let parent = ContinuationCell::shared(continuation);
        let mut batch = Vec::with_capacity(total);
        for (index, (computation, target)) in entries.into_iter().enumerate() {
            let child = child_continuation(
                total as u64,
                parent.clone(),
                completion_counter.clone(),
                winner_counter.clone(),
                cohort_token.clone(),
                caller_token.clone(),
            );
            let job = CloudJob::create(
                scope.dependencies().to_vec(),
                scope.process_id(),
                scope.parent_task(),
                JobKind::ChoiceChild { index },
                cohort_token.clone(),
                scope.fault_policy(),
                child,
                computation,
            );
            batch.push((job, target));
        }

        tracing::debug!(jobs = total, process = %scope.process_id(), "submitting choice fan-out");
        match self.resources().job_queue().enqueue_batch(batch).await {
            Ok(()) => ctx.trigger_completion(),
            Err(err) => {
                if let Some(parent) = parent.take().await {
                    parent.failure(ctx, Fault::resource(err.to_string())).await;
                }
            }
        }
    }
}

/// Continuation handed to each choice child.
fn child_continuation<T: Payload + Clone>(
    total: u64,
    parent: Arc<ContinuationCell<Option<T>>>,
    completion_counter: Arc<dyn DistributedCounter>,
    winner_counter: Arc<dyn DistributedCounter>,
    cohort_token: DistributedCancellationToken,
    caller_token: DistributedCancellationToken,
) -> Continuation<Option<T>> {
    let on_success = {
        let parent = parent.clone();
        let winner_counter = winner_counter.clone();
        let cohort_token = cohort_token.clone();
        let caller_token = caller_token.clone();
        move |ctx: ExecutionContext, value: Option<T>| async move {
            match value {
                Some(found) => match winner_counter.increment().await {
                    Ok(1) => {
                        if let Err(err) = cohort_token.cancel().await {
                            ctx.trigger_fault(Fault::resource(err.to_string()));
                            return;
                        }
                        let parent_ctx = ctx.with_cancellation(caller_token);
                        match parent.take().await {
                            Some(parent) => parent.success(parent_ctx, Some(found)).await,
                            None => ctx.trigger_completion(),
                        }
                    }
                    // a later hit is simply discarded: first found, not best
                    Ok(_) => ctx.trigger_completion(),
                    Err(err) => ctx.trigger_fault(Fault::resource(err.to_string())),
                },
                None => match completion_counter.increment().await {
                    Ok(count) if count == total => {
                        // every child came back empty; only one increment
                        // can reach the total, so this caller is the finisher
                        if let Err(err) = cohort_token.cancel().await {
                            ctx.trigger_fault(Fault::resource(err.to_string()));
                            return;
                        }
                        let parent_ctx = ctx.with_cancellation(caller_token);
                        match parent.take().await {
                            Some(parent) => parent.success(parent_ctx, None).await,
                            None => ctx.trigger_completion(),
                        }
                    }
                    Ok(_) => ctx.trigger_completion(),
                    Err(err) => ctx.trigger_fault(Fault::resource(err.to_string())),
                },
            }
        }
    };

    let on_failure = {
        let parent = parent.clone();
        let winner_counter = winner_counter.clone();
        let cohort_token = cohort_token.clone();
        let caller_token = caller_token.clone();
        move |ctx: ExecutionContext, fault: Fault| async move {
            forward_first(
                ctx,
                winner_counter,
                cohort_token,
                caller_token,
                parent,
                Terminal::Fault(fault),
            )
            .await;
        }
    };

    let on_cancelled = move |ctx: ExecutionContext, cause| async move {
        forward_first(
            ctx,
            winner_counter,
            cohort_token,
            caller_token,
            parent,
            Terminal::Cancelled(cause),
        )
        .await;
    };

    Continuation::new(on_success, on_failure, on_cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{
        capturing, ok, root_context, run_jobs_concurrent, run_jobs_sequential, test_engine, Opaque,
    };
    use weft_core::{FaultKind, ProcessId, TaskId};
    use weft_primitives::TaskOutcome;

    fn make_scope() -> JobScope {
        JobScope::new(ProcessId::new(), TaskId::new())
    }

    #[tokio::test]
    async fn test_empty_input_completes_with_none() {
        let (resources, engine) = test_engine();
        let (ctx, _monitor) = root_context(&resources).await;
        let (continuation, captured) = capturing::<Option<i32>>();

        engine.run_choice::<i32>(ctx, make_scope(), Vec::new(), continuation).await;

        assert_eq!(captured.outcome().await, Some(TaskOutcome::Completed(None)));
        assert_eq!(resources.stats().total(), 0);
        assert_eq!(resources.queue().submit_call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_unpinned_child_runs_inline() {
        let (resources, engine) = test_engine();
        let (ctx, _monitor) = root_context(&resources).await;
        let (continuation, captured) = capturing::<Option<i32>>();

        engine
            .run_choice(ctx, make_scope(), vec![ok(Computation::completed(Some(5)))], continuation)
            .await;

        assert_eq!(captured.outcome().await, Some(TaskOutcome::Completed(Some(5))));
        assert_eq!(resources.queue().submit_call_count(), 0);
        assert_eq!(resources.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_first_some_wins_and_cancels_siblings() {
        let (resources, engine) = test_engine();
        let (ctx, monitor) = root_context(&resources).await;
        let (continuation, captured) = capturing::<Option<i32>>();

        let inputs = vec![
            ok(Computation::completed(None)),
            ok(Computation::completed(Some(5))),
            ok(Computation::completed(None)),
        ];
        engine.run_choice(ctx, make_scope(), inputs, continuation).await;

        let jobs = resources.queue().drain().await;
        let cohort_token = jobs[0].0.cancellation().clone();

        // completion order: both empty children first, then the hit
        let mut ordered = Vec::new();
        let mut iter = jobs.into_iter();
        let first = iter.next().unwrap();
        let hit = iter.next().unwrap();
        let last = iter.next().unwrap();
        ordered.push(first);
        ordered.push(last);
        ordered.push(hit);
        run_jobs_sequential(ordered, monitor).await;

        assert_eq!(captured.wait().await, TaskOutcome::Completed(Some(5)));
        assert_eq!(captured.hits(), 1);
        assert!(cohort_token.is_cancelled().await.unwrap());
    }

    #[tokio::test]
    async fn test_all_none_completes_with_none() {
        let (resources, engine) = test_engine();
        let (ctx, monitor) = root_context(&resources).await;
        let (continuation, captured) = capturing::<Option<i32>>();

        let inputs = (0..3).map(|_| ok(Computation::completed(None))).collect();
        engine.run_choice::<i32>(ctx, make_scope(), inputs, continuation).await;

        run_jobs_sequential(resources.queue().drain().await, monitor).await;

        assert_eq!(captured.wait().await, TaskOutcome::Completed(None));
        assert_eq!(captured.hits(), 1);
    }

    #[tokio::test]
    async fn test_simultaneous_hits_reach_parent_exactly_once() {
        let (resources, engine) = test_engine();
        let (ctx, monitor) = root_context(&resources).await;
        let (continuation, captured) = capturing::<Option<i32>>();

        let inputs = vec![
            ok(Computation::completed(Some(1))),
            ok(Computation::completed(Some(2))),
        ];
        engine.run_choice(ctx, make_scope(), inputs, continuation).await;

        run_jobs_concurrent(resources.queue().drain().await, monitor).await;

        // selection among simultaneous hits is unspecified; only uniqueness
        // and membership are guaranteed
        match captured.wait().await {
            TaskOutcome::Completed(Some(value)) => assert!(value == 1 || value == 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(captured.hits(), 1);
    }

    #[tokio::test]
    async fn test_failure_beats_pending_children() {
        let (resources, engine) = test_engine();
        let (ctx, monitor) = root_context(&resources).await;
        let (continuation, captured) = capturing::<Option<i32>>();

        let inputs = vec![
            ok(Computation::completed(None)),
            ok(Computation::faulted(Fault::application("probe failed"))),
            ok(Computation::completed(None)),
        ];
        engine.run_choice(ctx, make_scope(), inputs, continuation).await;

        run_jobs_concurrent(resources.queue().drain().await, monitor).await;

        match captured.wait().await {
            TaskOutcome::Faulted(fault) => assert_eq!(fault.message(), "probe failed"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(captured.hits(), 1);
    }

    #[tokio::test]
    async fn test_result_type_check_precedes_acquisition() {
        let (resources, engine) = test_engine();
        let (ctx, _monitor) = root_context(&resources).await;
        let (continuation, captured) = capturing::<Option<Opaque>>();

        let inputs = vec![
            ok(Computation::completed(Some(Opaque))),
            ok(Computation::completed(None)),
        ];
        engine.run_choice(ctx, make_scope(), inputs, continuation).await;

        match captured.outcome().await {
            Some(TaskOutcome::Faulted(fault)) => {
                assert_eq!(fault.kind(), FaultKind::ResultTypeNotPortable);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(resources.stats().total(), 0);
        assert_eq!(resources.queue().submit_call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_caller_token_cancels_children() {
        let (resources, engine) = test_engine();
        let (ctx, monitor) = root_context(&resources).await;
        let (continuation, captured) = capturing::<Option<i32>>();

        let caller_token = ctx.cancellation().clone();
        let inputs = vec![
            ok(Computation::completed(Some(1))),
            ok(Computation::completed(None)),
        ];
        engine.run_choice(ctx, make_scope(), inputs, continuation).await;

        caller_token.cancel().await.unwrap();
        run_jobs_sequential(resources.queue().drain().await, monitor).await;

        match captured.wait().await {
            TaskOutcome::Cancelled(_cause) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(captured.hits(), 1);
    }

    #[tokio::test]
    async fn test_late_hits_are_discarded() {
        let (resources, engine) = test_engine();
        let (ctx, monitor) = root_context(&resources).await;
        let (continuation, captured) = capturing::<Option<i32>>();

        let inputs = vec![
            ok(Computation::completed(Some(1))),
            ok(Computation::completed(Some(2))),
            ok(Computation::completed(Some(3))),
        ];
        engine.run_choice(ctx, make_scope(), inputs, continuation).await;

        // sequential execution makes the first child the deterministic winner
        run_jobs_sequential(resources.queue().drain().await, monitor.clone()).await;

        assert_eq!(captured.wait().await, TaskOutcome::Completed(Some(1)));
        assert_eq!(captured.hits(), 1);
    }
}
