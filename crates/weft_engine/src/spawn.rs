//! Task spawning: submit one computation for independent execution and
//! return an observable handle immediately.
//!
//! Unlike the fan-out combinators, spawning is a direct call: validation
//! failures are returned to the caller, not sent through a continuation.
//! The returned completion source resolves when the task's job eventually
//! runs, on whichever worker picks it up.

use std::sync::Arc;
use weft_core::Fault;
use weft_primitives::{
    CloudJob, Computation, Continuation, DistributedCancellationToken, ExecutionContext, JobKind,
    Payload, ResourceManager, TaskCompletionSource, TaskOutcome, WorkerRef,
};

use crate::engine::ExecutionEngine;
use crate::error::{EngineError, EngineResult};
use crate::scope::JobScope;

impl<R: ResourceManager> ExecutionEngine<R> {
    /// Submit a computation for independent asynchronous execution.
    ///
    /// The task's token is created as a child of `cancellation` when given,
    /// as a fresh root otherwise, and is always elevated. The handle is
    /// returned before the computation runs; it resolves to exactly one
    /// terminal state matching the computation's outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared result type or the computation
    /// closure cannot cross worker boundaries, or if a primitive cannot be
    /// acquired.
    pub async fn start_as_task<T>(
        &self,
        scope: JobScope,
        cancellation: Option<DistributedCancellationToken>,
        target: Option<WorkerRef>,
        computation: Computation<T>,
    ) -> EngineResult<Arc<dyn TaskCompletionSource<T>>>
    where
        T: Payload + Clone,
    {
        if !T::type_portable() {
            return Err(EngineError::ResultTypeNotPortable {
                type_name: std::any::type_name::<T>(),
            });
        }
        if !computation.is_portable() {
            return Err(EngineError::ClosureNotPortable);
        }

        let factory = self.resources().cancellation_factory();
        let parents: Vec<DistributedCancellationToken> = cancellation.into_iter().collect();
        let task_token =
            DistributedCancellationToken::create(factory.as_ref(), &parents, true).await?;
        let source: Arc<dyn TaskCompletionSource<T>> =
            self.resources().request_completion_source().await?;

        let continuation = {
            let on_success = (source.clone(), task_token.clone());
            let on_failure = (source.clone(), task_token.clone());
            let on_cancelled = (source.clone(), task_token.clone());
            Continuation::new(
                move |ctx, value: T| settle(ctx, on_success.0, on_success.1, TaskOutcome::Completed(value)),
                move |ctx, fault| settle(ctx, on_failure.0, on_failure.1, TaskOutcome::Faulted(fault)),
                move |ctx, cause| settle(ctx, on_cancelled.0, on_cancelled.1, TaskOutcome::Cancelled(cause)),
            )
        };

        let job = CloudJob::create(
            scope.dependencies().to_vec(),
            scope.process_id(),
            source.task_id(),
            JobKind::TaskRoot,
            task_token.clone(),
            scope.fault_policy(),
            continuation,
            computation,
        );

        tracing::debug!(task = %source.task_id(), process = %scope.process_id(), "task submitted");
        if let Err(err) = self.resources().job_queue().enqueue(job, target).await {
            // the job never reached the queue; retire the orphaned token
            let _ = task_token.cancel().await;
            return Err(EngineError::Resource(err));
        }

        Ok(source)
    }
}

/// Forward the outcome into the completion source, retire the task token,
/// and end the job.
async fn settle<T: Payload + Clone>(
    ctx: ExecutionContext,
    source: Arc<dyn TaskCompletionSource<T>>,
    token: DistributedCancellationToken,
    outcome: TaskOutcome<T>,
) {
    let write = match outcome {
        TaskOutcome::Completed(value) => {
            if value.portable() {
                source.set_completed(value).await
            } else {
                source.set_faulted(Fault::result_not_portable("spawned task")).await
            }
        }
        TaskOutcome::Faulted(fault) => source.set_faulted(fault).await,
        TaskOutcome::Cancelled(cause) => source.set_cancelled(cause).await,
    };
    if let Err(err) = write {
        ctx.trigger_fault(Fault::resource(err.to_string()));
        return;
    }
    if let Err(err) = token.cancel().await {
        ctx.trigger_fault(Fault::resource(err.to_string()));
        return;
    }
    ctx.trigger_completion();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{root_context, run_jobs_sequential, test_engine, Gated, Opaque};
    use weft_core::{FaultKind, ProcessId, TaskId};
    use weft_primitives::TaskStatus;
    use weft_runtime::{DispatcherConfig, WorkerPool};

    fn make_scope() -> JobScope {
        JobScope::new(ProcessId::new(), TaskId::new())
    }

    #[tokio::test]
    async fn test_handle_returns_before_execution() {
        let (resources, engine) = test_engine();
        let (_ctx, monitor) = root_context(&resources).await;

        let handle = engine
            .start_as_task(make_scope(), None, None, Computation::completed(42))
            .await
            .unwrap();

        // no dispatcher is running: the job is queued, the handle pending
        assert_eq!(handle.status().await.unwrap(), TaskStatus::Pending);
        assert_eq!(resources.queue().len().await, 1);

        run_jobs_sequential(resources.queue().drain().await, monitor).await;
        assert_eq!(handle.wait().await.unwrap(), TaskOutcome::Completed(42));
    }

    #[tokio::test]
    async fn test_result_type_not_portable_is_direct_error() {
        let (resources, engine) = test_engine();

        let result = engine
            .start_as_task(make_scope(), None, None, Computation::completed(Opaque))
            .await;

        assert!(matches!(result, Err(EngineError::ResultTypeNotPortable { .. })));
        assert_eq!(resources.queue().submit_call_count(), 0);
        assert_eq!(resources.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_non_portable_closure_is_direct_error() {
        let (resources, engine) = test_engine();

        let computation: Computation<i32> = Computation::local_only(|ctx, cont| async move {
            cont.success(ctx, 1).await;
        });
        let result = engine.start_as_task(make_scope(), None, None, computation).await;

        assert_eq!(result.err(), Some(EngineError::ClosureNotPortable));
        assert_eq!(resources.queue().submit_call_count(), 0);
    }

    #[tokio::test]
    async fn test_fault_reaches_handle_and_retires_token() {
        let (resources, engine) = test_engine();
        let (_ctx, monitor) = root_context(&resources).await;

        let handle = engine
            .start_as_task(
                make_scope(),
                None,
                None,
                Computation::<i32>::faulted(Fault::application("boom")),
            )
            .await
            .unwrap();

        let jobs = resources.queue().drain().await;
        let task_token = jobs[0].0.cancellation().clone();
        run_jobs_sequential(jobs, monitor).await;

        match handle.wait().await.unwrap() {
            TaskOutcome::Faulted(fault) => assert_eq!(fault.message(), "boom"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(task_token.is_cancelled().await.unwrap());
    }

    #[tokio::test]
    async fn test_non_portable_result_value_faults_the_task() {
        let (resources, engine) = test_engine();
        let (_ctx, monitor) = root_context(&resources).await;

        let handle = engine
            .start_as_task(
                make_scope(),
                None,
                None,
                Computation::completed(Gated { portable: false, value: 3 }),
            )
            .await
            .unwrap();

        run_jobs_sequential(resources.queue().drain().await, monitor).await;

        match handle.wait().await.unwrap() {
            TaskOutcome::Faulted(fault) => assert_eq!(fault.kind(), FaultKind::ResultNotPortable),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_task_under_cancelled_parent_resolves_cancelled() {
        let (resources, engine) = test_engine();
        let (ctx, monitor) = root_context(&resources).await;

        let parent_token = ctx.cancellation().clone();
        parent_token.cancel().await.unwrap();

        let handle = engine
            .start_as_task(make_scope(), Some(parent_token), None, Computation::completed(1))
            .await
            .unwrap();

        run_jobs_sequential(resources.queue().drain().await, monitor).await;

        assert!(handle.wait().await.unwrap().is_cancelled());
    }

    #[tokio::test]
    async fn test_worker_pin_travels_with_the_job() {
        let (resources, engine) = test_engine();
        let pinned = WorkerRef::named("task-host");

        let _handle = engine
            .start_as_task(make_scope(), None, Some(pinned), Computation::completed(1))
            .await
            .unwrap();

        let jobs = resources.queue().drain().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].1, Some(pinned));
        assert_eq!(jobs[0].0.kind(), JobKind::TaskRoot);
    }

    #[tokio::test]
    async fn test_end_to_end_on_worker_pool() {
        let (resources, engine) = test_engine();
        let pool = WorkerPool::start(resources.queue(), DispatcherConfig::new(2));

        let handle = engine
            .start_as_task(make_scope(), None, None, Computation::completed(9))
            .await
            .unwrap();

        assert_eq!(handle.wait().await.unwrap(), TaskOutcome::Completed(9));
        pool.shutdown().await;
    }
}
