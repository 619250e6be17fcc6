//! Cloud jobs: the schedulable unit produced by a combinator.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use weft_core::{CancellationCause, FaultPolicy, JobId, ProcessId, TaskId};

use crate::cancellation::DistributedCancellationToken;
use crate::computation::{Computation, Payload};
use crate::context::ExecutionContext;
use crate::continuation::Continuation;

/// Role of a job within the workflow that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Root job of a spawned task.
    TaskRoot,
    /// Child of a parallel fan-out, carrying its input index.
    ParallelChild {
        /// Input index of the sub-computation.
        index: usize,
    },
    /// Child of a choice fan-out, carrying its input index.
    ChoiceChild {
        /// Input index of the sub-computation.
        index: usize,
    },
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskRoot => write!(f, "task-root"),
            Self::ParallelChild { index } => write!(f, "parallel-child[{}]", index),
            Self::ChoiceChild { index } => write!(f, "choice-child[{}]", index),
        }
    }
}

type JobWork = Box<dyn FnOnce(ExecutionContext) -> BoxFuture<'static, ()> + Send>;

/// A schedulable unit of work.
///
/// Immutable once created and queued at most once. The work thunk closes
/// over the computation and its continuation; dequeue-time execution first
/// checks the job token and routes to the cancellation arm if it is
/// already set.
pub struct CloudJob {
    job_id: JobId,
    process_id: ProcessId,
    parent_task: TaskId,
    dependencies: Vec<JobId>,
    kind: JobKind,
    cancellation: DistributedCancellationToken,
    fault_policy: FaultPolicy,
    work: JobWork,
}

impl CloudJob {
    /// Build a job from a computation and its continuation.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn create<T: Payload>(
        dependencies: Vec<JobId>,
        process_id: ProcessId,
        parent_task: TaskId,
        kind: JobKind,
        cancellation: DistributedCancellationToken,
        fault_policy: FaultPolicy,
        continuation: Continuation<T>,
        computation: Computation<T>,
    ) -> Self {
        let job_id = JobId::new();
        let token = cancellation.clone();
        let work: JobWork = Box::new(move |ctx: ExecutionContext| {
            Box::pin(async move {
                let ctx = ctx.with_cancellation(token.clone());
                let already_cancelled = matches!(token.is_cancelled().await, Ok(true));
                if already_cancelled {
                    tracing::trace!(job = %job_id, "job token set before start");
                    continuation.cancelled(ctx, CancellationCause::token_set()).await;
                } else {
                    computation.run(ctx, continuation).await;
                }
            })
        });

        Self {
            job_id,
            process_id,
            parent_task,
            dependencies,
            kind,
            cancellation,
            fault_policy,
            work,
        }
    }

    /// Identifier of this job.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Workflow execution this job belongs to.
    #[must_use]
    pub const fn process_id(&self) -> ProcessId {
        self.process_id
    }

    /// Task under which this job was produced.
    #[must_use]
    pub const fn parent_task(&self) -> TaskId {
        self.parent_task
    }

    /// Jobs this job depends on.
    #[must_use]
    pub fn dependencies(&self) -> &[JobId] {
        &self.dependencies
    }

    /// Role of this job within its workflow.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.kind
    }

    /// Cancellation token governing this job.
    #[must_use]
    pub fn cancellation(&self) -> &DistributedCancellationToken {
        &self.cancellation
    }

    /// Fault policy to hand to the scheduler; never interpreted here.
    #[must_use]
    pub const fn fault_policy(&self) -> FaultPolicy {
        self.fault_policy
    }

    /// Execute the job on the hosting worker.
    pub async fn execute(self, ctx: ExecutionContext) {
        (self.work)(ctx).await;
    }
}

impl std::fmt::Debug for CloudJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudJob")
            .field("job_id", &self.job_id)
            .field("process_id", &self.process_id)
            .field("parent_task", &self.parent_task)
            .field("kind", &self.kind)
            .field("fault_policy", &self.fault_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::JobMonitor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use weft_core::{Fault, WorkerId};

    struct NoopMonitor;

    impl JobMonitor for NoopMonitor {
        fn trigger_completion(&self) {}
        fn trigger_fault(&self, _fault: Fault) {}
    }

    fn make_test_context(token: DistributedCancellationToken) -> ExecutionContext {
        ExecutionContext::new(Arc::new(NoopMonitor), WorkerId::new(), token)
    }

    fn make_counting_continuation(
        successes: Arc<AtomicUsize>,
        cancellations: Arc<AtomicUsize>,
    ) -> Continuation<i32> {
        Continuation::new(
            move |_ctx, _value: i32| async move {
                successes.fetch_add(1, Ordering::SeqCst);
            },
            |_ctx, _fault| async {},
            move |_ctx, _cause| async move {
                cancellations.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    #[test]
    fn test_job_kind_display() {
        assert_eq!(format!("{}", JobKind::TaskRoot), "task-root");
        assert_eq!(format!("{}", JobKind::ParallelChild { index: 2 }), "parallel-child[2]");
        assert_eq!(format!("{}", JobKind::ChoiceChild { index: 0 }), "choice-child[0]");
    }

    #[tokio::test]
    async fn test_job_runs_computation() {
        let successes = Arc::new(AtomicUsize::new(0));
        let cancellations = Arc::new(AtomicUsize::new(0));
        let token = DistributedCancellationToken::detached();

        let job = CloudJob::create(
            Vec::new(),
            ProcessId::new(),
            TaskId::new(),
            JobKind::TaskRoot,
            token.clone(),
            FaultPolicy::default(),
            make_counting_continuation(successes.clone(), cancellations.clone()),
            Computation::completed(5),
        );

        job.execute(make_test_context(token)).await;
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(cancellations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_job_observes_preset_cancellation() {
        let successes = Arc::new(AtomicUsize::new(0));
        let cancellations = Arc::new(AtomicUsize::new(0));
        let token = DistributedCancellationToken::detached();
        token.cancel().await.unwrap();

        let job = CloudJob::create(
            Vec::new(),
            ProcessId::new(),
            TaskId::new(),
            JobKind::ParallelChild { index: 0 },
            token.clone(),
            FaultPolicy::default(),
            make_counting_continuation(successes.clone(), cancellations.clone()),
            Computation::completed(5),
        );

        job.execute(make_test_context(token)).await;
        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert_eq!(cancellations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_job_rebinds_context_token() {
        let token = DistributedCancellationToken::detached();
        let expected = token.id();

        let observed = Arc::new(std::sync::Mutex::new(None));
        let sink = observed.clone();
        let computation = Computation::new(move |ctx: ExecutionContext, cont| async move {
            *sink.lock().unwrap() = Some(ctx.cancellation().id());
            cont.success(ctx, 0i32).await;
        });

        let job = CloudJob::create(
            Vec::new(),
            ProcessId::new(),
            TaskId::new(),
            JobKind::TaskRoot,
            token,
            FaultPolicy::default(),
            Continuation::new(
                |_ctx, _value: i32| async {},
                |_ctx, _fault| async {},
                |_ctx, _cause| async {},
            ),
            computation,
        );

        // context carries an unrelated token; execution must rebind to the job's
        let foreign = DistributedCancellationToken::detached();
        job.execute(make_test_context(foreign)).await;

        assert_eq!(*observed.lock().unwrap(), Some(expected));
    }

    #[test]
    fn test_job_metadata() {
        let deps = vec![JobId::new(), JobId::new()];
        let process = ProcessId::new();
        let task = TaskId::new();

        let job = CloudJob::create(
            deps.clone(),
            process,
            task,
            JobKind::ChoiceChild { index: 1 },
            DistributedCancellationToken::detached(),
            FaultPolicy::Retry { max_attempts: 2 },
            Continuation::new(
                |_ctx, _value: i32| async {},
                |_ctx, _fault| async {},
                |_ctx, _cause| async {},
            ),
            Computation::completed(0),
        );

        assert_eq!(job.dependencies(), deps.as_slice());
        assert_eq!(job.process_id(), process);
        assert_eq!(job.parent_task(), task);
        assert_eq!(job.kind(), JobKind::ChoiceChild { index: 1 });
        assert_eq!(job.fault_policy(), FaultPolicy::Retry { max_attempts: 2 });
    }
}
