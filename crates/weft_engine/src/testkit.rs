//! Shared helpers for combinator tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, Notify};
use weft_core::{Fault, WorkerId};
use weft_primitives::{
    CloudJob, Computation, Continuation, ExecutionContext, Payload, TaskOutcome, WorkerRef,
};
use weft_runtime::{CountingMonitor, InMemoryResourceManager};

use crate::engine::ExecutionEngine;

/// Records which continuation arm fired, how often, and with what payload.
pub(crate) struct Captured<T> {
    state: Mutex<Option<TaskOutcome<T>>>,
    notify: Notify,
    hits: AtomicUsize,
}

impl<T: Clone + Send + 'static> Captured<T> {
    async fn record(&self, outcome: TaskOutcome<T>) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().await = Some(outcome);
        self.notify.notify_waiters();
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub(crate) async fn outcome(&self) -> Option<TaskOutcome<T>> {
        self.state.lock().await.clone()
    }

    pub(crate) async fn wait(&self) -> TaskOutcome<T> {
        loop {
            let notified = self.notify.notified();
            if let Some(outcome) = self.state.lock().await.clone() {
                return outcome;
            }
            notified.await;
        }
    }
}

/// A continuation whose three arms record into a shared `Captured`.
pub(crate) fn capturing<T: Payload + Clone>() -> (Continuation<T>, Arc<Captured<T>>) {
    let captured = Arc::new(Captured {
        state: Mutex::new(None),
        notify: Notify::new(),
        hits: AtomicUsize::new(0),
    });

    let on_success = captured.clone();
    let on_failure = captured.clone();
    let on_cancelled = captured.clone();
    let continuation = Continuation::new(
        move |_ctx, value: T| async move { on_success.record(TaskOutcome::Completed(value)).await },
        move |_ctx, fault| async move { on_failure.record(TaskOutcome::Faulted(fault)).await },
        move |_ctx, cause| async move { on_cancelled.record(TaskOutcome::Cancelled(cause)).await },
    );

    (continuation, captured)
}

pub(crate) fn test_engine() -> (Arc<InMemoryResourceManager>, ExecutionEngine<InMemoryResourceManager>)
{
    let resources = Arc::new(InMemoryResourceManager::new());
    let engine = ExecutionEngine::new(resources.clone());
    (resources, engine)
}

pub(crate) async fn root_context(
    resources: &InMemoryResourceManager,
) -> (ExecutionContext, Arc<CountingMonitor>) {
    let monitor = Arc::new(CountingMonitor::new());
    let ctx = resources
        .root_context(monitor.clone(), WorkerId::new())
        .await
        .unwrap();
    (ctx, monitor)
}

pub(crate) fn ok<T: Payload>(
    computation: Computation<T>,
) -> Result<(Computation<T>, Option<WorkerRef>), Fault> {
    Ok((computation, None))
}

/// Execute drained jobs one by one, in the given order.
pub(crate) async fn run_jobs_sequential(
    jobs: Vec<(CloudJob, Option<WorkerRef>)>,
    monitor: Arc<CountingMonitor>,
) {
    for (job, _target) in jobs {
        let ctx = ExecutionContext::new(monitor.clone(), WorkerId::new(), job.cancellation().clone());
        job.execute(ctx).await;
    }
}

/// Execute drained jobs on concurrent tasks and wait for all of them.
pub(crate) async fn run_jobs_concurrent(
    jobs: Vec<(CloudJob, Option<WorkerRef>)>,
    monitor: Arc<CountingMonitor>,
) {
    let mut handles = Vec::new();
    for (job, _target) in jobs {
        let monitor = monitor.clone();
        handles.push(tokio::spawn(async move {
            let ctx = ExecutionContext::new(monitor, WorkerId::new(), job.cancellation().clone());
            job.execute(ctx).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

/// Payload whose type can never cross a worker boundary.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Opaque;

impl Payload for Opaque {
    fn type_portable() -> bool {
        false
    }
}

/// Payload whose portability is decided per value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Gated {
    pub(crate) portable: bool,
    pub(crate) value: i32,
}

impl Payload for Gated {
    fn portable(&self) -> bool {
        self.portable
    }
}
