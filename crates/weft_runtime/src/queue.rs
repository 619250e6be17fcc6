//! In-memory job queue with worker affinity.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, Notify};
use weft_core::CoreResult;
use weft_primitives::{CloudJob, JobQueue, WorkerRef};

/// FIFO queue of `(job, optional worker pin)` pairs.
///
/// Submission-call and job counts are tracked so callers can assert that a
/// code path never touched the queue.
#[derive(Default)]
pub struct InMemoryJobQueue {
    inner: Mutex<VecDeque<(CloudJob, Option<WorkerRef>)>>,
    notify: Notify,
    submit_calls: AtomicU64,
    jobs_submitted: AtomicU64,
}

impl InMemoryJobQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the first job the given worker may run: pinned to
    /// it, or not pinned at all.
    pub async fn dequeue_for(&self, worker: WorkerRef) -> Option<(CloudJob, Option<WorkerRef>)> {
        let mut inner = self.inner.lock().await;
        let position = inner
            .iter()
            .position(|(_, target)| target.is_none() || *target == Some(worker));
        position.and_then(|index| inner.remove(index))
    }

    /// Remove and return all queued jobs, preserving submission order.
    pub async fn drain(&self) -> Vec<(CloudJob, Option<WorkerRef>)> {
        let mut inner = self.inner.lock().await;
        inner.drain(..).collect()
    }

    /// Wait until new work may be available.
    pub async fn changed(&self) {
        self.notify.notified().await;
    }

    /// Wake all waiting workers.
    pub fn wake_all(&self) {
        self.notify.notify_waiters();
    }

    /// Number of jobs currently queued.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether the queue is currently empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// Number of submission calls (a batch counts once).
    #[must_use]
    pub fn submit_call_count(&self) -> u64 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Total jobs ever submitted.
    #[must_use]
    pub fn jobs_submitted(&self) -> u64 {
        self.jobs_submitted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: CloudJob, target: Option<WorkerRef>) -> CoreResult<()> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.jobs_submitted.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(job = %job.job_id(), kind = %job.kind(), "job enqueued");
        self.inner.lock().await.push_back((job, target));
        self.notify.notify_waiters();
        Ok(())
    }

    async fn enqueue_batch(&self, batch: Vec<(CloudJob, Option<WorkerRef>)>) -> CoreResult<()> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.jobs_submitted.fetch_add(batch.len() as u64, Ordering::SeqCst);
        tracing::trace!(jobs = batch.len(), "batch enqueued");
        self.inner.lock().await.extend(batch);
        self.notify.notify_waiters();
        Ok(())
    }
}
