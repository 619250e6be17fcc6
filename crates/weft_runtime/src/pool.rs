//! Local worker pool driving queued jobs on tokio tasks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use weft_core::Fault;
use weft_primitives::{ExecutionContext, JobMonitor, WorkerRef};

use crate::queue::InMemoryJobQueue;

/// Job execution monitor that counts completion and fault signals.
#[derive(Default)]
pub struct CountingMonitor {
    completions: AtomicU64,
    faults: AtomicU64,
    last_fault: Mutex<Option<Fault>>,
}

impl CountingMonitor {
    /// Create a monitor with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Completion signals received so far.
    #[must_use]
    pub fn completions(&self) -> u64 {
        self.completions.load(Ordering::SeqCst)
    }

    /// Fault signals received so far.
    #[must_use]
    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::SeqCst)
    }

    /// The most recent fault signal, if any.
    #[must_use]
    pub fn last_fault(&self) -> Option<Fault> {
        match self.last_fault.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl JobMonitor for CountingMonitor {
    fn trigger_completion(&self) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }

    fn trigger_fault(&self, fault: Fault) {
        self.faults.fetch_add(1, Ordering::SeqCst);
        match self.last_fault.lock() {
            Ok(mut guard) => *guard = Some(fault),
            Err(poisoned) => *poisoned.into_inner() = Some(fault),
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Number of simulated workers.
    pub workers: usize,
    /// Idle poll interval when no wake signal arrives.
    pub idle_poll: Duration,
}

impl DispatcherConfig {
    /// Create a config with the given worker count.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self { workers, idle_poll: Duration::from_millis(10) }
    }

    /// Set the number of workers.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Pool statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of workers in the pool.
    pub workers: usize,
    /// Jobs picked up by the pool.
    pub jobs_started: u64,
    /// Completion signals received.
    pub completions: u64,
    /// Fault signals received.
    pub faults: u64,
}

/// Pool of simulated workers.
///
/// Each worker loops dequeue → build context → drive the job's work thunk.
/// Workers only pick up jobs pinned to them or not pinned at all.
pub struct WorkerPool {
    queue: Arc<InMemoryJobQueue>,
    monitor: Arc<CountingMonitor>,
    worker_refs: Vec<WorkerRef>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    jobs_started: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawn the pool's workers.
    #[must_use]
    pub fn start(queue: Arc<InMemoryJobQueue>, config: DispatcherConfig) -> Self {
        let monitor = Arc::new(CountingMonitor::new());
        let jobs_started = Arc::new(AtomicU64::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut worker_refs = Vec::with_capacity(config.workers);
        let mut handles = Vec::with_capacity(config.workers);

        for index in 0..config.workers {
            let worker = WorkerRef::named(&format!("pool-worker-{index}"));
            worker_refs.push(worker);

            let queue = queue.clone();
            let monitor = monitor.clone();
            let jobs_started = jobs_started.clone();
            let shutdown = shutdown.clone();
            let idle_poll = config.idle_poll;

            handles.push(tokio::spawn(async move {
                Self::worker_loop(queue, monitor, worker, jobs_started, shutdown, idle_poll).await;
            }));
        }

        tracing::debug!(workers = config.workers, "worker pool started");
        Self { queue, monitor, worker_refs, handles, jobs_started, shutdown }
    }

    async fn worker_loop(
        queue: Arc<InMemoryJobQueue>,
        monitor: Arc<CountingMonitor>,
        worker: WorkerRef,
        jobs_started: Arc<AtomicU64>,
        shutdown: Arc<AtomicBool>,
        idle_poll: Duration,
    ) {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                break;
            }

            match queue.dequeue_for(worker).await {
                Some((job, _target)) => {
                    jobs_started.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(job = %job.job_id(), worker = %worker, "job picked up");
                    let ctx = ExecutionContext::new(
                        monitor.clone(),
                        worker.id(),
                        job.cancellation().clone(),
                    );
                    job.execute(ctx).await;
                }
                None => {
                    tokio::select! {
                        () = queue.changed() => {}
                        () = tokio::time::sleep(idle_poll) => {}
                    }
                }
            }
        }
    }

    /// The workers' shared job monitor.
    #[must_use]
    pub fn monitor(&self) -> &Arc<CountingMonitor> {
        &self.monitor
    }

    /// References to the pool's workers, in spawn order.
    #[must_use]
    pub fn worker_refs(&self) -> &[WorkerRef] {
        &self.worker_refs
    }

    /// Snapshot of pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.worker_refs.len(),
            jobs_started: self.jobs_started.load(Ordering::SeqCst),
            completions: self.monitor.completions(),
            faults: self.monitor.faults(),
        }
    }

    /// Stop all workers and wait for their loops to exit.
    pub async fn shutdown(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.queue.wake_all();
        for handle in self.handles {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "worker task ended abnormally");
            }
        }
        tracing::debug!("worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use weft_core::{FaultPolicy, ProcessId, TaskId, WorkerId};
    use weft_primitives::{
        CloudJob, Computation, Continuation, DistributedCancellationToken, JobKind, JobQueue,
    };

    fn make_recording_job(
        executed_on: Arc<Mutex<Vec<WorkerId>>>,
        completions: Arc<AtomicUsize>,
    ) -> CloudJob {
        let computation = Computation::new(move |ctx: ExecutionContext, cont| async move {
            match executed_on.lock() {
                Ok(mut guard) => guard.push(ctx.worker_id()),
                Err(poisoned) => poisoned.into_inner().push(ctx.worker_id()),
            }
            cont.success(ctx, 1i32).await;
        });

        CloudJob::create(
            Vec::new(),
            ProcessId::new(),
            TaskId::new(),
            JobKind::TaskRoot,
            DistributedCancellationToken::detached(),
            FaultPolicy::default(),
            Continuation::new(
                move |ctx: ExecutionContext, _value: i32| async move {
                    completions.fetch_add(1, Ordering::SeqCst);
                    ctx.trigger_completion();
                },
                |_ctx, _fault| async {},
                |_ctx, _cause| async {},
            ),
            computation,
        )
    }

    #[tokio::test]
    async fn test_pool_executes_queued_jobs() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let pool = WorkerPool::start(queue.clone(), DispatcherConfig::new(2));

        let executed_on = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            queue
                .enqueue(make_recording_job(executed_on.clone(), completions.clone()), None)
                .await
                .unwrap();
        }

        while completions.load(Ordering::SeqCst) < 5 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let stats = pool.stats();
        assert_eq!(stats.jobs_started, 5);
        assert_eq!(stats.completions, 5);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_pinned_job_runs_on_target_worker() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let pool = WorkerPool::start(queue.clone(), DispatcherConfig::new(3));
        let target = pool.worker_refs()[1];

        let executed_on = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(AtomicUsize::new(0));
        queue
            .enqueue(
                make_recording_job(executed_on.clone(), completions.clone()),
                Some(target),
            )
            .await
            .unwrap();

        while completions.load(Ordering::SeqCst) < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let observed = executed_on.lock().unwrap().clone();
        assert_eq!(observed, vec![target.id()]);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_workers() {
        let queue = Arc::new(InMemoryJobQueue::new());
        let pool = WorkerPool::start(queue.clone(), DispatcherConfig::new(2));
        pool.shutdown().await;

        // jobs submitted after shutdown stay queued
        let executed_on = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(AtomicUsize::new(0));
        queue
            .enqueue(make_recording_job(executed_on, completions.clone()), None)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert_eq!(queue.len().await, 1);
    }
}
