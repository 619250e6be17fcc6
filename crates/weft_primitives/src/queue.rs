//! Job queue contract and worker references.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use weft_core::{CoreResult, WorkerId};

use crate::job::CloudJob;

/// Reference to a specific worker, used to pin a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerRef {
    id: WorkerId,
}

impl WorkerRef {
    /// Reference a worker by identity.
    #[must_use]
    pub const fn new(id: WorkerId) -> Self {
        Self { id }
    }

    /// Reference a worker by stable name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self { id: WorkerId::from_name(name) }
    }

    /// The referenced worker identity.
    #[must_use]
    pub const fn id(&self) -> WorkerId {
        self.id
    }
}

impl std::fmt::Display for WorkerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Submission side of the scheduler's job queue.
///
/// `target` pins a job to a specific worker; `None` lets the scheduler
/// place it anywhere. A job is queued at most once.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submit a single job.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue no longer accepts submissions.
    async fn enqueue(&self, job: CloudJob, target: Option<WorkerRef>) -> CoreResult<()>;

    /// Submit a batch of jobs in one call.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue no longer accepts submissions; a
    /// failed batch submits none of its jobs.
    async fn enqueue_batch(&self, batch: Vec<(CloudJob, Option<WorkerRef>)>) -> CoreResult<()>;
}
