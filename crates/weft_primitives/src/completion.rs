//! Task completion sources.
//!
//! A completion source is the externally observable future of a spawned
//! task: it moves from `Pending` to exactly one terminal state and stays
//! there.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use weft_core::{CancellationCause, CoreResult, Fault, TaskId};

use crate::computation::Payload;

/// Observable lifecycle state of a spawned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// The task has not resolved yet.
    Pending,
    /// The task completed with a value.
    Completed,
    /// The task raised an exception.
    Faulted,
    /// The task was cancelled.
    Cancelled,
}

impl TaskStatus {
    /// Whether this state is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Faulted => write!(f, "faulted"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal outcome of a spawned task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    /// The task completed with a value.
    Completed(T),
    /// The task raised an exception.
    Faulted(Fault),
    /// The task was cancelled.
    Cancelled(CancellationCause),
}

impl<T> TaskOutcome<T> {
    /// The status this outcome corresponds to.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        match self {
            Self::Completed(_) => TaskStatus::Completed,
            Self::Faulted(_) => TaskStatus::Faulted,
            Self::Cancelled(_) => TaskStatus::Cancelled,
        }
    }

    /// Whether the task completed with a value.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Whether the task raised an exception.
    #[must_use]
    pub const fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }

    /// Whether the task was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Write-once-per-outcome future for a spawned task.
///
/// The first terminal write wins; later writers observe `false` and leave
/// the recorded outcome untouched.
#[async_trait]
pub trait TaskCompletionSource<T: Payload + Clone>: Send + Sync {
    /// Identifier of the task this source observes.
    fn task_id(&self) -> TaskId;

    /// Record successful completion. Returns `false` if the task had
    /// already resolved.
    async fn set_completed(&self, value: T) -> CoreResult<bool>;

    /// Record an exception. Returns `false` if the task had already
    /// resolved.
    async fn set_faulted(&self, fault: Fault) -> CoreResult<bool>;

    /// Record cancellation. Returns `false` if the task had already
    /// resolved.
    async fn set_cancelled(&self, cause: CancellationCause) -> CoreResult<bool>;

    /// Current lifecycle state.
    async fn status(&self) -> CoreResult<TaskStatus>;

    /// Terminal outcome, if the task has resolved.
    async fn outcome(&self) -> CoreResult<Option<TaskOutcome<T>>>;

    /// Wait until the task resolves and return its outcome.
    async fn wait(&self) -> CoreResult<TaskOutcome<T>>;
}
