//! In-memory task completion source.

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use weft_core::{CancellationCause, CoreResult, Fault, TaskId};
use weft_primitives::{Payload, TaskCompletionSource, TaskOutcome, TaskStatus};

/// Completion source backed by a mutex-guarded terminal outcome.
///
/// First terminal write wins; `wait` parks on a notify until resolution.
pub struct InMemoryCompletionSource<T> {
    task_id: TaskId,
    state: Mutex<Option<TaskOutcome<T>>>,
    notify: Notify,
}

impl<T> InMemoryCompletionSource<T> {
    /// Create a pending completion source for a fresh task.
    #[must_use]
    pub fn new() -> Self {
        Self {
            task_id: TaskId::new(),
            state: Mutex::new(None),
            notify: Notify::new(),
        }
    }
}

impl<T> Default for InMemoryCompletionSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload + Clone> InMemoryCompletionSource<T> {
    async fn resolve(&self, outcome: TaskOutcome<T>) -> CoreResult<bool> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            return Ok(false);
        }
        *state = Some(outcome);
        drop(state);
        self.notify.notify_waiters();
        Ok(true)
    }
}

#[async_trait]
impl<T: Payload + Clone> TaskCompletionSource<T> for InMemoryCompletionSource<T> {
    fn task_id(&self) -> TaskId {
        self.task_id
    }

    async fn set_completed(&self, value: T) -> CoreResult<bool> {
        self.resolve(TaskOutcome::Completed(value)).await
    }

    async fn set_faulted(&self, fault: Fault) -> CoreResult<bool> {
        self.resolve(TaskOutcome::Faulted(fault)).await
    }

    async fn set_cancelled(&self, cause: CancellationCause) -> CoreResult<bool> {
        self.resolve(TaskOutcome::Cancelled(cause)).await
    }

    async fn status(&self) -> CoreResult<TaskStatus> {
        let state = self.state.lock().await;
        Ok(state.as_ref().map_or(TaskStatus::Pending, TaskOutcome::status))
    }

    async fn outcome(&self) -> CoreResult<Option<TaskOutcome<T>>> {
        Ok(self.state.lock().await.clone())
    }

    async fn wait(&self) -> CoreResult<TaskOutcome<T>> {
        loop {
            let notified = self.notify.notified();
            if let Some(outcome) = self.state.lock().await.clone() {
                return Ok(outcome);
            }
            notified.await;
        }
    }
}
