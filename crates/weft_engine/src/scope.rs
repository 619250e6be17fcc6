//! Scheduling scope carried into every job a combinator builds.

use weft_core::{FaultPolicy, JobId, ProcessId, TaskId};

/// Scheduling metadata for the jobs of one combinator invocation.
///
/// The fault policy is handed to the scheduler unmodified; the engine
/// never interprets it.
#[derive(Debug, Clone)]
pub struct JobScope {
    process_id: ProcessId,
    parent_task: TaskId,
    dependencies: Vec<JobId>,
    fault_policy: FaultPolicy,
}

impl JobScope {
    /// Create a scope for the given workflow execution and task.
    #[must_use]
    pub fn new(process_id: ProcessId, parent_task: TaskId) -> Self {
        Self {
            process_id,
            parent_task,
            dependencies: Vec::new(),
            fault_policy: FaultPolicy::default(),
        }
    }

    /// Set the jobs these jobs depend on.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<JobId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Set the fault policy carried on each job.
    #[must_use]
    pub fn with_fault_policy(mut self, fault_policy: FaultPolicy) -> Self {
        self.fault_policy = fault_policy;
        self
    }

    /// Workflow execution the jobs belong to.
    #[must_use]
    pub const fn process_id(&self) -> ProcessId {
        self.process_id
    }

    /// Task under which the jobs are produced.
    #[must_use]
    pub const fn parent_task(&self) -> TaskId {
        self.parent_task
    }

    /// Jobs the produced jobs depend on.
    #[must_use]
    pub fn dependencies(&self) -> &[JobId] {
        &self.dependencies
    }

    /// Fault policy carried on each produced job.
    #[must_use]
    pub const fn fault_policy(&self) -> FaultPolicy {
        self.fault_policy
    }
}
