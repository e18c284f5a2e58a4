//! # Host scheduler contract.
//!
//! The real-time host owns the tick thread and a background pool. Everything in this
//! crate that needs deferred or repeated execution goes through [`HostScheduler`]:
//!
//! - `schedule(job, mode, schedule)` arms a job and returns its [`TaskId`];
//! - `cancel(id)` suppresses future runs (best effort, never preemptive);
//! - `is_scheduled(id)` reports whether a job is still armed.
//!
//! [`TickScheduler`](crate::TickScheduler) is the reference implementation.

use std::fmt;
use std::sync::Arc;

use crate::error::SchedulerError;
use crate::tasks::{ExecutionMode, Schedule};

/// Type-erased body handed to the host; called once per run.
pub type Job = Arc<dyn Fn() + Send + Sync + 'static>;

/// Host-issued identity of an armed job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Wraps a raw host id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Scheduling facility offered by the host.
pub trait HostScheduler: Send + Sync + 'static {
    /// Arms `job` according to `schedule` in `mode`.
    fn schedule(
        &self,
        job: Job,
        mode: ExecutionMode,
        schedule: Schedule,
    ) -> Result<TaskId, SchedulerError>;

    /// Cancels the job with `id`.
    ///
    /// Returns `false` if it is unknown or already finished. A run in progress is
    /// not interrupted.
    fn cancel(&self, id: TaskId) -> bool;

    /// True while the job with `id` may still run.
    fn is_scheduled(&self, id: TaskId) -> bool;
}

/// Shared reference to a host scheduler.
pub type SchedulerRef = Arc<dyn HostScheduler>;
