//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: a named, synchronous unit of work plus
//! the [`Schedule`] it should run on. The common handle type is
//! [`TaskRef`](crate::TaskRef), an `Arc<dyn Task>` suitable for sharing with a host
//! scheduler.
//!
//! Task bodies are not preemptible. A cancelled task finishes the run in progress;
//! only later runs are suppressed.

use crate::error::TaskError;
use crate::tasks::schedule::Schedule;

/// # Schedulable unit of work.
///
/// # Example
/// ```
/// use tickwork::{Schedule, Task, TaskError};
///
/// struct Autosave;
///
/// impl Task for Autosave {
///     fn name(&self) -> &str { "autosave" }
///
///     fn schedule(&self) -> Schedule {
///         Schedule::Periodic { delay: 100, period: 6000 }
///     }
///
///     fn run(&self) -> Result<(), TaskError> {
///         // flush state...
///         Ok(())
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Timing of the task. Read once, when the task is bound to a scheduler.
    fn schedule(&self) -> Schedule {
        Schedule::Immediate
    }

    /// Executes one run of the task.
    fn run(&self) -> Result<(), TaskError>;
}
