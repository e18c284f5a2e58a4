//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn() -> Result<(), TaskError>` together with a
//! [`Schedule`]. Every run calls the same closure; state that must survive between
//! runs of a periodic task goes into the closure explicitly as `Arc<...>`.
//!
//! ## Example
//! ```rust
//! use tickwork::{Schedule, TaskFn, TaskRef, TaskError};
//!
//! let t: TaskRef = TaskFn::arc("announce", Schedule::Delayed { delay: 40 }, || {
//!     // do work...
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(t.name(), "announce");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::schedule::Schedule;
use crate::tasks::task::Task;

/// Shared reference to a task.
pub type TaskRef = Arc<dyn Task>;

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    schedule: Schedule,
    f: F,
}

impl<F> TaskFn<F>
where
    F: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
{
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, schedule: Schedule, f: F) -> Self {
        Self {
            name: name.into(),
            schedule,
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, schedule: Schedule, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, schedule, f))
    }

    /// Shorthand for an [`Immediate`](Schedule::Immediate) task.
    pub fn once(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Self::arc(name, Schedule::Immediate, f)
    }
}

impl<F> Task for TaskFn<F>
where
    F: Fn() -> Result<(), TaskError> + Send + Sync + 'static, // Fn, not FnMut
{
    fn name(&self) -> &str {
        &self.name
    }

    fn schedule(&self) -> Schedule {
        self.schedule
    }

    fn run(&self) -> Result<(), TaskError> {
        (self.f)()
    }
}
