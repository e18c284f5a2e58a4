//! # Run a single execution of a task.
//!
//! Wraps one [`Task::run`] call with panic isolation and logging, and turns a
//! [`TaskRef`] into the type-erased [`Job`] a host scheduler stores.
//!
//! ## Flow
//! ```text
//! Success:
//!   task.run() → Ok(())          → trace!
//!
//! Failure:
//!   task.run() → Err(Fail)       → error!(task, mode, label, error)
//!
//! Panic:
//!   task.run() → unwind          → Err(Panicked) → error!(task, mode, label, error)
//! ```
//!
//! ## Rules
//! - A failing or panicking run never unwinds into the scheduler.
//! - One failed run does not cancel later runs of a periodic task.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{error, trace};

use crate::error::{TaskError, panic_message};
use crate::host::Job;
use crate::tasks::{ExecutionMode, Task, TaskRef};

/// Executes one run of `task`, catching errors and panics.
pub fn run_once<T: Task + ?Sized>(task: &T, mode: ExecutionMode) -> Result<(), TaskError> {
    let res = match catch_unwind(AssertUnwindSafe(|| task.run())) {
        Ok(res) => res,
        Err(panic) => Err(TaskError::Panicked {
            message: panic_message(panic.as_ref()),
        }),
    };

    match &res {
        Ok(()) => trace!(task = %task.name(), mode = %mode, "task run finished"),
        Err(e) => error!(
            task = %task.name(),
            mode = %mode,
            label = e.as_label(),
            error = %e.as_message(),
            "task run failed"
        ),
    }
    res
}

/// Builds the scheduler job that runs `task` once per invocation.
pub fn job_for(task: TaskRef, mode: ExecutionMode) -> Job {
    Arc::new(move || {
        let _ = run_once(task.as_ref(), mode);
    })
}
