//! # Task abstractions and subscriptions.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for schedulable synchronous work
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`Schedule`], [`ExecutionMode`], [`Strategy`] - when and where a task runs
//! - [`TaskSubscription`] - a task armed on the host scheduler

mod schedule;
mod subscription;
mod task;
mod task_fn;

pub use schedule::{ExecutionMode, Schedule, Strategy};
pub use subscription::TaskSubscription;
pub use task::Task;
pub use task_fn::{TaskFn, TaskRef};
