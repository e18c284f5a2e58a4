//! # Host scheduling.
//!
//! - [`HostScheduler`] - contract the crate needs from the host
//! - [`Job`], [`TaskId`], [`SchedulerRef`] - contract vocabulary
//! - [`TickScheduler`] - reference host: tick-thread queue, tokio background pool
//!   and a fixed-cadence loop

mod scheduler;
mod tick_scheduler;

pub use scheduler::{HostScheduler, Job, SchedulerRef, TaskId};
pub use tick_scheduler::TickScheduler;
