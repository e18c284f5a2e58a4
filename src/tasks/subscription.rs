//! # TaskSubscription: one task bound to the host scheduler.
//!
//! Construction picks one of six [`Strategy`] values from the task's [`Schedule`]
//! and the requested [`ExecutionMode`], arms the task on the host and keeps the
//! returned [`TaskId`].
//!
//! ## Lifecycle
//! ```text
//! new(scheduler, task, mode) ──► scheduler.schedule(job, mode, schedule) ──► task_id
//!                                 (armed; runs on its own schedule)
//! start() ──► scheduler.schedule(job, mode, Immediate)   (one extra run)
//!         └─► active = true                               (only if the host accepted)
//! stop()  ──► active = false
//!         └─► cancel(task_id), cancel(extra run)          (no-op if already done)
//! ```
//!
//! ## Rules
//! - The task is armed at construction, so `start()` makes it run one additional
//!   time on top of its schedule.
//! - `stop()` never interrupts a run in progress.
//! - Dropping a subscription does not cancel it; call `stop()`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::core::runner::job_for;
use crate::error::CoreError;
use crate::host::{Job, SchedulerRef, TaskId};
use crate::tasks::schedule::{ExecutionMode, Schedule, Strategy};
use crate::tasks::task_fn::TaskRef;

/// Handle to an armed task.
pub struct TaskSubscription {
    task: TaskRef,
    mode: ExecutionMode,
    schedule: Schedule,
    scheduler: SchedulerRef,
    job: Job,
    task_id: TaskId,
    extra: Mutex<Option<TaskId>>,
    active: AtomicBool,
}

impl TaskSubscription {
    /// Arms `task` on `scheduler` in `mode`.
    ///
    /// Fails with [`CoreError::Scheduler`] if the host rejects the registration.
    pub fn new(
        scheduler: SchedulerRef,
        task: TaskRef,
        mode: ExecutionMode,
    ) -> Result<Self, CoreError> {
        let schedule = task.schedule();
        let job = job_for(TaskRef::clone(&task), mode);
        let task_id = scheduler.schedule(Job::clone(&job), mode, schedule)?;

        debug!(
            task = %task.name(),
            task_id = %task_id,
            strategy = %Strategy::select(schedule, mode),
            "task subscription armed"
        );
        Ok(Self {
            task,
            mode,
            schedule,
            scheduler,
            job,
            task_id,
            extra: Mutex::new(None),
            active: AtomicBool::new(false),
        })
    }

    /// Marks the subscription active and requests one extra immediate run in the
    /// same execution mode.
    ///
    /// The subscription stays inactive if the host rejects the extra run.
    pub fn start(&self) -> Result<(), CoreError> {
        let id = self
            .scheduler
            .schedule(Job::clone(&self.job), self.mode, Schedule::Immediate)?;

        if let Some(previous) = self.extra.lock().replace(id) {
            self.scheduler.cancel(previous);
        }
        self.active.store(true, Ordering::Release);
        debug!(
            task = %self.task.name(),
            task_id = %self.task_id,
            extra = %id,
            "task subscription started"
        );
        Ok(())
    }

    /// Marks the subscription inactive and cancels the armed task and any pending
    /// extra run.
    ///
    /// Returns `true` if something was still armed.
    pub fn stop(&self) -> bool {
        self.active.store(false, Ordering::Release);
        let mut cancelled = self.scheduler.cancel(self.task_id);
        if let Some(extra) = self.extra.lock().take() {
            cancelled |= self.scheduler.cancel(extra);
        }
        debug!(
            task = %self.task.name(),
            task_id = %self.task_id,
            cancelled,
            "task subscription stopped"
        );
        cancelled
    }

    /// The wrapped task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Execution mode chosen at construction.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// True for background execution.
    pub fn is_async(&self) -> bool {
        self.mode.is_async()
    }

    /// Host id of the armed task.
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Schedule resolved at construction.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Strategy selected at construction.
    pub fn strategy(&self) -> Strategy {
        Strategy::select(self.schedule, self.mode)
    }

    /// True between `start()` and `stop()`.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// True while the host may still run the armed task.
    pub fn is_scheduled(&self) -> bool {
        self.scheduler.is_scheduled(self.task_id)
    }

    /// True while either the armed task or the extra run from `start()` is pending.
    pub(crate) fn has_pending_runs(&self) -> bool {
        self.is_scheduled()
            || self
                .extra
                .lock()
                .as_ref()
                .is_some_and(|extra| self.scheduler.is_scheduled(*extra))
    }
}

impl fmt::Debug for TaskSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSubscription")
            .field("task", &self.task.name())
            .field("task_id", &self.task_id)
            .field("strategy", &self.strategy())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::config::Config;
    use crate::error::{SchedulerError, TaskError};
    use crate::host::{HostScheduler, TickScheduler};
    use crate::tasks::TaskFn;

    fn counting(schedule: Schedule, hits: &Arc<AtomicUsize>) -> TaskRef {
        let hits = Arc::clone(hits);
        TaskFn::arc("count", schedule, move || {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn host() -> (Arc<TickScheduler>, SchedulerRef) {
        let sched = Arc::new(TickScheduler::new(Config::default()));
        let as_ref: SchedulerRef = sched.clone();
        (sched, as_ref)
    }

    #[test]
    fn construction_arms_without_activating() {
        let (sched, host) = host();
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = TaskSubscription::new(
            host,
            counting(Schedule::Immediate, &hits),
            ExecutionMode::TickThread,
        )
        .unwrap();

        assert!(!sub.is_active());
        assert!(sub.is_scheduled());
        assert_eq!(sub.strategy(), Strategy::SyncImmediate);
        assert!(!sub.is_async());

        sched.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn start_adds_one_extra_run() {
        let (sched, host) = host();
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = TaskSubscription::new(
            host,
            counting(Schedule::Immediate, &hits),
            ExecutionMode::TickThread,
        )
        .unwrap();

        sub.start().unwrap();
        assert!(sub.is_active());
        sched.tick();
        sched.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stop_after_completion_is_a_noop() {
        let (sched, host) = host();
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = TaskSubscription::new(
            host,
            counting(Schedule::Immediate, &hits),
            ExecutionMode::TickThread,
        )
        .unwrap();
        sched.tick();

        assert!(!sub.stop());
        assert!(!sub.is_active());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_suppresses_periodic_and_pending_extra_runs() {
        let (sched, host) = host();
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = TaskSubscription::new(
            host,
            counting(Schedule::Periodic { delay: 0, period: 1 }, &hits),
            ExecutionMode::TickThread,
        )
        .unwrap();

        sched.tick();
        sched.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        sub.start().unwrap();
        assert!(sub.stop());
        for _ in 0..3 {
            sched.tick();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(!sub.is_scheduled());
    }

    #[test]
    fn host_rejection_surfaces_as_core_error() {
        let (sched, host) = host();
        sched.shutdown();

        let task = TaskFn::once("late", || Ok::<(), TaskError>(()));
        let err = TaskSubscription::new(host, task, ExecutionMode::TickThread).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Scheduler(SchedulerError::ShuttingDown)
        ));
    }

    #[test]
    fn rejected_start_leaves_subscription_inactive() {
        let (sched, host) = host();
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = TaskSubscription::new(
            host,
            counting(Schedule::Periodic { delay: 1, period: 1 }, &hits),
            ExecutionMode::TickThread,
        )
        .unwrap();
        sched.shutdown();

        let err = sub.start().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Scheduler(SchedulerError::ShuttingDown)
        ));
        assert!(!sub.is_active());
    }

    #[test]
    fn failing_runs_do_not_disarm_periodic_tasks() {
        let (sched, host) = host();
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_task = Arc::clone(&runs);
        let task = TaskFn::arc("flaky", Schedule::Periodic { delay: 1, period: 1 }, move || {
            runs_task.fetch_add(1, Ordering::SeqCst);
            Err(TaskError::fail("not yet"))
        });
        let sub = TaskSubscription::new(host, task, ExecutionMode::TickThread).unwrap();

        for _ in 0..3 {
            sched.tick();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(sched.is_scheduled(sub.task_id()));
    }
}
