//! # TickScheduler: reference host scheduler.
//!
//! Implements [`HostScheduler`] with two execution lanes:
//!
//! - **tick thread**: jobs wait in a queue and run on whichever thread calls
//!   [`TickScheduler::tick`];
//! - **background**: jobs run on the tokio blocking pool, waits are
//!   `ticks × Config::tick_interval`.
//!
//! ## Architecture
//! ```text
//! schedule(job, TickThread, s) ──► queue[Armed{ id, due, period }]
//! schedule(job, Background, s) ──► handle.spawn(loop {
//!                                     sleep(delay) (cancellable)
//!                                     spawn_blocking(job)
//!                                     sleep(period) (cancellable) / exit
//!                                  })  + child CancellationToken per id
//!
//! run(token) ──► every tick_interval: tick()
//!                  ├─► current_tick += 1
//!                  ├─► due = queue.filter(due <= now)
//!                  └─► for job in due (insertion order):
//!                        still armed?  one-shot → remove | periodic → due += period
//!                        job()         (panic → error!)
//! ```
//!
//! ## Rules
//! - Immediate runs on the next tick; `Delayed { d }` runs `d` ticks from now;
//!   `Periodic` runs first after `max(delay, 1)` ticks and then every `period`.
//! - A job armed during a tick never runs before the next tick.
//! - `cancel` is best effort: a run in progress completes, later runs are suppressed.
//! - After [`shutdown`](TickScheduler::shutdown) every `schedule` call is rejected.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::config::Config;
use crate::core::shutdown::shutdown_signal_or_pending;
use crate::error::{SchedulerError, panic_message};
use crate::host::scheduler::{HostScheduler, Job, TaskId};
use crate::tasks::{ExecutionMode, Schedule};

/// Tick-thread job waiting in the queue.
struct Armed {
    id: TaskId,
    job: Job,
    period: Option<u64>,
    due: u64,
}

type BackgroundJobs = Arc<Mutex<HashMap<TaskId, CancellationToken>>>;

/// Reference implementation of [`HostScheduler`].
pub struct TickScheduler {
    cfg: Config,
    handle: Option<Handle>,
    root: CancellationToken,
    next_id: AtomicU64,
    current_tick: AtomicU64,
    queue: Mutex<Vec<Armed>>,
    background: BackgroundJobs,
    closed: AtomicBool,
}

impl TickScheduler {
    /// Creates a scheduler.
    ///
    /// Background work uses the tokio runtime current at construction, if any.
    /// Without one, background registrations fail with
    /// [`SchedulerError::NoBackgroundRuntime`].
    pub fn new(cfg: Config) -> Self {
        Self::build(cfg, Handle::try_current().ok())
    }

    /// Creates a scheduler whose background lane runs on `handle`.
    pub fn with_handle(cfg: Config, handle: Handle) -> Self {
        Self::build(cfg, Some(handle))
    }

    fn build(mut cfg: Config, handle: Option<Handle>) -> Self {
        cfg.tick_interval = cfg.tick_interval_clamped();
        Self {
            cfg,
            handle,
            root: CancellationToken::new(),
            next_id: AtomicU64::new(1),
            current_tick: AtomicU64::new(0),
            queue: Mutex::new(Vec::new()),
            background: Arc::new(Mutex::new(HashMap::new())),
            closed: AtomicBool::new(false),
        }
    }

    /// Configuration in effect (with the tick interval already clamped).
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Number of ticks advanced so far.
    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::Acquire)
    }

    /// Number of armed jobs in both lanes.
    pub fn pending(&self) -> usize {
        self.queue.lock().len() + self.background.lock().len()
    }

    /// True once [`shutdown`](Self::shutdown) was called.
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Advances one tick and runs every due tick-thread job on the calling thread.
    ///
    /// Returns the number of jobs that ran.
    pub fn tick(&self) -> usize {
        let now = self.current_tick.fetch_add(1, Ordering::AcqRel) + 1;
        let due: Vec<(TaskId, Job)> = self
            .queue
            .lock()
            .iter()
            .filter(|a| a.due <= now)
            .map(|a| (a.id, Arc::clone(&a.job)))
            .collect();

        let mut ran = 0;
        for (id, job) in due {
            // an earlier job in this tick may have cancelled this one
            if !self.claim(id, now) {
                continue;
            }

            ran += 1;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| job())) {
                error!(
                    task_id = %id,
                    tick = now,
                    panic = %panic_message(panic.as_ref()),
                    "tick job panicked"
                );
            }
        }

        if ran > 0 {
            trace!(tick = now, ran, "tick finished");
        }
        ran
    }

    /// Drives [`tick`](Self::tick) every `tick_interval` until `token` is cancelled
    /// or the process receives a termination signal.
    ///
    /// Armed jobs are left in place; call [`shutdown`](Self::shutdown) to drop them.
    pub async fn run(&self, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.cfg.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let signal = shutdown_signal_or_pending();
        tokio::pin!(signal);

        debug!(
            interval_ms = self.cfg.tick_interval.as_millis() as u64,
            "host loop started"
        );
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                received = &mut signal => {
                    info!(signal = %received, "shutdown signal received, leaving host loop");
                    break;
                }
                _ = interval.tick() => {
                    self.tick();
                }
            }
        }
        debug!(tick = self.current_tick(), "host loop stopped");
    }

    /// Rejects further registrations and cancels every armed job.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.root.cancel();
        let tick_jobs = self.queue.lock().drain(..).count();
        let background_jobs = self.background.lock().drain().count();
        debug!(tick_jobs, background_jobs, "scheduler shut down");
    }

    /// Marks the job as taken for tick `now`.
    ///
    /// One-shot jobs leave the queue, periodic ones are re-armed. Returns `false`
    /// if the job is no longer armed.
    fn claim(&self, id: TaskId, now: u64) -> bool {
        let mut queue = self.queue.lock();
        let Some(idx) = queue.iter().position(|a| a.id == id) else {
            return false;
        };
        match queue[idx].period {
            Some(period) => queue[idx].due = now + period,
            None => {
                queue.remove(idx);
            }
        }
        true
    }

    fn arm_tick(&self, id: TaskId, job: Job, schedule: Schedule) {
        let now = self.current_tick();
        let (first, period) = match schedule {
            Schedule::Immediate => (1, None),
            Schedule::Delayed { delay } => (delay.max(1), None),
            Schedule::Periodic { delay, period } => (delay.max(1), Some(period.max(1))),
        };
        self.queue.lock().push(Armed {
            id,
            job,
            period,
            due: now + first,
        });
    }

    fn arm_background(
        &self,
        id: TaskId,
        job: Job,
        schedule: Schedule,
    ) -> Result<(), SchedulerError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or(SchedulerError::NoBackgroundRuntime)?;

        let token = self.root.child_token();
        self.background.lock().insert(id, token.clone());

        let first = self.cfg.ticks_to_duration(schedule.delay());
        let period = schedule
            .period()
            .map(|p| self.cfg.ticks_to_duration(p.max(1)));
        let jobs = Arc::clone(&self.background);

        handle.spawn(async move {
            background_loop(id, job, first, period, &token).await;
            jobs.lock().remove(&id);
        });
        Ok(())
    }
}

impl HostScheduler for TickScheduler {
    fn schedule(
        &self,
        job: Job,
        mode: ExecutionMode,
        schedule: Schedule,
    ) -> Result<TaskId, SchedulerError> {
        if self.is_shut_down() {
            return Err(SchedulerError::ShuttingDown);
        }

        let id = TaskId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        match mode {
            ExecutionMode::TickThread => self.arm_tick(id, job, schedule),
            ExecutionMode::Background => self.arm_background(id, job, schedule)?,
        }

        debug!(
            task_id = %id,
            mode = %mode,
            schedule = schedule.as_label(),
            "job armed"
        );
        Ok(id)
    }

    fn cancel(&self, id: TaskId) -> bool {
        {
            let mut queue = self.queue.lock();
            if let Some(idx) = queue.iter().position(|a| a.id == id) {
                queue.remove(idx);
                drop(queue);
                debug!(task_id = %id, "tick job cancelled");
                return true;
            }
        }

        match self.background.lock().remove(&id) {
            Some(token) => {
                token.cancel();
                debug!(task_id = %id, "background job cancelled");
                true
            }
            None => false,
        }
    }

    fn is_scheduled(&self, id: TaskId) -> bool {
        self.queue.lock().iter().any(|a| a.id == id) || self.background.lock().contains_key(&id)
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// Background lane of one job: initial wait, then run / wait until done or cancelled.
async fn background_loop(
    id: TaskId,
    job: Job,
    first: Duration,
    period: Option<Duration>,
    token: &CancellationToken,
) {
    if !first.is_zero() && !sleep_or_cancel(first, token).await {
        return;
    }

    loop {
        if token.is_cancelled() {
            return;
        }

        let run = Arc::clone(&job);
        if let Err(err) = tokio::task::spawn_blocking(move || run()).await {
            error!(task_id = %id, error = %err, "background job aborted");
        }

        let Some(period) = period else {
            return;
        };
        if !sleep_or_cancel(period, token).await {
            return;
        }
    }
}

/// Sleeps for `dur`; returns `false` if cancelled first.
async fn sleep_or_cancel(dur: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(dur) => true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counting_job(hits: &Arc<AtomicUsize>) -> Job {
        let hits = Arc::clone(hits);
        Arc::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn offline() -> TickScheduler {
        TickScheduler::new(Config::default())
    }

    #[test]
    fn immediate_runs_on_next_tick_once() {
        let sched = offline();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = sched
            .schedule(counting_job(&hits), ExecutionMode::TickThread, Schedule::Immediate)
            .unwrap();
        assert!(sched.is_scheduled(id));

        assert_eq!(sched.tick(), 1);
        assert_eq!(sched.tick(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!sched.is_scheduled(id));
        assert!(!sched.cancel(id), "cancel after completion is a no-op");
    }

    #[test]
    fn delayed_waits_the_requested_ticks() {
        let sched = offline();
        let hits = Arc::new(AtomicUsize::new(0));
        sched
            .schedule(
                counting_job(&hits),
                ExecutionMode::TickThread,
                Schedule::Delayed { delay: 3 },
            )
            .unwrap();

        sched.tick();
        sched.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        sched.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn periodic_repeats_until_cancelled() {
        let sched = offline();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = sched
            .schedule(
                counting_job(&hits),
                ExecutionMode::TickThread,
                Schedule::Periodic { delay: 0, period: 2 },
            )
            .unwrap();

        for _ in 0..5 {
            sched.tick();
        }
        // ticks 1, 3, 5
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        assert!(sched.cancel(id));
        for _ in 0..4 {
            sched.tick();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn jobs_armed_during_a_tick_wait_for_the_next() {
        let sched = Arc::new(offline());
        let hits = Arc::new(AtomicUsize::new(0));

        let sched_cb = Arc::clone(&sched);
        let inner = counting_job(&hits);
        sched
            .schedule(
                Arc::new(move || {
                    let _ = sched_cb.schedule(
                        Arc::clone(&inner),
                        ExecutionMode::TickThread,
                        Schedule::Immediate,
                    );
                }),
                ExecutionMode::TickThread,
                Schedule::Immediate,
            )
            .unwrap();

        assert_eq!(sched.tick(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(sched.tick(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn job_cancelled_by_an_earlier_job_in_the_same_tick_does_not_run() {
        let sched = Arc::new(offline());
        let hits = Arc::new(AtomicUsize::new(0));
        let victim_id = Arc::new(Mutex::new(None::<TaskId>));

        let sched_cb = Arc::clone(&sched);
        let victim_cb = Arc::clone(&victim_id);
        sched
            .schedule(
                Arc::new(move || {
                    if let Some(id) = *victim_cb.lock() {
                        sched_cb.cancel(id);
                    }
                }),
                ExecutionMode::TickThread,
                Schedule::Immediate,
            )
            .unwrap();
        let id = sched
            .schedule(counting_job(&hits), ExecutionMode::TickThread, Schedule::Immediate)
            .unwrap();
        *victim_id.lock() = Some(id);

        assert_eq!(sched.tick(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panicking_job_does_not_poison_the_tick() {
        let sched = offline();
        let hits = Arc::new(AtomicUsize::new(0));
        sched
            .schedule(
                Arc::new(|| panic!("job exploded")),
                ExecutionMode::TickThread,
                Schedule::Immediate,
            )
            .unwrap();
        sched
            .schedule(counting_job(&hits), ExecutionMode::TickThread, Schedule::Immediate)
            .unwrap();

        assert_eq!(sched.tick(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn background_without_runtime_is_rejected() {
        let sched = offline();
        let err = sched
            .schedule(Arc::new(|| {}), ExecutionMode::Background, Schedule::Immediate)
            .unwrap_err();
        assert_eq!(err, SchedulerError::NoBackgroundRuntime);
    }

    #[test]
    fn shutdown_rejects_new_work_and_drops_armed_jobs() {
        let sched = offline();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = sched
            .schedule(
                counting_job(&hits),
                ExecutionMode::TickThread,
                Schedule::Periodic { delay: 1, period: 1 },
            )
            .unwrap();

        sched.shutdown();
        assert!(sched.is_shut_down());
        assert!(!sched.is_scheduled(id));
        assert_eq!(sched.tick(), 0);

        let err = sched
            .schedule(counting_job(&hits), ExecutionMode::TickThread, Schedule::Immediate)
            .unwrap_err();
        assert_eq!(err, SchedulerError::ShuttingDown);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn background_job_runs_off_the_tick_thread() {
        let sched = TickScheduler::new(Config {
            tick_interval: Duration::from_millis(1),
            ..Config::default()
        });
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let id = sched
            .schedule(
                Arc::new(move || {
                    let _ = tx.send(std::thread::current().id());
                }),
                ExecutionMode::Background,
                Schedule::Delayed { delay: 2 },
            )
            .unwrap();

        let worker = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("background job did not run")
            .expect("channel closed");
        assert_ne!(worker, std::thread::current().id());
        assert_eq!(sched.current_tick(), 0, "background work needs no ticks");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!sched.is_scheduled(id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_background_periodic_stops_repeating() {
        let sched = TickScheduler::new(Config {
            tick_interval: Duration::from_millis(1),
            ..Config::default()
        });
        let hits = Arc::new(AtomicUsize::new(0));
        let id = sched
            .schedule(
                counting_job(&hits),
                ExecutionMode::Background,
                Schedule::Periodic { delay: 0, period: 2 },
            )
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while hits.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("periodic background job stalled");

        assert!(sched.cancel(id));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_cancel = hits.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_until_token_is_cancelled() {
        let sched = Arc::new(TickScheduler::new(Config {
            tick_interval: Duration::from_millis(10),
            ..Config::default()
        }));
        let hits = Arc::new(AtomicUsize::new(0));
        sched
            .schedule(
                counting_job(&hits),
                ExecutionMode::TickThread,
                Schedule::Periodic { delay: 0, period: 1 },
            )
            .unwrap();

        let token = CancellationToken::new();
        let host = {
            let sched = Arc::clone(&sched);
            let token = token.clone();
            tokio::spawn(async move { sched.run(token).await })
        };

        tokio::time::sleep(Duration::from_millis(105)).await;
        token.cancel();
        host.await.unwrap();

        let ticks = sched.current_tick();
        assert!(ticks >= 10, "expected ~11 ticks, got {ticks}");
        assert_eq!(hits.load(Ordering::SeqCst) as u64, ticks);
    }
}
