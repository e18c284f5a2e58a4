//! # Example: background_tasks
//!
//! Background work produces results off the tick thread and hands them over through
//! an event; subscribers see them on the next tick.
//!
//! Demonstrates how to:
//! - Arm periodic and delayed tasks in [`ExecutionMode::Background`].
//! - Use `start()` for an extra immediate run and `stop()` to cancel.
//! - Exchange data between lanes with a shared buffer plus a coalescing event.
//!
//! ## Flow
//! ```text
//! background: fetch (every 10 ticks) ──► inbox.push(..) ──► ResultsReady.ping()
//! background: report (after 30 ticks, once)
//! tick thread: tick_all() ──► bus.tick() ──► drain inbox, log batch
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example background_tasks
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tickwork::{
    Config, Event, EventFlag, Runtime, Schedule, SchedulerRef, TaskError, TaskFn, TickScheduler,
    impl_event,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Default)]
struct ResultsReady {
    flag: EventFlag,
}
impl_event!(ResultsReady);

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cfg = Config {
        tick_interval: Duration::from_millis(20),
        ..Config::default()
    };
    let host = Arc::new(TickScheduler::new(cfg.clone()));
    let scheduler: SchedulerRef = host.clone();
    let rt = Runtime::new(cfg, scheduler);

    let bus = Arc::clone(rt.event_bus());
    bus.add_event(Arc::new(ResultsReady::default()))?;

    let inbox: Arc<Mutex<Vec<u64>>> = Arc::default();
    let drained = Arc::clone(&inbox);
    let consumer = bus.subscribe(move |_: &ResultsReady| {
        let batch: Vec<u64> = drained.lock().drain(..).collect();
        tracing::info!(?batch, "results delivered on tick thread");
    })?;
    bus.add_subscription(&consumer);

    rt.enable()?;

    let seq = Arc::new(AtomicU64::new(0));
    let producer = Arc::clone(&bus);
    let fetch = rt.schedule_async(TaskFn::arc(
        "fetch",
        Schedule::Periodic {
            delay: 10,
            period: 10,
        },
        move || {
            let n = seq.fetch_add(1, Ordering::Relaxed);
            if n == 3 {
                return Err(TaskError::fail("upstream timed out"));
            }
            inbox.lock().push(n);
            if let Some(ev) = producer.get_event::<ResultsReady>() {
                ev.ping();
            }
            Ok(())
        },
    ))?;
    // one run right away, on top of the schedule
    fetch.start()?;

    let report = rt.schedule_async(TaskFn::arc(
        "report",
        Schedule::Delayed { delay: 30 },
        || {
            tracing::info!("delayed background report");
            Ok(())
        },
    ))?;
    tracing::info!(
        fetch = %fetch.strategy(),
        report = %report.strategy(),
        "tasks armed"
    );

    let token = CancellationToken::new();
    let stopper = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        stopper.cancel();
    });
    host.run(token).await;

    fetch.stop();
    rt.disable()?;
    host.shutdown();
    Ok(())
}
