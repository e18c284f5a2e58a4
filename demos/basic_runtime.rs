//! # Example: basic_runtime
//!
//! A module registers an event and a service, a periodic tick-thread task pings the
//! event, and the reference host loop drives everything for two seconds.
//!
//! Demonstrates how to:
//! - Build a [`Runtime`] on a [`TickScheduler`].
//! - Register events, subscriptions and services from a [`Module`].
//! - Let coalesced pings reach subscribers once per tick.
//!
//! ## Flow
//! ```text
//! Runtime::enable()
//!     ├─► register + start "event_bus", "scoreboard"
//!     ├─► arm registry driver (every tick)
//!     └─► Scoreboard::on_enable()
//!           ├─► bus.add_event(ScoreChanged)
//!           ├─► subscribe + add_subscription
//!           └─► schedule_sync(bump, every 5 ticks) → ping ×3
//! TickScheduler::run(token)
//!     └─► tick() every 50ms ──► tick_all() ──► bus.tick() ──► "score changed" once
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic_runtime
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tickwork::{
    Config, CoreError, Event, EventFlag, Module, Runtime, Schedule, SchedulerRef, ServiceFn,
    TaskFn, TaskSubscription, TickScheduler, impl_event,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Default)]
struct ScoreChanged {
    flag: EventFlag,
}
impl_event!(ScoreChanged);

#[derive(Default)]
struct Scoreboard {
    score: Arc<AtomicU64>,
    bump: Mutex<Option<Arc<TaskSubscription>>>,
}

impl Module for Scoreboard {
    fn name(&self) -> &str {
        "scoreboard"
    }

    fn on_enable(&self, rt: &Runtime) -> Result<(), CoreError> {
        let bus = rt.event_bus();
        bus.add_event(Arc::new(ScoreChanged::default()))?;

        let score = Arc::clone(&self.score);
        let sub = bus.subscribe(move |_: &ScoreChanged| {
            tracing::info!(score = score.load(Ordering::Relaxed), "score changed");
        })?;
        bus.add_subscription(&sub);

        let score = Arc::clone(&self.score);
        rt.services().register_service(ServiceFn::arc("scoreboard", move || {
            tracing::trace!(score = score.load(Ordering::Relaxed), "scoreboard tick");
            Ok(())
        }))?;
        rt.services().start_service("scoreboard");

        let score = Arc::clone(&self.score);
        let producer = Arc::clone(bus);
        let bump = rt.schedule_sync(TaskFn::arc(
            "bump",
            Schedule::Periodic {
                delay: 5,
                period: 5,
            },
            move || {
                score.fetch_add(10, Ordering::Relaxed);
                if let Some(ev) = producer.get_event::<ScoreChanged>() {
                    // three pings, one notification
                    ev.ping();
                    ev.ping();
                    ev.ping();
                }
                Ok(())
            },
        ))?;
        *self.bump.lock() = Some(bump);
        Ok(())
    }

    fn on_disable(&self, rt: &Runtime) {
        if let Some(bump) = self.bump.lock().take() {
            bump.stop();
        }
        rt.services().unregister_service("scoreboard");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cfg = Config::default();
    let host = Arc::new(TickScheduler::new(cfg.clone()));
    let scheduler: SchedulerRef = host.clone();
    let rt = Runtime::new(cfg, scheduler);

    rt.add_module(Arc::new(Scoreboard::default()))?;
    let report = rt.enable()?;
    tracing::info!(modules = report.enabled, "enabled");

    let token = CancellationToken::new();
    let stopper = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        stopper.cancel();
    });

    host.run(token).await;

    rt.disable()?;
    host.shutdown();
    tracing::info!(ticks = host.current_tick(), "host stopped");
    Ok(())
}
