//! # tickwork
//!
//! **Tickwork** is an in-process coordination layer for extension modules running
//! inside a real-time host that drives a fixed-cadence, single-threaded update loop
//! (a "tick") and offers its own scheduler.
//!
//! It provides three primitives on top of the host:
//! - a typed, polled publish/subscribe mechanism whose notifications coalesce
//!   until the next tick;
//! - a uniform lifecycle for recurring per-tick work (services);
//! - task subscriptions unifying one-shot, delayed and periodic work on the tick
//!   thread or in the background under one cancellable handle.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producers (any thread)                     modules (enable/disable)
//!   event.ping()                                     │
//!        │                                           ▼
//!        │         ┌───────────────────────────────────────────────────────────┐
//!        │         │  Runtime (context object, explicit, no globals)           │
//!        │         │  - EventBus        (one live instance per event kind)     │
//!        │         │  - ServiceRegistry (named services, start/stop, tick_all) │
//!        │         │  - ModuleRegistry  (extensions, registration order)       │
//!        │         └──────────────┬────────────────────────────┬───────────────┘
//!        │                        │ drive(period)              │ schedule_sync / schedule_async
//!        │                        ▼                            ▼
//!        │         ┌───────────────────────────────────────────────────────────┐
//!        │         │  HostScheduler (TickScheduler or the real host)           │
//!        │         │  - tick-thread queue      - background pool               │
//!        │         └──────────────┬────────────────────────────────────────────┘
//!        │                        │ every host cycle
//!        │                        ▼
//!        │         ServiceRegistry::tick_all()
//!        │           ├─► service_1.tick()
//!        │           ├─► ...
//!        │           └─► EventBus::tick()
//!        │                 └─► SubscriptionBox: dirty events → callbacks → reset
//!        └───────────────────────────────────────────▲
//! ```
//!
//! ### Event dispatch
//! ```text
//! ping() ×N ──► flag dirty ──► next tick ──► every subscriber called once ──► reset
//!                               (pings during dispatch stay pending for the next tick)
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                                |
//! |-------------------|-------------------------------------------------------------|---------------------------------------------------|
//! | **Events**        | Polled, coalescing events and typed subscriptions.          | [`Event`], [`EventBus`], [`Subscription`]         |
//! | **Services**      | Named per-tick work with a uniform lifecycle.               | [`Service`], [`ServiceFn`], [`ServiceRegistry`]   |
//! | **Tasks**         | Immediate, delayed and periodic work, sync or background.   | [`Task`], [`TaskFn`], [`TaskSubscription`]        |
//! | **Host**          | Scheduler contract and a reference tick loop.               | [`HostScheduler`], [`TickScheduler`]              |
//! | **Runtime**       | Plugin lifecycle and extension modules.                     | [`Runtime`], [`Module`]                           |
//! | **Errors**        | Typed errors with stable labels.                            | [`CoreError`], [`ServiceError`], [`TaskError`]    |
//! | **Configuration** | Tick cadence, registry period and tick budget.              | [`Config`]                                        |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tickwork::{Config, Event, EventFlag, Runtime, SchedulerRef, TickScheduler, impl_event};
//!
//! #[derive(Default)]
//! struct PlayerJoined {
//!     flag: EventFlag,
//! }
//! impl_event!(PlayerJoined);
//!
//! let host = Arc::new(TickScheduler::new(Config::default()));
//! let scheduler: SchedulerRef = host.clone();
//! let rt = Runtime::new(Config::default(), scheduler);
//!
//! let bus = rt.event_bus();
//! bus.add_event(Arc::new(PlayerJoined::default())).unwrap();
//!
//! let greeted = Arc::new(AtomicUsize::new(0));
//! let greeted_cb = Arc::clone(&greeted);
//! let sub = bus
//!     .subscribe(move |_: &PlayerJoined| {
//!         greeted_cb.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .unwrap();
//! bus.add_subscription(&sub);
//!
//! rt.enable().unwrap();
//!
//! let joined = bus.get_event::<PlayerJoined>().unwrap();
//! joined.ping();
//! joined.ping();
//! host.tick();
//!
//! assert_eq!(greeted.load(Ordering::SeqCst), 1);
//! rt.disable().unwrap();
//! ```
mod config;
mod core;
mod error;
mod events;
mod host;
mod services;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{
    EnableReport, Module, ModuleFailure, ModuleRef, ModuleRegistry, Runtime, RuntimeState,
    ShutdownSignal, wait_for_shutdown_signal,
};
pub use config::Config;
pub use error::{CoreError, SchedulerError, ServiceError, TaskError};
pub use events::{
    Callback, Event, EventBus, EventFlag, EventKind, Subscription, SubscriptionBox, SubscriptionId,
};
pub use host::{HostScheduler, Job, SchedulerRef, TaskId, TickScheduler};
pub use services::{
    DRIVER_TASK, Service, ServiceFailure, ServiceFn, ServiceRef, ServiceRegistry, ServiceState,
    TickReport,
};
pub use tasks::{ExecutionMode, Schedule, Strategy, Task, TaskFn, TaskRef, TaskSubscription};
