//! # Runtime: the context object wiring bus, services, modules and the host.
//!
//! [`Runtime`] is constructed once per host plugin and passed explicitly to whoever
//! needs it. It owns the [`EventBus`], the [`ServiceRegistry`] and the
//! [`ModuleRegistry`], and maps the host's plugin lifecycle onto them.
//!
//! ## Lifecycle
//! ```text
//! Idle ──enable()──► Enabled ──disable()──► Disabled
//!
//! enable():
//!   ├─► services.register_service(event_bus)     ("event_bus")
//!   ├─► services.start_all_services()
//!   ├─► driver = services.drive(scheduler, service_period)
//!   └─► modules.on_enable(rt)  (registration order; failures logged + reported)
//!
//! disable():
//!   ├─► modules.on_disable(rt) (reverse order)
//!   ├─► stop every task armed through schedule_sync / schedule_async
//!   ├─► driver.stop()
//!   ├─► services.stop_all_services()
//!   └─► services.unregister_service("event_bus")
//! ```
//!
//! ## Rules
//! - `enable` and `disable` each succeed at most once, in that order; any other
//!   call fails with [`CoreError::Lifecycle`].
//! - A module whose `on_enable` fails does not stop the remaining modules.
//! - Tasks armed through the runtime never outlive `disable()`.
//! - No lock is held while module, service or task code runs.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tickwork::{Config, Runtime, SchedulerRef, TickScheduler};
//!
//! let host = Arc::new(TickScheduler::new(Config::default()));
//! let scheduler: SchedulerRef = host.clone();
//! let rt = Runtime::new(Config::default(), scheduler);
//!
//! rt.enable().unwrap();
//! assert!(rt.services().state("event_bus").is_some());
//! host.tick();
//! rt.disable().unwrap();
//! assert!(rt.services().state("event_bus").is_none());
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::core::modules::{ModuleFailure, ModuleRef, ModuleRegistry};
use crate::error::CoreError;
use crate::events::EventBus;
use crate::host::SchedulerRef;
use crate::services::ServiceRegistry;
use crate::tasks::{ExecutionMode, TaskRef, TaskSubscription};

/// Lifecycle state of a [`Runtime`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuntimeState {
    /// Constructed, not yet enabled.
    Idle,
    /// Services running, driver armed.
    Enabled,
    /// Shut down; cannot be enabled again.
    Disabled,
}

impl RuntimeState {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeState::Idle => "idle",
            RuntimeState::Enabled => "enabled",
            RuntimeState::Disabled => "disabled",
        }
    }
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Outcome of [`Runtime::enable`].
#[derive(Debug, Default)]
pub struct EnableReport {
    /// Number of modules enabled successfully.
    pub enabled: usize,
    /// Modules whose `on_enable` failed.
    pub failures: Vec<ModuleFailure>,
}

impl EnableReport {
    /// True if every module enabled.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Coordination context of one host plugin.
pub struct Runtime {
    cfg: Config,
    scheduler: SchedulerRef,
    bus: Arc<EventBus>,
    services: Arc<ServiceRegistry>,
    modules: ModuleRegistry,
    state: Mutex<RuntimeState>,
    driver: Mutex<Option<TaskSubscription>>,
    tasks: Mutex<Vec<Arc<TaskSubscription>>>,
}

impl Runtime {
    /// Builds the bus and registries. Nothing is armed until [`enable`](Self::enable).
    pub fn new(cfg: Config, scheduler: SchedulerRef) -> Self {
        let services = Arc::new(ServiceRegistry::with_tick_budget(cfg.tick_budget()));
        Self {
            cfg,
            scheduler,
            bus: Arc::new(EventBus::new()),
            services,
            modules: ModuleRegistry::new(),
            state: Mutex::new(RuntimeState::Idle),
            driver: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Configuration this runtime was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Host scheduler shared by every task subscription of this runtime.
    pub fn scheduler(&self) -> &SchedulerRef {
        &self.scheduler
    }

    /// The event bus.
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The service registry.
    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    /// The module registry.
    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RuntimeState {
        *self.state.lock()
    }

    /// True while the registry driver is armed.
    pub fn is_enabled(&self) -> bool {
        self.state() == RuntimeState::Enabled
    }

    /// Registers the bus, starts every service, arms the registry driver and
    /// enables modules in registration order.
    pub fn enable(&self) -> Result<EnableReport, CoreError> {
        self.transition("enable", RuntimeState::Idle, RuntimeState::Enabled)?;

        if let Err(err) = self.arm() {
            *self.state.lock() = RuntimeState::Idle;
            return Err(err);
        }

        let mut report = EnableReport::default();
        for module in self.modules.snapshot() {
            match module.on_enable(self) {
                Ok(()) => {
                    debug!(module = %module.name(), "module enabled");
                    report.enabled += 1;
                }
                Err(err) => {
                    error!(
                        module = %module.name(),
                        label = err.as_label(),
                        error = %err,
                        "module failed to enable"
                    );
                    report.failures.push(ModuleFailure {
                        name: module.name().to_string(),
                        error: err,
                    });
                }
            }
        }

        info!(
            services = self.services.len(),
            modules = report.enabled,
            failed = report.failures.len(),
            "runtime enabled"
        );
        Ok(report)
    }

    /// Disables modules in reverse order, stops every task armed through the
    /// runtime, then the driver and every service, and unregisters the bus.
    pub fn disable(&self) -> Result<(), CoreError> {
        self.transition("disable", RuntimeState::Enabled, RuntimeState::Disabled)?;

        for module in self.modules.snapshot().into_iter().rev() {
            module.on_disable(self);
            debug!(module = %module.name(), "module disabled");
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        let stopped = tasks.iter().filter(|sub| sub.stop()).count();
        debug!(tasks = tasks.len(), stopped, "runtime tasks stopped");

        let driver = self.driver.lock().take();
        if let Some(driver) = driver {
            driver.stop();
        }
        self.services.stop_all_services();
        self.services.unregister_service(EventBus::SERVICE_NAME);

        info!("runtime disabled");
        Ok(())
    }

    /// Adds `module`; if the runtime is already enabled, enables it right away.
    ///
    /// On an `on_enable` failure the module stays registered and the error is returned.
    pub fn add_module(&self, module: ModuleRef) -> Result<(), CoreError> {
        self.modules.add_module(ModuleRef::clone(&module))?;
        if self.is_enabled() {
            module.on_enable(self)?;
            debug!(module = %module.name(), "module enabled");
        }
        Ok(())
    }

    /// Removes the module called `name`; if the runtime is enabled, disables it first.
    pub fn remove_module(&self, name: &str) -> Option<ModuleRef> {
        let module = self.modules.remove_module(name)?;
        if self.is_enabled() {
            module.on_disable(self);
            debug!(module = %name, "module disabled");
        }
        Some(module)
    }

    /// Arms `task` on the tick thread.
    ///
    /// The runtime keeps a handle and stops the task on [`disable`](Self::disable).
    pub fn schedule_sync(&self, task: TaskRef) -> Result<Arc<TaskSubscription>, CoreError> {
        self.track(task, ExecutionMode::TickThread)
    }

    /// Arms `task` on the background pool.
    ///
    /// The runtime keeps a handle and stops the task on [`disable`](Self::disable).
    pub fn schedule_async(&self, task: TaskRef) -> Result<Arc<TaskSubscription>, CoreError> {
        self.track(task, ExecutionMode::Background)
    }

    /// Number of runtime-armed tasks that may still run.
    pub fn task_count(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|sub| sub.has_pending_runs());
        tasks.len()
    }

    fn track(
        &self,
        task: TaskRef,
        mode: ExecutionMode,
    ) -> Result<Arc<TaskSubscription>, CoreError> {
        let sub = Arc::new(TaskSubscription::new(
            SchedulerRef::clone(&self.scheduler),
            task,
            mode,
        )?);
        let mut tasks = self.tasks.lock();
        tasks.retain(|armed| armed.has_pending_runs());
        tasks.push(Arc::clone(&sub));
        Ok(sub)
    }

    fn transition(
        &self,
        op: &'static str,
        from: RuntimeState,
        to: RuntimeState,
    ) -> Result<(), CoreError> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(CoreError::Lifecycle {
                op,
                state: state.as_label(),
            });
        }
        *state = to;
        Ok(())
    }

    /// Registers and starts services and arms the driver; undone on failure.
    fn arm(&self) -> Result<(), CoreError> {
        self.services.register_service(self.bus.clone())?;
        self.services.start_all_services();

        match self.services.drive(
            SchedulerRef::clone(&self.scheduler),
            self.cfg.service_period_clamped(),
        ) {
            Ok(driver) => {
                *self.driver.lock() = Some(driver);
                Ok(())
            }
            Err(err) => {
                self.services.stop_all_services();
                self.services.unregister_service(EventBus::SERVICE_NAME);
                Err(err)
            }
        }
    }
}
