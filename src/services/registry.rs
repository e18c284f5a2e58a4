//! # Service registry: uniform lifecycle and the aggregate tick.
//!
//! The registry owns every [`Service`] of a runtime, in registration order.
//!
//! ## Architecture
//! ```text
//! register_service(svc)  ──► Stopped
//! start_all_services()   ──► Started   (on_start, registration order)
//! host cycle ──► driver job ──► tick_all()
//!                                 ├─► svc_1.tick()   Err / panic → error!, TickReport
//!                                 ├─► svc_2.tick()
//!                                 └─► svc_n.tick()
//! stop_all_services()    ──► Stopped   (on_stop, registration order)
//! unregister_service(n)  ──► stop if started, then remove
//! ```
//!
//! ## Rules
//! - Names are unique; a second registration of a name is rejected.
//! - A failing or panicking service never prevents the others from ticking in the
//!   same pass.
//! - The internal lock is never held while service code runs, so services may
//!   register or unregister services from inside their hooks.
//! - Removing an absent service is a no-op.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::error::{CoreError, ServiceError, panic_message};
use crate::host::SchedulerRef;
use crate::services::service::{ServiceRef, ServiceState};
use crate::tasks::{ExecutionMode, Schedule, TaskFn, TaskSubscription};

/// Name of the task that drives [`ServiceRegistry::tick_all`].
pub const DRIVER_TASK: &str = "service_registry_driver";

/// Registered service plus its lifecycle flag.
struct Entry {
    service: ServiceRef,
    started: AtomicBool,
}

impl Entry {
    fn name(&self) -> &str {
        self.service.name()
    }

    fn state(&self) -> ServiceState {
        if self.started.load(Ordering::Acquire) {
            ServiceState::Started
        } else {
            ServiceState::Stopped
        }
    }

    /// Stopped → Started. Returns `false` if already started.
    fn start(&self) -> bool {
        if self.started.swap(true, Ordering::AcqRel) {
            return false;
        }
        let hook = catch_unwind(AssertUnwindSafe(|| self.service.on_start()));
        if let Err(panic) = hook {
            self.started.store(false, Ordering::Release);
            error!(
                service = %self.name(),
                panic = %panic_message(panic.as_ref()),
                "service on_start panicked; left stopped"
            );
            return false;
        }
        debug!(service = %self.name(), "service started");
        true
    }

    /// Started → Stopped. Returns `false` if already stopped.
    fn stop(&self) -> bool {
        if !self.started.swap(false, Ordering::AcqRel) {
            return false;
        }
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| self.service.on_stop())) {
            error!(
                service = %self.name(),
                panic = %panic_message(panic.as_ref()),
                "service on_stop panicked"
            );
        }
        debug!(service = %self.name(), "service stopped");
        true
    }
}

/// One failed service tick inside a pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceFailure {
    /// Name of the failing service.
    pub name: String,
    /// What went wrong.
    pub error: ServiceError,
}

/// Outcome of one [`ServiceRegistry::tick_all`] pass.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// Number of started services that were ticked (failures included).
    pub ticked: usize,
    /// Services whose tick returned an error or panicked.
    pub failures: Vec<ServiceFailure>,
    /// Wall-clock time of the pass.
    pub elapsed: Duration,
}

impl TickReport {
    /// True if every ticked service succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered registry of services.
#[derive(Default)]
pub struct ServiceRegistry {
    entries: Mutex<Vec<Arc<Entry>>>,
    budget: Option<Duration>,
}

impl ServiceRegistry {
    /// Creates an empty registry without a tick budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that warns about passes slower than `budget`.
    pub fn with_tick_budget(budget: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            budget,
        }
    }

    /// Adds `service` in the [`ServiceState::Stopped`] state.
    ///
    /// Fails with [`CoreError::DuplicateService`] if the name is taken.
    pub fn register_service(&self, service: ServiceRef) -> Result<(), CoreError> {
        let mut entries = self.entries.lock();
        if entries.iter().any(|e| e.name() == service.name()) {
            let name = service.name().to_string();
            drop(entries);
            warn!(service = %name, "duplicate service rejected");
            return Err(CoreError::DuplicateService { name });
        }

        debug!(service = %service.name(), "service registered");
        entries.push(Arc::new(Entry {
            service,
            started: AtomicBool::new(false),
        }));
        Ok(())
    }

    /// Stops (if started) and removes the service called `name`.
    ///
    /// Returns `false` if no such service is registered.
    pub fn unregister_service(&self, name: &str) -> bool {
        let removed = {
            let mut entries = self.entries.lock();
            entries
                .iter()
                .position(|e| e.name() == name)
                .map(|idx| entries.remove(idx))
        };

        match removed {
            Some(entry) => {
                entry.stop();
                debug!(service = %name, "service unregistered");
                true
            }
            None => false,
        }
    }

    /// Starts every stopped service, in registration order.
    ///
    /// Returns the number of services that transitioned.
    pub fn start_all_services(&self) -> usize {
        self.snapshot().iter().filter(|e| e.start()).count()
    }

    /// Stops every started service, in registration order.
    ///
    /// Returns the number of services that transitioned.
    pub fn stop_all_services(&self) -> usize {
        self.snapshot().iter().filter(|e| e.stop()).count()
    }

    /// Starts one service. Returns `false` if absent or already started.
    pub fn start_service(&self, name: &str) -> bool {
        self.find(name).is_some_and(|e| e.start())
    }

    /// Stops one service. Returns `false` if absent or already stopped.
    pub fn stop_service(&self, name: &str) -> bool {
        self.find(name).is_some_and(|e| e.stop())
    }

    /// Current state of the service called `name`.
    pub fn state(&self, name: &str) -> Option<ServiceState> {
        self.find(name).map(|e| e.state())
    }

    /// Returns the service called `name`.
    pub fn get(&self, name: &str) -> Option<ServiceRef> {
        self.find(name).map(|e| Arc::clone(&e.service))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if no service is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Ticks every started service once.
    ///
    /// Errors and panics are caught per service, logged and collected into the
    /// returned report.
    pub fn tick_all(&self) -> TickReport {
        let started = Instant::now();
        let mut report = TickReport::default();

        for entry in self.snapshot() {
            if entry.state() != ServiceState::Started {
                continue;
            }
            report.ticked += 1;

            let outcome = match catch_unwind(AssertUnwindSafe(|| entry.service.tick())) {
                Ok(res) => res,
                Err(panic) => Err(ServiceError::Panicked {
                    message: panic_message(panic.as_ref()),
                }),
            };

            if let Err(err) = outcome {
                error!(
                    service = %entry.name(),
                    label = err.as_label(),
                    error = %err.as_message(),
                    "service tick failed"
                );
                report.failures.push(ServiceFailure {
                    name: entry.name().to_string(),
                    error: err,
                });
            }
        }

        report.elapsed = started.elapsed();
        if let Some(budget) = self.budget.filter(|b| report.elapsed > *b) {
            warn!(
                elapsed_ms = report.elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                services = report.ticked,
                "service pass exceeded tick budget"
            );
        }
        report
    }

    /// Arms a recurring tick-thread job on `scheduler` that calls
    /// [`tick_all`](Self::tick_all) every `period` host ticks (`0` is treated as `1`).
    ///
    /// The returned subscription owns the driver; stopping it stops the passes.
    pub fn drive(
        self: &Arc<Self>,
        scheduler: SchedulerRef,
        period: u64,
    ) -> Result<TaskSubscription, CoreError> {
        let registry = Arc::clone(self);
        let task = TaskFn::arc(
            DRIVER_TASK,
            Schedule::Periodic {
                delay: 0,
                period: period.max(1),
            },
            move || {
                registry.tick_all();
                Ok(())
            },
        );
        TaskSubscription::new(scheduler, task, ExecutionMode::TickThread)
    }

    fn snapshot(&self) -> Vec<Arc<Entry>> {
        self.entries.lock().clone()
    }

    fn find(&self, name: &str) -> Option<Arc<Entry>> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.name() == name)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::services::{Service, ServiceFn};

    fn counter(name: &'static str, hits: &Arc<AtomicUsize>) -> ServiceRef {
        let hits = Arc::clone(hits);
        ServiceFn::arc(name, move || {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[derive(Default)]
    struct Hooked {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl Service for Hooked {
        fn name(&self) -> &str {
            "hooked"
        }

        fn tick(&self) -> Result<(), ServiceError> {
            Ok(())
        }

        fn on_start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let reg = ServiceRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        reg.register_service(counter("s", &hits)).unwrap();

        let err = reg.register_service(counter("s", &hits)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateService { ref name } if name == "s"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn only_started_services_tick() {
        let reg = ServiceRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        reg.register_service(counter("s", &hits)).unwrap();

        assert_eq!(reg.tick_all().ticked, 0);
        assert_eq!(reg.state("s"), Some(ServiceState::Stopped));

        assert_eq!(reg.start_all_services(), 1);
        assert_eq!(reg.tick_all().ticked, 1);

        assert_eq!(reg.stop_all_services(), 1);
        assert_eq!(reg.tick_all().ticked, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(reg.state("s"), Some(ServiceState::Stopped));
    }

    #[test]
    fn hooks_fire_once_per_transition() {
        let reg = ServiceRegistry::new();
        let svc = Arc::new(Hooked::default());
        reg.register_service(svc.clone()).unwrap();

        reg.start_all_services();
        reg.start_all_services();
        assert!(!reg.start_service("hooked"));
        assert_eq!(svc.starts.load(Ordering::SeqCst), 1);

        assert!(reg.stop_service("hooked"));
        assert!(!reg.stop_service("hooked"));
        assert_eq!(svc.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_stops_started_service() {
        let reg = ServiceRegistry::new();
        let svc = Arc::new(Hooked::default());
        reg.register_service(svc.clone()).unwrap();
        reg.start_all_services();

        assert!(reg.unregister_service("hooked"));
        assert_eq!(svc.stops.load(Ordering::SeqCst), 1);
        assert!(reg.state("hooked").is_none());
        assert!(!reg.unregister_service("hooked"));
    }

    #[test]
    fn failures_are_isolated_and_reported() {
        let reg = ServiceRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        reg.register_service(ServiceFn::arc("alpha", || Err(ServiceError::fail("disk full"))))
            .unwrap();
        reg.register_service(ServiceFn::arc("panicky", || -> Result<(), ServiceError> {
            panic!("tick exploded")
        }))
        .unwrap();
        reg.register_service(counter("beta", &hits)).unwrap();
        reg.start_all_services();

        let report = reg.tick_all();
        assert_eq!(report.ticked, 3);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].name, "alpha");
        assert_eq!(report.failures[0].error.as_label(), "service_failed");
        assert_eq!(report.failures[1].name, "panicky");
        assert_eq!(
            report.failures[1].error,
            ServiceError::Panicked {
                message: "tick exploded".into()
            }
        );
    }

    #[test]
    fn services_may_unregister_themselves_during_a_pass() {
        let reg = Arc::new(ServiceRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let reg_cb = Arc::clone(&reg);
        reg.register_service(ServiceFn::arc("once", move || {
            reg_cb.unregister_service("once");
            Ok(())
        }))
        .unwrap();
        reg.register_service(counter("after", &hits)).unwrap();
        reg.start_all_services();

        assert!(reg.tick_all().is_clean());
        assert_eq!(reg.names(), vec!["after".to_string()]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
