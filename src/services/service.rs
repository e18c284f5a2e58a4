//! # Service abstraction.
//!
//! A [`Service`] is a named unit of recurring per-tick work. The
//! [`ServiceRegistry`](crate::ServiceRegistry) owns services, starts and stops them
//! uniformly and calls [`Service::tick`] once per registry pass while a service is
//! started.
//!
//! The shared handle type is [`ServiceRef`], an `Arc<dyn Service>`.

use std::fmt;
use std::sync::Arc;

use crate::error::ServiceError;

/// # Named unit with a per-tick hook.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use tickwork::{Service, ServiceError};
///
/// #[derive(Default)]
/// struct Uptime {
///     ticks: AtomicU64,
/// }
///
/// impl Service for Uptime {
///     fn name(&self) -> &str { "uptime" }
///
///     fn tick(&self) -> Result<(), ServiceError> {
///         self.ticks.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
pub trait Service: Send + Sync + 'static {
    /// Returns a stable name, unique within a registry.
    fn name(&self) -> &str;

    /// Per-tick work. Runs on the tick thread while the service is started.
    fn tick(&self) -> Result<(), ServiceError>;

    /// Called when the registry moves the service to [`ServiceState::Started`].
    fn on_start(&self) {}

    /// Called when the registry moves the service to [`ServiceState::Stopped`].
    fn on_stop(&self) {}
}

/// Shared handle to a service.
pub type ServiceRef = Arc<dyn Service>;

/// Lifecycle state of a registered service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// Registered but not ticked.
    Stopped,
    /// Ticked once per registry pass.
    Started,
}

impl ServiceState {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceState::Stopped => "stopped",
            ServiceState::Started => "started",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
