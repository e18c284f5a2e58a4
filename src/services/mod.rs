//! # Services and their registry.
//!
//! - [`Service`] - trait for named per-tick work
//! - [`ServiceFn`] - closure-backed service
//! - [`ServiceRef`] - shared reference to a service (`Arc<dyn Service>`)
//! - [`ServiceRegistry`] - uniform start/stop and the aggregate tick
//! - [`TickReport`] - per-pass outcome with isolated failures

mod registry;
mod service;
mod service_fn;

pub use registry::{DRIVER_TASK, ServiceFailure, ServiceRegistry, TickReport};
pub use service::{Service, ServiceRef, ServiceState};
pub use service_fn::ServiceFn;
