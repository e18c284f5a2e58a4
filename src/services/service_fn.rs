//! # Function-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] wraps a closure `F: Fn() -> Result<(), ServiceError>` that is called
//! once per registry pass. Shared state goes into the closure explicitly, usually as
//! an `Arc<...>`.
//!
//! ## Example
//! ```rust
//! use tickwork::{ServiceFn, ServiceRef, ServiceError};
//!
//! let s: ServiceRef = ServiceFn::arc("heartbeat", || {
//!     // do work...
//!     Ok::<_, ServiceError>(())
//! });
//!
//! assert_eq!(s.name(), "heartbeat");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::services::service::Service;

/// Function-backed service implementation.
#[derive(Debug)]
pub struct ServiceFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ServiceFn<F>
where
    F: Fn() -> Result<(), ServiceError> + Send + Sync + 'static,
{
    /// Creates a new function-backed service.
    ///
    /// Prefer [`ServiceFn::arc`] when you immediately need a
    /// [`ServiceRef`](crate::ServiceRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the service and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Service for ServiceFn<F>
where
    F: Fn() -> Result<(), ServiceError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&self) -> Result<(), ServiceError> {
        (self.f)()
    }
}
