//! Error types used by the tickwork runtime, services and tasks.
//!
//! This module defines four error enums:
//!
//! - [`CoreError`]: misuse of the coordination API (registration, lifecycle).
//! - [`SchedulerError`]: the host scheduler refused a registration.
//! - [`ServiceError`]: a service's per-tick hook failed.
//! - [`TaskError`]: a task body failed.
//!
//! All of them provide `as_label` (stable snake_case, for logs) and `as_message`.

use thiserror::Error;

/// # Errors produced by the coordination API.
///
/// These are caller-programming errors or host refusals. They are always
/// returned synchronously and never swallowed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoreError {
    /// `subscribe` was called for an event kind that has no live instance.
    #[error("unregistered event kind: {kind}")]
    UnregisteredEvent {
        /// Type name of the requested kind.
        kind: &'static str,
    },

    /// A second instance of an already registered event kind was added.
    #[error("event kind already registered: {kind}")]
    DuplicateEvent {
        /// Type name of the rejected kind.
        kind: &'static str,
    },

    /// A service with the same name is already registered.
    #[error("service already registered: {name}")]
    DuplicateService {
        /// The colliding service name.
        name: String,
    },

    /// A module with the same name is already registered.
    #[error("module already registered: {name}")]
    DuplicateModule {
        /// The colliding module name.
        name: String,
    },

    /// A lifecycle hook was called out of order or more than once.
    #[error("cannot {op} runtime in state {state}")]
    Lifecycle {
        /// The attempted operation (`enable` / `disable`).
        op: &'static str,
        /// The runtime state at the time of the call.
        state: &'static str,
    },

    /// The host scheduler rejected a registration.
    #[error("scheduler rejected registration: {0}")]
    Scheduler(#[from] SchedulerError),
}

impl CoreError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use tickwork::CoreError;
    ///
    /// let err = CoreError::DuplicateService { name: "chat".into() };
    /// assert_eq!(err.as_label(), "core_duplicate_service");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CoreError::UnregisteredEvent { .. } => "core_unregistered_event",
            CoreError::DuplicateEvent { .. } => "core_duplicate_event",
            CoreError::DuplicateService { .. } => "core_duplicate_service",
            CoreError::DuplicateModule { .. } => "core_duplicate_module",
            CoreError::Lifecycle { .. } => "core_lifecycle",
            CoreError::Scheduler(inner) => inner.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CoreError::UnregisteredEvent { kind } => format!("no live event of kind {kind}"),
            CoreError::DuplicateEvent { kind } => format!("duplicate event kind {kind}"),
            CoreError::DuplicateService { name } => format!("duplicate service name={name}"),
            CoreError::DuplicateModule { name } => format!("duplicate module name={name}"),
            CoreError::Lifecycle { op, state } => format!("{op} not allowed while {state}"),
            CoreError::Scheduler(inner) => inner.as_message(),
        }
    }
}

/// # Errors produced by a host scheduler.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler is shutting down and accepts no new work.
    #[error("scheduler is shutting down")]
    ShuttingDown,

    /// Background execution was requested but no async runtime is available.
    #[error("no background runtime available")]
    NoBackgroundRuntime,
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::ShuttingDown => "scheduler_shutting_down",
            SchedulerError::NoBackgroundRuntime => "scheduler_no_background_runtime",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SchedulerError::ShuttingDown => "host scheduler is shutting down".to_string(),
            SchedulerError::NoBackgroundRuntime => {
                "background work needs a tokio runtime handle".to_string()
            }
        }
    }
}

/// # Errors produced by a service tick.
///
/// Caught by the [`ServiceRegistry`](crate::ServiceRegistry) and reported per
/// service; never propagated out of a tick pass.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The tick hook returned an error.
    #[error("tick failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The tick hook panicked.
    #[error("tick panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl ServiceError {
    /// Convenience constructor for [`ServiceError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ServiceError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Fail { .. } => "service_failed",
            ServiceError::Panicked { .. } => "service_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServiceError::Fail { error } => format!("error: {error}"),
            ServiceError::Panicked { message } => format!("panic: {message}"),
        }
    }
}

/// # Errors produced by task execution.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task body returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task body panicked.
    #[error("task panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use tickwork::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { message } => format!("panic: {message}"),
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_error_converts_into_core_error() {
        let err: CoreError = SchedulerError::ShuttingDown.into();
        assert_eq!(err.as_label(), "scheduler_shutting_down");
        assert!(err.to_string().contains("shutting down"));
    }

    #[test]
    fn panic_message_handles_common_payloads() {
        let static_str: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(static_str.as_ref()), "boom");

        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(owned.as_ref()), "owned boom");

        let other: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn lifecycle_message_names_op_and_state() {
        let err = CoreError::Lifecycle {
            op: "enable",
            state: "enabled",
        };
        assert_eq!(err.to_string(), "cannot enable runtime in state enabled");
        assert_eq!(err.as_message(), "enable not allowed while enabled");
    }
}
