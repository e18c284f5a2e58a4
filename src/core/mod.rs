//! Runtime core: lifecycle, modules and task execution.
//!
//! The public API from this module is [`Runtime`], the context object that owns the
//! bus and registries, plus the [`Module`] extension hook.
//!
//! Internal modules:
//! - [`runner`]: executes one task run with panic isolation and logging;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`modules`]: module trait and registry;
//! - [`runtime`]: enable/disable lifecycle.

pub(crate) mod modules;
pub(crate) mod runner;
pub(crate) mod runtime;
pub(crate) mod shutdown;

pub use modules::{Module, ModuleFailure, ModuleRef, ModuleRegistry};
pub use runtime::{EnableReport, Runtime, RuntimeState};
pub use shutdown::{ShutdownSignal, wait_for_shutdown_signal};
