//! # Extension modules.
//!
//! A [`Module`] is a named extension that hooks into the runtime lifecycle: it is
//! enabled after the runtime's services are started and disabled before they stop.
//! Modules typically register events and services and arm tasks from
//! [`Module::on_enable`].
//!
//! [`ModuleRegistry`] keeps modules in registration order. Enabling walks that order,
//! disabling walks it in reverse.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::core::runtime::Runtime;
use crate::error::CoreError;

/// # Named extension with enable/disable hooks.
///
/// # Example
/// ```
/// use tickwork::{CoreError, Module, Runtime};
///
/// struct Greeter;
///
/// impl Module for Greeter {
///     fn name(&self) -> &str { "greeter" }
///
///     fn on_enable(&self, rt: &Runtime) -> Result<(), CoreError> {
///         let _ = rt.event_bus();
///         Ok(())
///     }
/// }
/// ```
pub trait Module: Send + Sync + 'static {
    /// Returns a stable name, unique within a registry.
    fn name(&self) -> &str;

    /// Called once the runtime is enabled (or on registration into an enabled runtime).
    fn on_enable(&self, rt: &Runtime) -> Result<(), CoreError>;

    /// Called before the runtime stops its services (or on removal from an enabled runtime).
    fn on_disable(&self, _rt: &Runtime) {}
}

/// Shared handle to a module.
pub type ModuleRef = Arc<dyn Module>;

/// Module whose `on_enable` failed.
#[derive(Debug)]
pub struct ModuleFailure {
    /// Name of the failing module.
    pub name: String,
    /// Error returned by `on_enable`.
    pub error: CoreError,
}

/// Ordered registry of modules.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Mutex<Vec<ModuleRef>>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `module`.
    ///
    /// Fails with [`CoreError::DuplicateModule`] if the name is taken.
    pub fn add_module(&self, module: ModuleRef) -> Result<(), CoreError> {
        let mut modules = self.modules.lock();
        if modules.iter().any(|m| m.name() == module.name()) {
            return Err(CoreError::DuplicateModule {
                name: module.name().to_string(),
            });
        }
        debug!(module = %module.name(), "module added");
        modules.push(module);
        Ok(())
    }

    /// Removes and returns the module called `name`.
    pub fn remove_module(&self, name: &str) -> Option<ModuleRef> {
        let mut modules = self.modules.lock();
        let idx = modules.iter().position(|m| m.name() == name)?;
        let module = modules.remove(idx);
        debug!(module = %name, "module removed");
        Some(module)
    }

    /// Returns the module called `name`.
    pub fn get(&self, name: &str) -> Option<ModuleRef> {
        self.modules
            .lock()
            .iter()
            .find(|m| m.name() == name)
            .cloned()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.modules
            .lock()
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.lock().len()
    }

    /// True if no module is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.lock().is_empty()
    }

    /// Modules in registration order.
    pub(crate) fn snapshot(&self) -> Vec<ModuleRef> {
        self.modules.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Module for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn on_enable(&self, _rt: &Runtime) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[test]
    fn keeps_order_and_rejects_duplicates() {
        let reg = ModuleRegistry::new();
        reg.add_module(Arc::new(Named("chat"))).unwrap();
        reg.add_module(Arc::new(Named("economy"))).unwrap();

        let err = reg.add_module(Arc::new(Named("chat"))).unwrap_err();
        assert_eq!(err.as_label(), "core_duplicate_module");
        assert_eq!(reg.names(), vec!["chat".to_string(), "economy".to_string()]);
    }

    #[test]
    fn remove_returns_the_module_once() {
        let reg = ModuleRegistry::new();
        reg.add_module(Arc::new(Named("chat"))).unwrap();

        assert!(reg.get("chat").is_some());
        let removed = reg.remove_module("chat").map(|m| m.name().to_string());
        assert_eq!(removed.as_deref(), Some("chat"));
        assert!(reg.remove_module("chat").is_none());
        assert!(reg.is_empty());
    }
}
