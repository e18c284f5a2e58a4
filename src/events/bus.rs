//! # EventBus: live event instances and their subscriptions.
//!
//! [`EventBus`] keeps one live instance per [`EventKind`] and a
//! [`SubscriptionBox`] of activated subscriptions. It is itself a
//! [`Service`](crate::Service) named [`EventBus::SERVICE_NAME`]; the service registry
//! ticks it once per host cycle, which is when subscribers are called.
//!
//! ## Flow
//! ```text
//! owner:      bus.add_event(Arc::new(E))         (once, at construction)
//! consumer:   sub = bus.subscribe::<E>(cb)?      (Err if E unregistered)
//!             bus.add_subscription(&sub)         (activation is explicit)
//! producer:   bus.get_event::<E>()?.ping()       (any thread)
//! tick:       registry ──► bus.tick() ──► box dispatch ──► cb(&E)
//! ```
//!
//! ## Rules
//! - At most one instance per kind: a second `add_event` is rejected.
//! - Lookup is by exact kind; there is no subtype matching.
//! - `unsubscribe` of an absent subscription is a no-op.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tickwork::{Event, EventBus, EventFlag, impl_event};
//!
//! #[derive(Default)]
//! struct ScoreChanged {
//!     flag: EventFlag,
//! }
//! impl_event!(ScoreChanged);
//!
//! let bus = EventBus::new();
//! bus.add_event(Arc::new(ScoreChanged::default())).unwrap();
//!
//! let sub = bus.subscribe(|_: &ScoreChanged| println!("score changed")).unwrap();
//! bus.add_subscription(&sub);
//!
//! bus.get_event::<ScoreChanged>().unwrap().ping();
//! assert_eq!(bus.tick(), 1);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::event::{Event, EventKind};
use super::subscription::Subscription;
use super::subscription_box::SubscriptionBox;
use crate::error::{CoreError, ServiceError};
use crate::services::Service;

/// Registry of live events plus the dispatch box.
#[derive(Default)]
pub struct EventBus {
    events: RwLock<HashMap<EventKind, Arc<dyn Any + Send + Sync>>>,
    subscriptions: SubscriptionBox,
}

impl EventBus {
    /// Service name under which the bus registers itself.
    pub const SERVICE_NAME: &'static str = "event_bus";

    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `event` as the live instance of its kind.
    ///
    /// Fails with [`CoreError::DuplicateEvent`] if the kind already has an
    /// instance; the existing one stays live.
    pub fn add_event<E: Event>(&self, event: Arc<E>) -> Result<(), CoreError> {
        let kind = EventKind::of::<E>();
        let mut events = self.events.write();
        if events.contains_key(&kind) {
            return Err(CoreError::DuplicateEvent { kind: kind.name() });
        }
        events.insert(kind, event);
        drop(events);

        debug!(kind = %kind, "event registered");
        Ok(())
    }

    /// Returns the live instance of `E`, if any.
    pub fn get_event<E: Event>(&self) -> Option<Arc<E>> {
        let events = self.events.read();
        let entry = events.get(&EventKind::of::<E>())?;
        Arc::clone(entry).downcast::<E>().ok()
    }

    /// True if `E` has a live instance.
    pub fn has_event<E: Event>(&self) -> bool {
        self.events.read().contains_key(&EventKind::of::<E>())
    }

    /// Number of registered event kinds.
    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    /// Creates a subscription of `callback` to the live instance of `E`.
    ///
    /// The subscription is **not** active until passed to
    /// [`add_subscription`](Self::add_subscription).
    ///
    /// Fails with [`CoreError::UnregisteredEvent`] if `E` has no live instance;
    /// nothing is created in that case.
    pub fn subscribe<E, F>(&self, callback: F) -> Result<Subscription<E>, CoreError>
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let event = self
            .get_event::<E>()
            .ok_or(CoreError::UnregisteredEvent {
                kind: EventKind::of::<E>().name(),
            })?;
        Ok(Subscription::new(event, Arc::new(callback)))
    }

    /// Activates `sub`. Returns `false` if it was already active.
    pub fn add_subscription<E: Event>(&self, sub: &Subscription<E>) -> bool {
        let added = self.subscriptions.add(sub);
        if added {
            debug!(subscription = %sub.id(), kind = %sub.kind(), "subscription added");
        }
        added
    }

    /// Deactivates `sub`. Absent or already removed subscriptions are a no-op
    /// and return `false`.
    pub fn unsubscribe<E: Event>(&self, sub: &Subscription<E>) -> bool {
        let removed = self.subscriptions.remove(sub.id());
        if removed {
            debug!(subscription = %sub.id(), kind = %sub.kind(), "subscription removed");
        }
        removed
    }

    /// True if `sub` is currently active on this bus.
    pub fn is_subscribed<E: Event>(&self, sub: &Subscription<E>) -> bool {
        self.subscriptions.contains(sub.id())
    }

    /// Number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Runs one dispatch pass; returns the number of callbacks invoked.
    ///
    /// Must be called from the tick thread.
    pub fn tick(&self) -> usize {
        self.subscriptions.tick()
    }
}

impl Service for EventBus {
    fn name(&self) -> &str {
        Self::SERVICE_NAME
    }

    fn tick(&self) -> Result<(), ServiceError> {
        EventBus::tick(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::events::EventFlag;

    #[derive(Default)]
    struct Moved {
        flag: EventFlag,
    }

    #[derive(Default)]
    struct Unknown {
        flag: EventFlag,
    }

    crate::impl_event!(Moved, Unknown);

    #[test]
    fn duplicate_kind_is_rejected_and_first_instance_survives() {
        let bus = EventBus::new();
        let first = Arc::new(Moved::default());
        bus.add_event(Arc::clone(&first)).unwrap();

        let err = bus.add_event(Arc::new(Moved::default())).unwrap_err();
        assert_eq!(err.as_label(), "core_duplicate_event");

        let live = bus.get_event::<Moved>().unwrap();
        assert!(Arc::ptr_eq(&live, &first));
        assert_eq!(bus.event_count(), 1);
    }

    #[test]
    fn lookup_of_missing_kind_is_none() {
        let bus = EventBus::new();
        assert!(bus.get_event::<Moved>().is_none());
        assert!(!bus.has_event::<Moved>());
    }

    #[test]
    fn subscribe_to_unregistered_kind_fails_without_side_effects() {
        let bus = EventBus::new();
        bus.add_event(Arc::new(Moved::default())).unwrap();

        let err = bus.subscribe(|_: &Unknown| {}).unwrap_err();
        assert!(matches!(err, CoreError::UnregisteredEvent { .. }));
        assert_eq!(bus.subscription_count(), 0);
        assert_eq!(bus.event_count(), 1);
    }

    #[test]
    fn subscribe_does_not_activate() {
        let bus = EventBus::new();
        bus.add_event(Arc::new(Moved::default())).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_cb = Arc::clone(&hits);

        let sub = bus
            .subscribe(move |_: &Moved| {
                hits_cb.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(!bus.is_subscribed(&sub));

        bus.get_event::<Moved>().unwrap().ping();
        assert_eq!(bus.tick(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert!(bus.add_subscription(&sub));
        assert_eq!(bus.tick(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        bus.add_event(Arc::new(Moved::default())).unwrap();
        let kept = bus.subscribe(|_: &Moved| {}).unwrap();
        let dropped = bus.subscribe(|_: &Moved| {}).unwrap();
        let never_added = bus.subscribe(|_: &Moved| {}).unwrap();
        bus.add_subscription(&kept);
        bus.add_subscription(&dropped);

        assert!(bus.unsubscribe(&dropped));
        assert!(!bus.unsubscribe(&dropped));
        assert!(!bus.unsubscribe(&never_added));
        assert_eq!(bus.subscription_count(), 1);
        assert!(bus.is_subscribed(&kept));
    }

    #[test]
    fn bus_ticks_as_a_service() {
        let bus = EventBus::new();
        bus.add_event(Arc::new(Moved::default())).unwrap();
        let sub = bus.subscribe(|_: &Moved| {}).unwrap();
        bus.add_subscription(&sub);
        bus.get_event::<Moved>().unwrap().ping();

        let svc: &dyn Service = &bus;
        assert_eq!(svc.name(), "event_bus");
        assert!(svc.tick().is_ok());
        assert!(!bus.get_event::<Moved>().unwrap().should_call());
    }
}
