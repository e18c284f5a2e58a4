//! # Subscriptions: one event, one callback.
//!
//! A [`Subscription`] is created by [`EventBus::subscribe`](crate::EventBus::subscribe)
//! and is inert until it is handed to
//! [`EventBus::add_subscription`](crate::EventBus::add_subscription). Creation and
//! activation are separate steps.
//!
//! Subscriptions compare by [`SubscriptionId`], a process-unique number, so a clone
//! can be used to remove the original.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::event::{Event, EventKind};

/// Global sequence for subscription ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(SUBSCRIPTION_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Callback invoked with the dirty event.
pub type Callback<E> = Arc<dyn Fn(&E) + Send + Sync + 'static>;

/// Binding of one live event instance to one callback.
pub struct Subscription<E: Event> {
    id: SubscriptionId,
    event: Arc<E>,
    callback: Callback<E>,
}

impl<E: Event> Subscription<E> {
    pub(crate) fn new(event: Arc<E>, callback: Callback<E>) -> Self {
        Self {
            id: SubscriptionId::next(),
            event,
            callback,
        }
    }

    /// Identity of this subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The event instance this subscription is bound to.
    pub fn event(&self) -> &Arc<E> {
        &self.event
    }

    /// Kind of the bound event.
    pub fn kind(&self) -> EventKind {
        EventKind::of::<E>()
    }

    /// Invokes the callback once with the bound event, regardless of its state.
    pub fn call(&self) {
        (self.callback)(&self.event);
    }
}

impl<E: Event> Clone for Subscription<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            event: Arc::clone(&self.event),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E: Event> PartialEq for Subscription<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E: Event> Eq for Subscription<E> {}

impl<E: Event> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}
