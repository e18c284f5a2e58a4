//! # SubscriptionBox: ordered dispatch of active subscriptions.
//!
//! The box owns the activated subscriptions of one [`EventBus`](crate::EventBus) and
//! performs the per-tick dispatch.
//!
//! ## Dispatch
//! ```text
//! tick()
//!   ├─► snapshot slots (lock released before any callback runs)
//!   ├─► per event instance: mark = flag.pending_mark()  (None = clean)
//!   ├─► for slot in insertion order:
//!   │       live && mark.is_some() → callback(&event)   (panic → error!, continue)
//!   └─► per dirty instance: flag.ack(mark)              (reset once, after all callbacks)
//! ```
//!
//! ## Rules
//! - Every subscription bound to a dirty event fires **exactly once** per tick, in
//!   insertion order, and sees the event still dirty.
//! - The event is reset **once** after all of its callbacks ran.
//! - Dirty state is read per event instance, so subscriptions bound to two
//!   instances of the same type are dispatched independently.
//! - Dispatch reads the [`EventFlag`](crate::EventFlag) directly; overrides of
//!   [`Event::should_call`] or [`Event::reset`] are not consulted.
//! - Pings that land during the dispatch stay pending for the next tick.
//! - Callbacks may add/remove subscriptions: additions apply next tick, a removed
//!   subscription never fires after its removal.
//! - A panicking callback is isolated; the remaining callbacks still run.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{error, trace};

use super::event::{Event, EventKind};
use super::subscription::{Subscription, SubscriptionId};
use crate::error::panic_message;

/// Type-erased activated subscription.
struct Slot {
    id: SubscriptionId,
    kind: EventKind,
    event: Arc<dyn Event>,
    fire: Box<dyn Fn() + Send + Sync>,
    live: AtomicBool,
}

impl Slot {
    /// Identity of the bound event instance; dirty state is tracked per instance.
    fn instance(&self) -> *const () {
        Arc::as_ptr(&self.event) as *const ()
    }
}

/// Ordered collection of active subscriptions.
#[derive(Default)]
pub struct SubscriptionBox {
    slots: Mutex<Vec<Arc<Slot>>>,
}

impl SubscriptionBox {
    /// Creates an empty box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `sub` to the dispatch order.
    ///
    /// Returns `false` (and changes nothing) if the subscription is already present.
    pub fn add<E: Event>(&self, sub: &Subscription<E>) -> bool {
        let mut slots = self.slots.lock();
        if slots.iter().any(|s| s.id == sub.id()) {
            return false;
        }

        let event: Arc<E> = Arc::clone(sub.event());
        let bound = sub.clone();
        slots.push(Arc::new(Slot {
            id: sub.id(),
            kind: sub.kind(),
            event,
            fire: Box::new(move || bound.call()),
            live: AtomicBool::new(true),
        }));
        true
    }

    /// Removes the subscription with `id`.
    ///
    /// Returns `false` if it was not present; that is not an error.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut slots = self.slots.lock();
        match slots.iter().position(|s| s.id == id) {
            Some(idx) => {
                let slot = slots.remove(idx);
                slot.live.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// True if a subscription with `id` is active.
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.slots.lock().iter().any(|s| s.id == id)
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// True if no subscription is active.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Dispatches dirty events; returns the number of callbacks invoked.
    pub fn tick(&self) -> usize {
        let snapshot: Vec<Arc<Slot>> = self.slots.lock().clone();
        if snapshot.is_empty() {
            return 0;
        }

        let mut marks: HashMap<*const (), (&Slot, Option<u64>)> = HashMap::new();
        for slot in &snapshot {
            marks
                .entry(slot.instance())
                .or_insert_with(|| (slot.as_ref(), slot.event.flag().pending_mark()));
        }

        let mut invoked = 0;
        for slot in &snapshot {
            let dirty = matches!(marks.get(&slot.instance()), Some((_, Some(_))));
            if !dirty || !slot.live.load(Ordering::Acquire) {
                continue;
            }

            invoked += 1;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| (slot.fire)())) {
                error!(
                    subscription = %slot.id,
                    kind = %slot.kind,
                    panic = %panic_message(panic.as_ref()),
                    "subscription callback panicked"
                );
            }
        }

        for (slot, mark) in marks.into_values() {
            if let Some(mark) = mark {
                slot.event.flag().ack(mark);
                trace!(kind = %slot.kind, mark, "event dispatched");
            }
        }
        invoked
    }
}
