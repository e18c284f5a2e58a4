//! # Polled events and their kind discriminant.
//!
//! An [`Event`] is a long-lived token that says "something changed". Producers call
//! [`Event::ping`]; nothing is delivered until the owning
//! [`EventBus`](crate::EventBus) ticks and finds the event dirty.
//!
//! The dirty state lives in an [`EventFlag`], a pair of monotonic counters:
//! - `raised` is bumped by every `ping()`;
//! - `acked` records the last `raised` value a dispatch has consumed.
//!
//! The event is dirty while `raised > acked`. Dispatch snapshots `raised` before it
//! calls subscribers and acknowledges only that snapshot, so a ping that races with
//! a dispatch stays pending for the next tick instead of being lost.
//!
//! ## Example
//! ```rust
//! use tickwork::{Event, EventFlag, impl_event};
//!
//! #[derive(Default)]
//! struct BalanceChanged {
//!     flag: EventFlag,
//! }
//! impl_event!(BalanceChanged);
//!
//! let ev = BalanceChanged::default();
//! ev.ping();
//! ev.ping();
//! assert!(ev.should_call());
//! ev.reset();
//! assert!(!ev.should_call());
//! ```

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Dirty flag carried by every [`Event`].
#[derive(Debug, Default)]
pub struct EventFlag {
    raised: AtomicU64,
    acked: AtomicU64,
}

impl EventFlag {
    /// Creates a clean flag.
    pub const fn new() -> Self {
        Self {
            raised: AtomicU64::new(0),
            acked: AtomicU64::new(0),
        }
    }

    /// Marks the flag dirty. Safe from any thread.
    #[inline]
    pub fn ping(&self) {
        self.raised.fetch_add(1, Ordering::AcqRel);
    }

    /// True if a ping has not been consumed by a dispatch yet.
    #[inline]
    pub fn should_call(&self) -> bool {
        self.raised.load(Ordering::Acquire) > self.acked.load(Ordering::Acquire)
    }

    /// Clears every pending ping.
    #[inline]
    pub fn reset(&self) {
        let raised = self.raised.load(Ordering::Acquire);
        self.acked.fetch_max(raised, Ordering::AcqRel);
    }

    /// Returns the current `raised` counter if the flag is dirty.
    pub(crate) fn pending_mark(&self) -> Option<u64> {
        let raised = self.raised.load(Ordering::Acquire);
        (raised > self.acked.load(Ordering::Acquire)).then_some(raised)
    }

    /// Acknowledges pings up to and including `mark`.
    pub(crate) fn ack(&self, mark: u64) {
        self.acked.fetch_max(mark, Ordering::AcqRel);
    }
}

/// A polled, coalescing notification.
///
/// Implementors only provide [`flag`](Event::flag); the remaining methods delegate to
/// it. Use [`impl_event!`](crate::impl_event) for structs holding a `flag: EventFlag`
/// field.
///
/// Bus dispatch reads and acknowledges the [`EventFlag`] directly. Overriding
/// `should_call` or `reset` changes what callers of those methods observe, never
/// when subscribers fire.
pub trait Event: Send + Sync + 'static {
    /// The flag backing this event's dirty state.
    fn flag(&self) -> &EventFlag;

    /// Marks the event dirty. Repeated pings before the next dispatch collapse
    /// into one notification.
    fn ping(&self) {
        self.flag().ping();
    }

    /// True if the next dispatch will invoke this event's subscribers.
    fn should_call(&self) -> bool {
        self.flag().should_call()
    }

    /// Clears the dirty state.
    fn reset(&self) {
        self.flag().reset();
    }
}

/// Implements [`Event`] for types with a `flag: EventFlag` field.
#[macro_export]
macro_rules! impl_event {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::Event for $t {
                fn flag(&self) -> &$crate::EventFlag {
                    &self.flag
                }
            }
        )+
    };
}

/// Stable discriminant of an event type.
///
/// Two kinds are equal iff they were derived from the same Rust type. The type
/// name is kept for diagnostics only.
#[derive(Clone, Copy)]
pub struct EventKind {
    id: TypeId,
    name: &'static str,
}

impl EventKind {
    /// Returns the kind of `E`.
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
        }
    }

    /// Fully qualified type name of the kind.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKind {}

impl Hash for EventKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventKind").field(&self.name).finish()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Alpha {
        flag: EventFlag,
    }

    #[derive(Default)]
    struct Beta {
        flag: EventFlag,
    }

    crate::impl_event!(Alpha, Beta);

    #[test]
    fn pings_coalesce_until_reset() {
        let ev = Alpha::default();
        assert!(!ev.should_call());

        for _ in 0..5 {
            ev.ping();
        }
        assert!(ev.should_call());

        ev.reset();
        assert!(!ev.should_call());
    }

    #[test]
    fn ack_keeps_later_pings_pending() {
        let flag = EventFlag::new();
        flag.ping();
        let mark = flag.pending_mark().expect("dirty after ping");

        flag.ping();
        flag.ack(mark);
        assert!(flag.should_call(), "ping after the snapshot must survive");

        let mark = flag.pending_mark().expect("still dirty");
        flag.ack(mark);
        assert!(!flag.should_call());
        assert!(flag.pending_mark().is_none());
    }

    #[test]
    fn stale_ack_never_rewinds() {
        let flag = EventFlag::new();
        flag.ping();
        flag.ping();
        flag.reset();
        flag.ack(1);
        assert!(!flag.should_call());
    }

    #[test]
    fn kinds_compare_by_type() {
        assert_eq!(EventKind::of::<Alpha>(), EventKind::of::<Alpha>());
        assert_ne!(EventKind::of::<Alpha>(), EventKind::of::<Beta>());
        assert!(EventKind::of::<Beta>().name().ends_with("Beta"));
    }
}
