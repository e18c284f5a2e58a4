//! Typed, polled events: kinds, flags, subscriptions and the bus.
//!
//! ## Contents
//! - [`Event`], [`EventFlag`], [`EventKind`] the polled event model
//! - [`Subscription`] one event bound to one callback
//! - [`SubscriptionBox`] ordered per-tick dispatch
//! - [`EventBus`] live instances per kind; a [`Service`](crate::Service)
//!
//! ## Quick reference
//! - **Producers** call [`Event::ping`] from any thread.
//! - **Consumers** `subscribe` + `add_subscription` and are called on the tick thread.
//! - **Driver** is the service registry, which ticks the bus once per host cycle.

mod bus;
mod event;
mod subscription;
mod subscription_box;

pub use bus::EventBus;
pub use event::{Event, EventFlag, EventKind};
pub use subscription::{Callback, Subscription, SubscriptionId};
pub use subscription_box::SubscriptionBox;
