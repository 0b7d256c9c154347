//! Subscriptions held by the registry.
//!
//! A [`Subscription`] ties a [`Matcher`] to a [`Listener`] under a fresh
//! [`SubscriptionId`]. Only the registry owns subscriptions; callers get a
//! [`SubscriptionHandle`] back.

use crate::event::{Event, Payload};
use crate::{ListenerResult, Matcher};

pub mod guard;
pub mod handle;
pub mod listener;

pub use guard::SubscriptionGuard;
pub use handle::{SubscriptionHandle, SubscriptionId};
pub use listener::{FunctionListener, Listener, RawFunctionListener, RawListener, TimedListener};

/// What a single dispatch carries.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Delivery<'a> {
    /// A completed span
    Span(&'a Event),
    /// An untimed announcement
    Announcement { name: &'a str, payload: &'a Payload },
}

impl Delivery<'_> {
    pub(crate) fn name(&self) -> &str {
        match self {
            Delivery::Span(event) => event.name(),
            Delivery::Announcement { name, .. } => name,
        }
    }
}

/// A (matcher, listener, identity) triple.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    matcher: Matcher,
    listener: Listener,
}

impl Subscription {
    pub(crate) fn new(matcher: Matcher, listener: Listener) -> Self {
        Self {
            id: SubscriptionId::new(),
            matcher,
            listener,
        }
    }

    /// Subscription identity
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Subscription scope
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Subscribed listener
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Check whether this subscription wants events named `name`
    pub fn matches(&self, name: &str) -> bool {
        self.matcher.matches(name)
    }

    /// Caller-facing handle for this subscription
    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle::new(self.id, self.listener.name())
    }

    /// Invoke the listener. `None` means the listener does not take this kind
    /// of delivery: timed listeners never see announcements.
    pub(crate) fn deliver(&self, delivery: Delivery<'_>) -> Option<ListenerResult> {
        match (&self.listener, delivery) {
            (Listener::Timed(listener), Delivery::Span(event)) => Some(listener.on_event(event)),
            (Listener::Timed(_), Delivery::Announcement { .. }) => None,
            (Listener::Raw(listener), Delivery::Span(event)) => {
                Some(listener.on_publish(event.name(), event.payload()))
            }
            (Listener::Raw(listener), Delivery::Announcement { name, payload }) => {
                Some(listener.on_publish(name, payload))
            }
        }
    }
}
