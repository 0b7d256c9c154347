//! Subscription registry and fanout.
//!
//! The [`Fanout`] keeps live subscriptions in registration order and
//! dispatches each publication to every matching listener, synchronously,
//! on the publishing thread.
//!
//! Publishing is the hot path. The subscription list sits behind an
//! [`ArcSwap`]; a publish clones the current `Arc` once and iterates that
//! snapshot, while subscribe and unsubscribe build a new list and swap it in.
//! Publishers never block each other or mutators, and a subscription is
//! either wholly in a snapshot or absent from it.

use crate::event::{Event, Payload};
use crate::subscription::{Delivery, Listener, Subscription, SubscriptionHandle, SubscriptionId};
use crate::{Error, Matcher, Result};
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

pub mod cache;
pub use cache::ListeningCache;

static NEXT_FANOUT_ID: AtomicU64 = AtomicU64::new(1);

/// What a failing listener does to the rest of a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerErrorPolicy {
    /// Stop at the first failing listener and return its error to the
    /// publisher; later listeners of that publish do not run
    #[default]
    Propagate,
    /// Log each failure and keep dispatching; publish succeeds
    Isolate,
}

/// The subscription registry.
#[derive(Debug)]
pub struct Fanout {
    id: u64,
    subscriptions: ArcSwap<Vec<Arc<Subscription>>>,
    cache: ListeningCache,
    policy: ListenerErrorPolicy,
}

impl Fanout {
    /// Create an empty registry that propagates listener errors
    pub fn new() -> Self {
        Self::with_cache(ListeningCache::new())
    }

    /// Create an empty registry around a pre-sized listening cache
    pub fn with_cache(cache: ListeningCache) -> Self {
        Self {
            id: NEXT_FANOUT_ID.fetch_add(1, Ordering::Relaxed),
            subscriptions: ArcSwap::from_pointee(Vec::new()),
            cache,
            policy: ListenerErrorPolicy::default(),
        }
    }

    /// Set the listener error policy
    pub fn with_policy(mut self, policy: ListenerErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Process-unique identity of this registry
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Listener error policy in force
    pub fn policy(&self) -> ListenerErrorPolicy {
        self.policy
    }

    /// Append a subscription at the end of the dispatch order
    pub fn subscribe(&self, matcher: Matcher, listener: Listener) -> SubscriptionHandle {
        let subscription = Arc::new(Subscription::new(matcher, listener));
        let handle = subscription.handle();

        self.subscriptions.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(subscription.clone());
            next
        });
        self.cache.invalidate();

        debug!(
            subscription_id = %handle.id(),
            matcher = %subscription.matcher(),
            listener = handle.name(),
            "Subscription registered"
        );
        handle
    }

    /// Remove a subscription. Returns false, and changes nothing, when it is
    /// not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        if !self.subscriptions.load().iter().any(|s| s.id() == id) {
            trace!(
                subscription_id = %id,
                "Unsubscribe of unknown subscription ignored"
            );
            return false;
        }

        let removed = self.remove_where(|subscription| subscription.id() == id);
        if removed > 0 {
            debug!(subscription_id = %id, "Subscription removed");
        }
        removed > 0
    }

    /// Remove every subscription whose matcher is exactly `name`
    pub fn unsubscribe_named(&self, name: &str) -> usize {
        let removed = self.remove_where(|s| s.matcher().is_exact(name));
        debug!(event = name, removed, "Named subscriptions removed");
        removed
    }

    fn remove_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Subscription) -> bool,
    {
        let mut removed = 0;
        self.subscriptions.rcu(|current| {
            let next: Vec<_> = current
                .iter()
                .filter(|subscription| !predicate(subscription))
                .cloned()
                .collect();
            removed = current.len() - next.len();
            next
        });
        self.cache.invalidate();
        removed
    }

    /// Remove every subscription
    pub fn clear(&self) {
        self.subscriptions.store(Arc::new(Vec::new()));
        self.cache.invalidate();
        debug!(registry = self.id, "Registry cleared");
    }

    /// True iff some live subscription matches `name`
    pub fn is_listening(&self, name: &str) -> bool {
        self.cache.is_listening(name, |name| {
            self.subscriptions
                .load()
                .iter()
                .any(|subscription| subscription.matches(name))
        })
    }

    /// Handles of the subscriptions matching `name`, in dispatch order
    pub fn listeners_for(&self, name: &str) -> Vec<SubscriptionHandle> {
        self.subscriptions
            .load()
            .iter()
            .filter(|subscription| subscription.matches(name))
            .map(|subscription| subscription.handle())
            .collect()
    }

    /// Dispatch a completed span to every matching listener
    pub fn publish(&self, event: &Event) -> Result<()> {
        self.dispatch(Delivery::Span(event))
    }

    /// Dispatch an untimed announcement to every matching raw listener
    pub fn raw_publish(&self, name: &str, payload: &Payload) -> Result<()> {
        self.dispatch(Delivery::Announcement { name, payload })
    }

    fn dispatch(&self, delivery: Delivery<'_>) -> Result<()> {
        let snapshot = self.subscriptions.load_full();
        let name = delivery.name();
        let mut delivered = 0usize;

        for subscription in snapshot.iter().filter(|s| s.matches(name)) {
            let Some(outcome) = subscription.deliver(delivery) else {
                continue;
            };
            delivered += 1;

            if let Err(source) = outcome {
                match self.policy {
                    ListenerErrorPolicy::Propagate => {
                        return Err(Error::ListenerFailed {
                            event: name.to_string(),
                            subscription: subscription.id(),
                            source,
                        });
                    }
                    ListenerErrorPolicy::Isolate => {
                        error!(
                            event = name,
                            subscription_id = %subscription.id(),
                            listener = subscription.listener().name(),
                            error = %source,
                            "Listener failed"
                        );
                    }
                }
            }
        }

        trace!(event = name, delivered, "Event dispatched");
        Ok(())
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.subscriptions.load().len()
    }

    /// Check if there are no subscriptions
    pub fn is_empty(&self) -> bool {
        self.subscriptions.load().is_empty()
    }

    /// Current registry statistics
    pub fn stats(&self) -> RegistryStats {
        let snapshot = self.subscriptions.load();
        let timed = snapshot.iter().filter(|s| s.listener().is_timed()).count();

        RegistryStats {
            subscriptions: snapshot.len(),
            timed,
            raw: snapshot.len() - timed,
            cached_names: self.cache.len(),
        }
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Live subscriptions
    pub subscriptions: usize,

    /// Subscriptions with timed listeners
    pub timed: usize,

    /// Subscriptions with raw listeners
    pub raw: usize,

    /// Names with a memoized listening answer
    pub cached_names: usize,
}

impl fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Registry Stats: {} subscriptions ({} timed, {} raw), {} cached names",
            self.subscriptions, self.timed, self.raw, self.cached_names
        )
    }
}
