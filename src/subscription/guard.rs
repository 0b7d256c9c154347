//! Scoped subscriptions.

use super::SubscriptionHandle;
use crate::registry::Fanout;
use std::fmt;
use std::sync::{Arc, Weak};

/// Unsubscribes its subscription when dropped.
///
/// Holds the registry weakly, so a guard outliving its registry is harmless.
#[must_use = "the subscription is removed as soon as the guard is dropped"]
pub struct SubscriptionGuard {
    handle: SubscriptionHandle,
    fanout: Weak<Fanout>,
}

impl SubscriptionGuard {
    pub(crate) fn new(handle: SubscriptionHandle, fanout: &Arc<Fanout>) -> Self {
        Self {
            handle,
            fanout: Arc::downgrade(fanout),
        }
    }

    /// The guarded subscription
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Keep the subscription alive past the guard, returning a plain handle
    pub fn detach(mut self) -> SubscriptionHandle {
        self.fanout = Weak::new();
        self.handle.clone()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(fanout) = self.fanout.upgrade() {
            fanout.unsubscribe(self.handle.id());
        }
    }
}

impl fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("handle", &self.handle)
            .finish()
    }
}
