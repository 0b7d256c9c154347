//! Subscription identity as seen by callers.

use std::fmt;
use uuid::Uuid;

/// Opaque identity of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Allocate a fresh id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A handle to a live subscription, used to unsubscribe it.
///
/// Dropping a handle does nothing; see
/// [`SubscriptionGuard`](super::SubscriptionGuard) for scoped subscriptions.
#[derive(Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    name: String,
}

impl SubscriptionHandle {
    pub(crate) fn new(id: SubscriptionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Get the subscription ID
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Name of the subscribed listener
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&SubscriptionHandle> for SubscriptionId {
    fn from(handle: &SubscriptionHandle) -> Self {
        handle.id
    }
}

impl From<SubscriptionHandle> for SubscriptionId {
    fn from(handle: SubscriptionHandle) -> Self {
        handle.id
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription '{}' ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(SubscriptionId::new(), SubscriptionId::new());
    }

    #[test]
    fn test_subscription_handle_display() {
        let id = SubscriptionId::new();
        let handle = SubscriptionHandle::new(id, "log-subscriber");

        assert_eq!(handle.id(), id);
        assert_eq!(handle.name(), "log-subscriber");
        assert_eq!(
            handle.to_string(),
            format!("Subscription 'log-subscriber' ({})", id)
        );
        assert_eq!(SubscriptionId::from(&handle), id);
    }
}
