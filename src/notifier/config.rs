//! Configuration for the notifier.

use crate::registry::ListenerErrorPolicy;

/// Configuration for a [`Notifier`](super::Notifier)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// What a failing listener does to the rest of a publish
    pub listener_errors: ListenerErrorPolicy,

    /// Initial capacity of the listening cache (distinct event names)
    pub cache_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            listener_errors: ListenerErrorPolicy::Propagate,
            cache_capacity: 64,
        }
    }
}

impl NotifierConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listener error policy
    pub fn listener_errors(mut self, policy: ListenerErrorPolicy) -> Self {
        self.listener_errors = policy;
        self
    }

    /// Set the listening cache capacity
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

/// Preset configurations for common use cases
impl NotifierConfig {
    /// Listener failures are logged and never reach publishers
    pub fn isolated() -> Self {
        Self::default().listener_errors(ListenerErrorPolicy::Isolate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_propagate() {
        let config = NotifierConfig::new();
        assert_eq!(config.listener_errors, ListenerErrorPolicy::Propagate);
        assert_eq!(config.cache_capacity, 64);
    }

    #[test]
    fn test_chained_setters() {
        let config = NotifierConfig::new()
            .cache_capacity(8)
            .listener_errors(ListenerErrorPolicy::Isolate);
        assert_eq!(config, NotifierConfig::isolated().cache_capacity(8));
    }
}
