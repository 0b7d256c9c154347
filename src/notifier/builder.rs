//! Builder pattern for constructing Notifier instances.

use super::config::NotifierConfig;
use super::Notifier;
use crate::registry::{Fanout, ListenerErrorPolicy, ListeningCache};
use std::sync::Arc;
use tracing::debug;

/// Builder for creating Notifier instances
#[derive(Debug, Clone, Default)]
pub struct NotifierBuilder {
    config: NotifierConfig,
}

impl NotifierBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom configuration
    pub fn config(mut self, config: NotifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure the notifier
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(NotifierConfig) -> NotifierConfig,
    {
        self.config = f(self.config);
        self
    }

    /// Log listener failures instead of returning them
    pub fn isolate_listener_errors(self) -> Self {
        self.configure(|c| c.listener_errors(ListenerErrorPolicy::Isolate))
    }

    /// Pre-size the listening cache
    pub fn cache_capacity(self, capacity: usize) -> Self {
        self.configure(|c| c.cache_capacity(capacity))
    }

    /// Build the Notifier
    pub fn build(self) -> Notifier {
        let fanout = Fanout::with_cache(ListeningCache::with_capacity(self.config.cache_capacity))
            .with_policy(self.config.listener_errors);

        debug!(
            registry = fanout.id(),
            policy = ?self.config.listener_errors,
            "Notifier built"
        );

        Notifier {
            fanout: Arc::new(fanout),
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let notifier = NotifierBuilder::new().build();
        assert_eq!(notifier.config(), &NotifierConfig::default());
        assert_eq!(notifier.fanout().policy(), ListenerErrorPolicy::Propagate);
    }

    #[test]
    fn test_builder_configurations() {
        let notifier = NotifierBuilder::new()
            .isolate_listener_errors()
            .cache_capacity(16)
            .build();
        assert_eq!(notifier.config().cache_capacity, 16);
        assert_eq!(notifier.fanout().policy(), ListenerErrorPolicy::Isolate);

        let notifier = NotifierBuilder::new()
            .config(NotifierConfig::isolated())
            .build();
        assert_eq!(notifier.fanout().policy(), ListenerErrorPolicy::Isolate);
    }
}
