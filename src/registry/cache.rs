//! Memoized "is anyone listening to this name" answers.

use dashmap::DashMap;
use tracing::trace;

/// Per-registry cache of listening answers, keyed by event name.
///
/// Invalidation always drops every entry: a pattern subscription can match
/// an unbounded set of names, so there is no narrower sound invalidation.
///
/// A miss is computed while the entry's shard is write-locked. Mutators swap
/// the subscription snapshot and then [`invalidate`](Self::invalidate), which
/// has to pass through every shard lock; an answer computed from the old
/// snapshot is therefore either cleared or was never inserted.
#[derive(Debug, Default)]
pub struct ListeningCache {
    entries: DashMap<String, bool>,
}

impl ListeningCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with room for `capacity` names
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Cached answer for `name`, computing and storing it on a miss
    pub fn is_listening<F>(&self, name: &str, compute: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        if let Some(hit) = self.entries.get(name) {
            return *hit;
        }

        *self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| {
                let listening = compute(name);
                trace!(event = name, listening, "Listening cache miss");
                listening
            })
    }

    /// Drop every cached answer
    pub fn invalidate(&self) {
        self.entries.clear();
    }

    /// Number of cached names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_miss_then_hit() {
        let cache = ListeningCache::new();
        let computed = Cell::new(0);

        let compute = |_: &str| {
            computed.set(computed.get() + 1);
            true
        };
        assert!(cache.is_listening("render", compute));
        assert!(cache.is_listening("render", |_| unreachable!("cached")));
        assert_eq!(computed.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_clears_all_names() {
        let cache = ListeningCache::with_capacity(4);
        assert!(!cache.is_listening("a", |_| false));
        assert!(cache.is_listening("b", |_| true));
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.is_listening("a", |_| true));
    }
}
