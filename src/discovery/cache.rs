use std::{collections::HashMap, hash::Hash, time::Duration};

use tokio::time::Instant;

/// Remembers successful lookups for a fixed freshness window.
#[derive(Debug)]
pub(crate) struct FreshnessCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
}

#[derive(Debug)]
struct Entry<V> {
    fetched_at: Instant,
    value: V,
}

impl<K: Eq + Hash, V> FreshnessCache<K, V> {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// The cached value for `key`, unless it is missing or older than the window.
    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| &entry.value)
    }

    pub(crate) fn insert(&mut self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                fetched_at: Instant::now(),
                value,
            },
        );
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
