//! Fixed-capacity memo store with least-recently-used eviction.
//!
//! Prefix invalidation is not indexed: [`LruCache::remove_with_prefix`] clears
//! the whole cache. Callers expecting only matching keys to disappear will see
//! extra removals, never missing ones.

pub mod keys;

use std::collections::{BTreeMap, HashMap};

pub use keys::{CacheKey, InvalidationGroup};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stamp: u64,
}

#[derive(Debug, Clone)]
pub struct LruCache<V> {
    capacity: usize,
    entries: HashMap<String, Entry<V>>,
    /// Recency stamp -> key; the first entry is the least recently used.
    recency: BTreeMap<u64, String>,
    clock: u64,
}

impl<V> LruCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks membership without touching recency.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the value and promotes it to most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let stamp = self.next_stamp();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.stamp);
        entry.stamp = stamp;
        self.recency.insert(stamp, key.to_string());
        Some(&entry.value)
    }

    /// Inserts or replaces `key`, evicting the least recently used entry when full.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let stamp = self.next_stamp();
        if let Some(entry) = self.entries.get_mut(&key) {
            self.recency.remove(&entry.stamp);
            entry.stamp = stamp;
            entry.value = value;
            self.recency.insert(stamp, key);
            return;
        }
        self.entries.insert(key.clone(), Entry { value, stamp });
        self.recency.insert(stamp, key);
        while self.entries.len() > self.capacity {
            match self.recency.pop_first() {
                Some((_, oldest)) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.stamp);
        Some(entry.value)
    }

    pub fn remove_all(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    /// Drops every entry whose key starts with `prefix`. Without a prefix index
    /// this clears the entire cache; returns the number of entries dropped.
    pub fn remove_with_prefix(&mut self, prefix: &str) -> usize {
        let dropped = self.entries.len();
        tracing::trace!(prefix, dropped, "prefix invalidation cleared cache");
        self.remove_all();
        dropped
    }

    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}
