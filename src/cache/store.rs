//! Fetch Cache Module
//!
//! In-memory, key-addressed cache whose entries each carry their own TTL.
//! Expiration is evaluated lazily on read; `purge_expired` exists for the
//! optional background sweep.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};
use crate::clock::{Clock, SystemClock};

/// A cache shared between loaders and call sites.
pub type SharedCache<V> = Arc<RwLock<FetchCache<V>>>;

// == Fetch Cache ==
/// Time-boxed key/value cache.
#[derive(Debug)]
pub struct FetchCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Time source for TTL checks
    clock: Arc<dyn Clock>,
}

impl<V> FetchCache<V> {
    // == Constructor ==
    /// Creates an empty cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache that reads time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            clock,
        }
    }

    /// Wraps the cache for sharing across tasks.
    pub fn into_shared(self) -> SharedCache<V> {
        Arc::new(RwLock::new(self))
    }

    /// Current time according to this cache's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // == Set ==
    /// Stores `value` under `key`, fresh for `ttl_ms` from now.
    ///
    /// An existing entry is overwritten and its timestamp reset.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_ms: u64) {
        let entry = CacheEntry::new(value, ttl_ms, self.clock.now_ms());
        self.insert_entry(key, entry);
    }

    /// Stores a prebuilt entry, keeping its original timestamp.
    ///
    /// Used when rehydrating entries from durable storage so a value does not
    /// gain extra lifetime by passing through another layer.
    pub fn insert_entry(&mut self, key: impl Into<String>, entry: CacheEntry<V>) {
        self.entries.insert(key.into(), entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Remove ==
    /// Deletes the entry for `key`. Returns whether one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    /// Deletes every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        self.stats.set_total_entries(self.entries.len());
        before - self.entries.len()
    }

    // == Clear ==
    /// Removes all entries. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let count = before - self.entries.len();
        self.stats.record_expirations(count);
        self.stats.set_total_entries(self.entries.len());
        count
    }

    /// True if `key` holds an unexpired entry. Does not evict or count.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Keys of all unexpired entries, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }
}

impl<V: Clone> FetchCache<V> {
    // == Get ==
    /// Returns the value for `key` if present and fresh.
    ///
    /// An expired entry found here is evicted and the read counts as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                debug!(key, "cache hit");
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
            debug!(key, "cache entry expired");
        } else {
            debug!(key, "cache miss");
        }
        self.stats.record_miss();
        None
    }

    /// Returns a copy of the raw entry for `key` when fresh, without
    /// touching statistics.
    pub fn peek_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .cloned()
    }
}

impl<V> Default for FetchCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
