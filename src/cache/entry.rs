//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached value together with when it was stored and how long it stays fresh.
///
/// Entries carry no clock of their own; freshness is always judged against a
/// caller-supplied `now` so the owning cache decides what time it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Freshness window in milliseconds
    pub ttl_ms: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stored at `now_ms` that stays fresh for `ttl_ms`.
    pub fn new(value: V, ttl_ms: u64, now_ms: u64) -> Self {
        Self {
            value,
            stored_at: now_ms,
            ttl_ms,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was written.
    ///
    /// A clock that went backwards yields an age of zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.stored_at)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL.
    ///
    /// Boundary condition: an entry whose age equals its TTL is still fresh.
    /// It expires on the first millisecond past the window.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.age_ms(now_ms) > self.ttl_ms
    }

    // == Time To Live ==
    /// Remaining freshness in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.ttl_ms.saturating_sub(self.age_ms(now_ms))
    }
}
