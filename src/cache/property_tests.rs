//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check freshness and bookkeeping over arbitrary inputs.
//! Time is driven by a `ManualClock`, so no case sleeps.

use proptest::prelude::*;
use std::sync::Arc;

use crate::cache::FetchCache;
use crate::clock::ManualClock;

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,32}"
}

/// Generates cache values
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String, ttl: u64 },
    Get { key: String },
    Remove { key: String },
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // Small key space so operations collide
    let key = "[a-d]";
    prop_oneof![
        (key, value_strategy(), 0u64..500)
            .prop_map(|(key, value, ttl)| CacheOp::Set { key, value, ttl }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Remove { key }),
        (0u64..300).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

fn manual_cache() -> (FetchCache<String>, ManualClock) {
    let clock = ManualClock::new(1_000_000);
    (FetchCache::with_clock(Arc::new(clock.clone())), clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Freshness: a value is served exactly while its age is within the TTL,
    // and a read past the window evicts it.
    #[test]
    fn prop_freshness_window(
        key in key_strategy(),
        value in value_strategy(),
        ttl in 0u64..10_000,
        elapsed in 0u64..20_000,
    ) {
        let (mut cache, clock) = manual_cache();
        cache.set(key.clone(), value.clone(), ttl);
        clock.advance(elapsed);

        let got = cache.get(&key);
        if elapsed <= ttl {
            prop_assert_eq!(got, Some(value));
            prop_assert!(cache.keys().contains(&key));
        } else {
            prop_assert_eq!(got, None);
            prop_assert!(cache.keys().is_empty());
            prop_assert!(cache.is_empty());
        }
    }

    // Overwrite: the second set wins and there is still one entry.
    #[test]
    fn prop_last_write_wins(
        key in key_strategy(),
        first in value_strategy(),
        second in value_strategy(),
    ) {
        let (mut cache, _) = manual_cache();
        cache.set(key.clone(), first, 1_000);
        cache.set(key.clone(), second.clone(), 1_000);

        prop_assert_eq!(cache.get(&key), Some(second));
        prop_assert_eq!(cache.len(), 1);
    }

    // Statistics: hits and misses match what reads actually returned, and a
    // model map agrees with the cache on every read.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (mut cache, clock) = manual_cache();
        let mut model: std::collections::HashMap<String, (String, u64, u64)> =
            std::collections::HashMap::new();
        let mut hits = 0u64;
        let mut misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, value, ttl } => {
                    model.insert(key.clone(), (value.clone(), clock_now(&clock), ttl));
                    cache.set(key, value, ttl);
                }
                CacheOp::Get { key } => {
                    let now = clock_now(&clock);
                    let expected = match model.get(&key) {
                        Some((value, at, ttl)) if now - at <= *ttl => Some(value.clone()),
                        _ => {
                            model.remove(&key);
                            None
                        }
                    };
                    let got = cache.get(&key);
                    if got.is_some() { hits += 1 } else { misses += 1 }
                    prop_assert_eq!(got, expected);
                }
                CacheOp::Remove { key } => {
                    model.remove(&key);
                    cache.remove(&key);
                }
                CacheOp::Advance { ms } => clock.advance(ms),
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, hits);
        prop_assert_eq!(stats.misses, misses);
        prop_assert_eq!(stats.total_entries, cache.len());
    }
}

fn clock_now(clock: &ManualClock) -> u64 {
    use crate::clock::Clock;
    clock.now_ms()
}
