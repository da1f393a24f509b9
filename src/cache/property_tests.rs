//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache invariants under arbitrary operation
//! sequences.

use proptest::prelude::*;
use std::collections::HashSet;

use crate::cache::ObjectCache;

// == Test Configuration ==
const TEST_MAX_CACHE_SIZE: usize = 4096;
const TEST_MAX_OBJECT_SIZE: usize = 512;

// == Strategies ==
/// Generates request URIs from a small host/path space so keys repeat
fn uri_strategy() -> impl Strategy<Value = String> {
    ("[a-c]", "[a-z0-9]{0,3}").prop_map(|(host, path)| format!("http://{}.test/{}", host, path))
}

/// Generates payloads, including some over the object size limit
fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=TEST_MAX_OBJECT_SIZE + 64)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Store { key: String, payload: Vec<u8> },
    Lookup { key: String },
    Evict,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (uri_strategy(), payload_strategy())
            .prop_map(|(key, payload)| CacheOp::Store { key, payload }),
        2 => uri_strategy().prop_map(|key| CacheOp::Lookup { key }),
        1 => Just(CacheOp::Evict),
    ]
}

fn assert_invariants(cache: &ObjectCache) -> Result<(), TestCaseError> {
    let entries = cache.entries();

    let keys: HashSet<&str> = entries.iter().map(|e| e.key.as_str()).collect();
    prop_assert_eq!(keys.len(), entries.len(), "Duplicate keys resident");

    let sum: usize = entries.iter().map(|e| e.size()).sum();
    prop_assert_eq!(sum, cache.total_size(), "total_size out of sync");
    prop_assert!(cache.total_size() <= cache.max_cache_size());
    prop_assert!(entries.len() <= cache.capacity());
    for entry in entries {
        prop_assert!(entry.size() <= cache.max_object_size());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing a cacheable payload and looking it up right away returns the
    // same bytes.
    #[test]
    fn prop_roundtrip_storage(
        key in uri_strategy(),
        payload in prop::collection::vec(any::<u8>(), 0..=TEST_MAX_OBJECT_SIZE)
    ) {
        let mut cache = ObjectCache::new(TEST_MAX_CACHE_SIZE, TEST_MAX_OBJECT_SIZE).unwrap();

        prop_assert!(cache.store(key.clone(), payload.clone()));

        let retrieved = cache.lookup(&key).unwrap();
        prop_assert_eq!(retrieved.len(), payload.len());
        prop_assert_eq!(retrieved, payload);
    }

    // Any sequence of store/lookup/evict keeps keys unique, the byte
    // accounting exact and every limit respected.
    #[test]
    fn prop_capacity_invariants(ops in prop::collection::vec(cache_op_strategy(), 1..120)) {
        let mut cache = ObjectCache::new(TEST_MAX_CACHE_SIZE, TEST_MAX_OBJECT_SIZE).unwrap();

        for op in ops {
            match op {
                CacheOp::Store { key, payload } => {
                    let fits = payload.len() <= TEST_MAX_OBJECT_SIZE;
                    prop_assert_eq!(cache.store(key, payload), fits);
                }
                CacheOp::Lookup { key } => {
                    let _ = cache.lookup(&key);
                }
                CacheOp::Evict => {
                    let _ = cache.evict();
                }
            }
            assert_invariants(&cache)?;
        }
    }

    // Eviction always takes the resident with the globally smallest recency
    // tick, and the victim misses afterwards.
    #[test]
    fn prop_evict_takes_global_minimum(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let mut cache = ObjectCache::new(TEST_MAX_CACHE_SIZE, TEST_MAX_OBJECT_SIZE).unwrap();

        for op in ops {
            match op {
                CacheOp::Store { key, payload } => {
                    cache.store(key, payload);
                }
                CacheOp::Lookup { key } => {
                    let _ = cache.lookup(&key);
                }
                CacheOp::Evict => {}
            }
        }
        prop_assume!(!cache.is_empty());

        let expected = cache
            .entries()
            .iter()
            .min_by_key(|e| e.recency)
            .map(|e| e.key.clone())
            .unwrap();

        let evicted = cache.evict().unwrap();
        prop_assert_eq!(&evicted, &expected);
        prop_assert!(cache.lookup(&evicted).is_none());
    }

    // Storing the same key repeatedly never leaves more than one entry.
    #[test]
    fn prop_store_deduplicates(
        key in uri_strategy(),
        payloads in prop::collection::vec(
            prop::collection::vec(any::<u8>(), 0..=TEST_MAX_OBJECT_SIZE),
            1..10
        )
    ) {
        let mut cache = ObjectCache::new(TEST_MAX_CACHE_SIZE, TEST_MAX_OBJECT_SIZE).unwrap();
        let last = payloads.last().cloned().unwrap();

        for payload in payloads {
            cache.store(key.clone(), payload);
        }

        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(cache.lookup(&key).unwrap(), last);
    }

    // Recency ticks of resident entries are all distinct, so eviction order
    // is total.
    #[test]
    fn prop_recency_ticks_unique(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let mut cache = ObjectCache::new(TEST_MAX_CACHE_SIZE, TEST_MAX_OBJECT_SIZE).unwrap();

        for op in ops {
            match op {
                CacheOp::Store { key, payload } => {
                    cache.store(key, payload);
                }
                CacheOp::Lookup { key } => {
                    let _ = cache.lookup(&key);
                }
                CacheOp::Evict => {
                    let _ = cache.evict();
                }
            }
        }

        let ticks: HashSet<u64> = cache.entries().iter().map(|e| e.recency).collect();
        prop_assert_eq!(ticks.len(), cache.len());
    }
}
