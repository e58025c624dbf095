//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store behavior over generated operation sequences.

use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{CacheService, CacheStore, ManualClock};

// == Strategies ==
/// Generates keys shaped like derived query keys
fn key_strategy() -> impl Strategy<Value = String> {
    ("(inventory|archives|logs|search)", "[a-zA-Z]{1,12}", "[a-z0-9]{0,6}")
        .prop_map(|(ns, op, p)| format!("{ns}_{op}_{{\"p\":\"{p}\"}}"))
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: i64, ttl: u64 },
    Get { key: String },
    Advance { ms: u64 },
    ClearPattern { pattern: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<i64>(), 1u64..5_000)
            .prop_map(|(key, value, ttl)| CacheOp::Set { key, value, ttl }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        (0u64..3_000).prop_map(|ms| CacheOp::Advance { ms }),
        "(inventory|archives|logs|search|_|p)".prop_map(|pattern| CacheOp::ClearPattern { pattern }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Every read agrees with a reference model that tracks expiry by hand.
    #[test]
    fn prop_store_matches_reference_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let clock = ManualClock::new(0);
        let mut store = CacheStore::new(Arc::new(clock.clone()));
        let mut model: HashMap<String, (i64, u64)> = HashMap::new();
        let mut now = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, value, ttl } => {
                    store.set(key.clone(), json!(value), ttl);
                    model.insert(key, (value, now + ttl));
                }
                CacheOp::Get { key } => {
                    let expected = model
                        .get(&key)
                        .filter(|(_, expires)| now < *expires)
                        .map(|(v, _)| json!(v));
                    prop_assert_eq!(store.get(&key), expected);
                }
                CacheOp::Advance { ms } => {
                    clock.advance(ms);
                    now += ms;
                }
                CacheOp::ClearPattern { pattern } => {
                    store.clear_by_pattern(&pattern);
                    model.retain(|k, _| !k.contains(&pattern));
                }
            }
        }
    }

    // A value is readable right after set and absent once its TTL elapses.
    #[test]
    fn prop_ttl_expiry(key in key_strategy(), value in any::<i64>(), ttl in 1u64..1_000_000) {
        let clock = ManualClock::new(1_000);
        let mut store = CacheStore::new(Arc::new(clock.clone()));

        store.set(key.clone(), json!(value), ttl);
        prop_assert_eq!(store.get(&key), Some(json!(value)));

        clock.advance(ttl);
        prop_assert_eq!(store.get(&key), None);
    }

    // Pattern invalidation removes exactly the keys containing the pattern.
    #[test]
    fn prop_pattern_invalidation_exact(
        keys in prop::collection::hash_set(key_strategy(), 1..30),
        pattern in "(inventory|archives|logs|search)"
    ) {
        let mut store = CacheStore::new(Arc::new(ManualClock::new(0)));
        for key in &keys {
            store.set(key.clone(), json!(1), 60_000);
        }

        let expected_removed = keys.iter().filter(|k| k.contains(&pattern)).count();
        prop_assert_eq!(store.clear_by_pattern(&pattern), expected_removed);

        for key in &keys {
            prop_assert_eq!(store.contains_live(key), !key.contains(&pattern));
        }
    }

    // Hit and miss counters track every lookup.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let clock = ManualClock::new(0);
        let mut store = CacheStore::new(Arc::new(clock.clone()));
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, value, ttl } => store.set(key, json!(value), ttl),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Advance { ms } => clock.advance(ms),
                CacheOp::ClearPattern { pattern } => {
                    store.clear_by_pattern(&pattern);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.total_entries, store.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Concurrent writers and readers through the shared service only ever
    // observe complete values that some writer stored.
    #[test]
    fn prop_concurrent_reads_see_whole_values(
        keys in prop::collection::vec(key_strategy(), 1..10),
        writers in 2usize..6
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let cache = CacheService::new();
            let mut handles = Vec::new();

            for w in 0..writers {
                let cache = cache.clone();
                let keys = keys.clone();
                handles.push(tokio::spawn(async move {
                    for key in keys {
                        cache.set(key.clone(), json!({"writer": w, "payload": [w, w, w]}), 60_000).await;
                        if let Some(value) = cache.get(&key).await {
                            let writer = value["writer"].as_u64().unwrap();
                            assert_eq!(value["payload"], json!([writer, writer, writer]));
                        }
                    }
                }));
            }

            for handle in handles {
                handle.await.unwrap();
            }

            let stats = cache.stats().await;
            let distinct: std::collections::HashSet<_> = keys.iter().collect();
            assert_eq!(stats.total_entries, distinct.len());
        });
    }
}
