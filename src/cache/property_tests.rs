//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the LRU cache against a simple model and the
//! expiring store's namespace, snapshot and statistics behaviour.

use proptest::prelude::*;
use serde_json::json;
use std::thread::sleep;
use std::time::Duration;

use crate::cache::{ExpiringStore, Item, LruCache, Snapshot};

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

fn namespace_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![Just(None), Just(Some("ns1".to_string())), Just(Some("ns2".to_string()))]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

/// Reference LRU: a vector ordered most recent first.
struct ModelLru {
    capacity: usize,
    entries: Vec<(String, u32)>,
}

impl ModelLru {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    fn take(&mut self, key: &str) -> Option<(String, u32)> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos))
    }

    fn set(&mut self, key: String, value: u32) -> Option<(String, u32)> {
        self.take(&key);
        self.entries.insert(0, (key, value));
        if self.entries.len() > self.capacity {
            self.entries.pop()
        } else {
            None
        }
    }

    fn get(&mut self, key: &str) -> Option<u32> {
        let entry = self.take(key)?;
        let value = entry.1;
        self.entries.insert(0, entry);
        Some(value)
    }

    fn delete(&mut self, key: &str) -> Option<u32> {
        self.take(key).map(|(_, v)| v)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The LRU cache agrees with the reference model on every result and on
    // the final recency order.
    #[test]
    fn prop_lru_matches_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..80),
    ) {
        let mut cache = LruCache::new(capacity).unwrap();
        let mut model = ModelLru::new(capacity);

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    prop_assert_eq!(cache.set(key.clone(), value), model.set(key, value));
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(cache.get(&key).copied(), model.get(&key));
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(cache.delete(&key), model.delete(&key));
                }
            }
            prop_assert!(cache.len() <= capacity, "Cache exceeded its capacity");
        }

        prop_assert_eq!(cache.to_ordered_sequence(), model.entries);
    }

    // Hits and misses count exactly the reads that found or missed a key.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = ExpiringStore::new(100).unwrap();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set_item(Item::new(key, json!(value)));
                }
                CacheOp::Get { key } => match store.get_item(&key, None) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    store.remove_item(&key, None);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }

    // Rebuilding from a snapshot reproduces contents and recency order.
    #[test]
    fn prop_snapshot_roundtrip(
        items in prop::collection::vec((key_strategy(), namespace_strategy(), any::<i64>()), 0..30),
    ) {
        let mut store = ExpiringStore::new(10).unwrap();
        for (key, namespace, value) in items {
            let mut item = Item::new(key, json!(value));
            if let Some(ns) = namespace {
                item = item.namespace(ns);
            }
            store.set_item(item);
        }

        let snapshot = store.snapshot();
        let encoded = serde_json::to_vec(&snapshot).unwrap();
        let decoded: Snapshot = serde_json::from_slice(&encoded).unwrap();
        let restored = ExpiringStore::from_snapshot(10, decoded).unwrap();

        prop_assert_eq!(restored.snapshot(), snapshot);
    }

    // Clearing one namespace leaves every other namespace untouched.
    #[test]
    fn prop_clear_namespace_isolation(
        items in prop::collection::vec((key_strategy(), namespace_strategy(), any::<i64>()), 1..30),
    ) {
        let mut store = ExpiringStore::new(100).unwrap();
        for (key, namespace, value) in items {
            let mut item = Item::new(key, json!(value));
            if let Some(ns) = namespace {
                item = item.namespace(ns);
            }
            store.set_item(item);
        }

        let expected: Snapshot = store
            .snapshot()
            .into_iter()
            .filter(|(key, _)| !key.starts_with("ns1|"))
            .collect();

        store.clear_namespace("ns1");

        prop_assert_eq!(store.snapshot(), expected);
    }

    // The store never holds more entries than its capacity.
    #[test]
    fn prop_capacity_never_exceeded(
        capacity in 1usize..20,
        keys in prop::collection::vec(key_strategy(), 1..100),
    ) {
        let mut store = ExpiringStore::new(capacity).unwrap();
        for (i, key) in keys.into_iter().enumerate() {
            store.set_item(Item::new(key, json!(i)));
            prop_assert!(store.len() <= capacity);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // Entries with a TTL disappear once it has elapsed; TTL 0 never expires.
    #[test]
    fn prop_ttl_expiration(key in key_strategy(), value in any::<i64>()) {
        let mut store = ExpiringStore::new(10).unwrap();
        store.set_item(Item::new(key.clone(), json!(value)).ttl(Duration::from_millis(20)));
        store.set_item(Item::new(key.clone(), json!(value)).namespace("forever"));

        sleep(Duration::from_millis(40));

        prop_assert!(store.get_item(&key, None).is_none(), "Entry should have expired");
        prop_assert!(store.get_item(&key, Some("forever")).is_some());
        prop_assert_eq!(store.stats().expirations, 1);
    }
}
