//! Expiring Store Module
//!
//! Namespaced key/value store on top of the LRU cache, with lazy TTL
//! expiration and sync requests after every mutation.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, Data, LruCache, Snapshot};
use crate::error::Result;
use crate::sync::SyncTrigger;

// == Public Constants ==
/// Namespace used when the caller does not name one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Joins namespace and key into the cache key
pub const NAMESPACE_SEPARATOR: char = '|';

/// Builds the `namespace|key` string the LRU cache is keyed by.
pub fn composite_key(namespace: Option<&str>, key: &str) -> String {
    format!(
        "{}{}{}",
        namespace.unwrap_or(DEFAULT_NAMESPACE),
        NAMESPACE_SEPARATOR,
        key
    )
}

// == Item ==
/// A value to store, with optional TTL and namespace.
///
/// ```
/// use lru_store::cache::Item;
/// use serde_json::json;
/// use std::time::Duration;
///
/// let item = Item::new("token", json!("abc"))
///     .ttl(Duration::from_secs(60))
///     .namespace("session");
/// assert_eq!(item.namespace.as_deref(), Some("session"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub key: String,
    pub data: Data,
    /// `Duration::ZERO` never expires
    pub ttl: Duration,
    /// `None` selects `DEFAULT_NAMESPACE`
    pub namespace: Option<String>,
}

impl Item {
    pub fn new(key: impl Into<String>, data: impl Into<Data>) -> Self {
        Self {
            key: key.into(),
            data: data.into(),
            ttl: Duration::ZERO,
            namespace: None,
        }
    }

    /// Sets the lifetime. A read exactly `ttl` after the write already
    /// misses; `Duration::ZERO` never expires.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Outcome of a single-key read.
enum Lookup {
    Hit(Data),
    Miss,
    Expired,
}

// == Expiring Store ==
/// LRU-bounded store with TTL and namespaces.
///
/// All operations take `&mut self`: the expiry check and the delete of a
/// stale entry happen in one call, so no reader sees a half-expired entry.
/// Mutations notify the optional [`SyncTrigger`]; persistence itself
/// happens elsewhere.
#[derive(Debug)]
pub struct ExpiringStore {
    /// Composite key to entry
    cache: LruCache<CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Where sync requests go, if persistence is wired up
    sync: Option<SyncTrigger>,
}

impl ExpiringStore {
    // == Constructor ==
    /// Creates an empty store holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            cache: LruCache::new(capacity)?,
            stats: CacheStats::new(),
            sync: None,
        })
    }

    /// Rebuilds a store from a most-recent-first snapshot.
    ///
    /// Entries are inserted oldest first, so the recency order of the
    /// snapshot is reproduced. If the snapshot is larger than `capacity`,
    /// its oldest entries are dropped.
    pub fn from_snapshot(capacity: usize, snapshot: Snapshot) -> Result<Self> {
        let mut store = Self::new(capacity)?;
        store.rebuild(snapshot);
        Ok(store)
    }

    /// Attaches the channel used to ask for persistence.
    pub fn with_sync_trigger(mut self, trigger: SyncTrigger) -> Self {
        self.sync = Some(trigger);
        self
    }

    // == Set ==
    /// Stores an item, replacing any entry under the same namespace and key.
    pub fn set_item(&mut self, item: Item) -> &mut Self {
        self.insert(item);
        self.request_sync();
        self
    }

    /// Stores several items with a single sync request.
    pub fn set_many<I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = Item>,
    {
        for item in items {
            self.insert(item);
        }
        self.request_sync();
        self
    }

    // == Get ==
    /// Returns the live value for `key`, refreshing its recency.
    ///
    /// An expired entry is deleted on the spot and reported as absent.
    pub fn get_item(&mut self, key: &str, namespace: Option<&str>) -> Option<Data> {
        match self.lookup(&composite_key(namespace, key)) {
            Lookup::Hit(data) => Some(data),
            Lookup::Miss => None,
            Lookup::Expired => {
                self.request_sync();
                None
            }
        }
    }

    /// Reads several keys of one namespace. At most one sync request is
    /// raised for the whole batch.
    pub fn get_many<K: AsRef<str>>(
        &mut self,
        keys: &[K],
        namespace: Option<&str>,
    ) -> HashMap<String, Option<Data>> {
        let mut results = HashMap::with_capacity(keys.len());
        let mut needs_sync = false;

        for key in keys {
            let key = key.as_ref();
            let value = match self.lookup(&composite_key(namespace, key)) {
                Lookup::Hit(data) => Some(data),
                Lookup::Miss => None,
                Lookup::Expired => {
                    needs_sync = true;
                    None
                }
            };
            results.insert(key.to_string(), value);
        }

        if needs_sync {
            self.request_sync();
        }
        results
    }

    // == Remove ==
    /// Deletes `key` and returns the value it held. Absent keys yield `None`.
    pub fn remove_item(&mut self, key: &str, namespace: Option<&str>) -> Option<Data> {
        let removed = self.delete(&composite_key(namespace, key));
        if removed.is_some() {
            self.request_sync();
        }
        removed
    }

    /// Deletes several keys of one namespace with at most one sync request.
    pub fn remove_many<K: AsRef<str>>(
        &mut self,
        keys: &[K],
        namespace: Option<&str>,
    ) -> HashMap<String, Option<Data>> {
        let mut results = HashMap::with_capacity(keys.len());
        let mut needs_sync = false;

        for key in keys {
            let key = key.as_ref();
            let removed = self.delete(&composite_key(namespace, key));
            needs_sync |= removed.is_some();
            results.insert(key.to_string(), removed);
        }

        if needs_sync {
            self.request_sync();
        }
        results
    }

    // == Clear ==
    /// Drops every entry of `namespace`.
    ///
    /// The remaining entries are reinserted in snapshot order, which resets
    /// their recency to that order.
    pub fn clear_namespace(&mut self, namespace: &str) -> &mut Self {
        let prefix = format!("{}{}", namespace, NAMESPACE_SEPARATOR);
        let before = self.cache.len();
        let retained: Snapshot = self
            .cache
            .to_ordered_sequence()
            .into_iter()
            .filter(|(key, _)| !key.starts_with(&prefix))
            .collect();

        self.rebuild(retained);
        debug!(
            "Cleared namespace '{}': {} entries removed",
            namespace,
            before - self.cache.len()
        );

        self.request_sync();
        self
    }

    /// Drops every entry and asks for an immediate save.
    pub fn clear_all(&mut self) -> &mut Self {
        self.cache.clear();
        if let Some(sync) = &self.sync {
            sync.request_now();
        }
        self
    }

    // == Snapshot ==
    /// Exports all entries, most recently used first.
    pub fn snapshot(&self) -> Snapshot {
        self.cache.to_ordered_sequence()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.cache.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }

    // == Internal helpers ==

    fn insert(&mut self, item: Item) {
        let key = composite_key(item.namespace.as_deref(), &item.key);
        let ttl_ms = u64::try_from(item.ttl.as_millis()).unwrap_or(u64::MAX);
        let entry = CacheEntry::new(item.data, ttl_ms);

        if let Some((evicted, _)) = self.cache.set(key, entry) {
            debug!("Evicted least recently used key '{}'", evicted);
            self.stats.record_eviction();
        }
    }

    fn lookup(&mut self, key: &str) -> Lookup {
        let now = current_timestamp_ms();

        match self.cache.get(key) {
            None => {
                self.stats.record_miss();
                return Lookup::Miss;
            }
            Some(entry) if !entry.is_expired_at(now) => {
                let data = entry.data.clone();
                self.stats.record_hit();
                return Lookup::Hit(data);
            }
            Some(_) => {}
        }

        self.cache.delete(key);
        self.stats.record_expiration();
        debug!("Key '{}' expired on read", key);
        Lookup::Expired
    }

    fn delete(&mut self, key: &str) -> Option<Data> {
        self.cache.delete(key).map(|entry| entry.data)
    }

    /// Replaces the cache contents with `snapshot` (most recent first).
    fn rebuild(&mut self, snapshot: Snapshot) {
        self.cache.clear();
        let mut dropped = 0usize;
        for (key, entry) in snapshot.into_iter().rev() {
            if self.cache.set(key, entry).is_some() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!("Rebuild exceeded capacity, dropped {} oldest entries", dropped);
        }
    }

    fn request_sync(&self) {
        if let Some(sync) = &self.sync {
            sync.request();
        }
    }
}
