//! Cache Module
//!
//! Provides the in-memory LRU cache and the namespaced, TTL-aware store
//! built on it.

mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, Data};
pub use lru::{Iter, LruCache, DEFAULT_CAPACITY};
pub use stats::CacheStats;
pub use store::{composite_key, ExpiringStore, Item, DEFAULT_NAMESPACE, NAMESPACE_SEPARATOR};

/// Persisted form of the cache: `(composite key, entry)` pairs, most
/// recently used first.
pub type Snapshot = Vec<(String, CacheEntry)>;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
