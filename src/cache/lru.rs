//! LRU Cache Module
//!
//! Fixed-capacity map with exact recency ordering.
//!
//! Nodes live in a `Vec` arena and link to each other by slot index. Slots 0
//! and 1 are the head and tail sentinels. Walking from `HEAD.next` to
//! `TAIL.prev` yields entries from most to least recently used.

use std::collections::HashMap;

use crate::error::{CacheError, Result};

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 1000;

const HEAD: usize = 0;
const TAIL: usize = 1;

// == Node ==
#[derive(Debug)]
struct Node<V> {
    key: String,
    /// `None` for sentinels and recycled slots
    value: Option<V>,
    prev: usize,
    next: usize,
}

impl<V> Node<V> {
    fn sentinel(prev: usize, next: usize) -> Self {
        Self {
            key: String::new(),
            value: None,
            prev,
            next,
        }
    }
}

// == LRU Cache ==
/// Bounded LRU map from string keys to `V`.
///
/// `get`, `set` and `delete` are O(1). `to_ordered_sequence` is O(len).
#[derive(Debug)]
pub struct LruCache<V> {
    /// Maximum number of entries
    capacity: usize,
    /// Key to arena slot
    index: HashMap<String, usize>,
    /// Node arena, sentinels at 0 and 1
    nodes: Vec<Node<V>>,
    /// Recycled slots
    free: Vec<usize>,
}

impl<V> LruCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// Returns `CacheError::InvalidConfig` for a zero capacity.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            index: HashMap::with_capacity(capacity.min(4096)),
            nodes: vec![Node::sentinel(HEAD, TAIL), Node::sentinel(HEAD, TAIL)],
            free: Vec::new(),
        })
    }

    // == Set ==
    /// Inserts or updates `key`, making it the most recently used entry.
    ///
    /// Returns the evicted `(key, value)` when the insert pushed the cache
    /// over capacity.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Option<(String, V)> {
        let key = key.into();

        if let Some(&slot) = self.index.get(&key) {
            self.nodes[slot].value = Some(value);
            self.promote(slot);
            return None;
        }

        let slot = self.alloc(key.clone(), value);
        self.attach_front(slot);
        self.index.insert(key, slot);

        if self.index.len() > self.capacity {
            self.pop_lru()
        } else {
            None
        }
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.promote(slot);
        self.nodes[slot].value.as_ref()
    }

    // == Peek ==
    /// Returns the value for `key` without touching recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.index
            .get(key)
            .and_then(|&slot| self.nodes[slot].value.as_ref())
    }

    // == Delete ==
    /// Removes `key`, returning its value if it was present.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        let slot = self.index.remove(key)?;
        self.release(slot)
    }

    // == Pop LRU ==
    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(String, V)> {
        let slot = self.nodes[TAIL].prev;
        if slot == HEAD {
            return None;
        }

        let key = std::mem::take(&mut self.nodes[slot].key);
        self.index.remove(&key);
        let value = self.release(slot)?;
        Some((key, value))
    }

    // == Clear ==
    /// Drops every entry, keeping the capacity.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.truncate(2);
        self.nodes[HEAD].next = TAIL;
        self.nodes[TAIL].prev = HEAD;
        self.free.clear();
    }

    // == Iter ==
    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.nodes[HEAD].next,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    // == Internal list operations ==

    fn alloc(&mut self, key: String, value: V) -> usize {
        let node = Node {
            key,
            value: Some(value),
            prev: HEAD,
            next: TAIL,
        };

        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Unlinks an already unindexed slot and recycles it.
    fn release(&mut self, slot: usize) -> Option<V> {
        self.detach(slot);
        self.free.push(slot);
        self.nodes[slot].key.clear();
        self.nodes[slot].value.take()
    }

    fn promote(&mut self, slot: usize) {
        if self.nodes[HEAD].next != slot {
            self.detach(slot);
            self.attach_front(slot);
        }
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    fn attach_front(&mut self, slot: usize) {
        let first = self.nodes[HEAD].next;
        self.nodes[slot].prev = HEAD;
        self.nodes[slot].next = first;
        self.nodes[first].prev = slot;
        self.nodes[HEAD].next = slot;
    }
}

impl<V: Clone> LruCache<V> {
    // == Ordered Sequence ==
    /// Clones all entries, most recently used first.
    pub fn to_ordered_sequence(&self) -> Vec<(String, V)> {
        self.iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }
}

impl<V> Default for LruCache<V> {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            index: HashMap::new(),
            nodes: vec![Node::sentinel(HEAD, TAIL), Node::sentinel(HEAD, TAIL)],
            free: Vec::new(),
        }
    }
}

// == Iterator ==
/// Borrowing iterator over `(key, value)` pairs, MRU to LRU.
pub struct Iter<'a, V> {
    nodes: &'a [Node<V>],
    cursor: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == TAIL {
            return None;
        }
        let node = &self.nodes[self.cursor];
        self.cursor = node.next;
        node.value.as_ref().map(|value| (node.key.as_str(), value))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys<V>(cache: &LruCache<V>) -> Vec<String> {
        cache.iter().map(|(k, _)| k.to_string()).collect()
    }

    #[test]
    fn test_lru_new() {
        let cache: LruCache<i32> = LruCache::new(3).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_lru_zero_capacity_rejected() {
        let result: Result<LruCache<i32>> = LruCache::new(0);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_lru_default_capacity() {
        let cache: LruCache<i32> = LruCache::default();
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_lru_set_get_scenario() {
        let mut cache = LruCache::new(2).unwrap();
        let mut results = Vec::new();

        cache.set("1", 1);
        cache.set("2", 2);
        results.push(cache.get("1").copied());
        cache.set("3", 3); // evicts 2
        results.push(cache.get("2").copied());
        cache.set("4", 4); // evicts 1
        results.push(cache.get("1").copied());
        results.push(cache.get("3").copied());
        results.push(cache.get("4").copied());
        cache.set("3", -3);

        assert_eq!(results, vec![Some(1), None, None, Some(3), Some(4)]);
        assert_eq!(cache.get("3"), Some(&-3));
        assert_eq!(cache.get("4"), Some(&4));
    }

    #[test]
    fn test_lru_set_returns_evicted() {
        let mut cache = LruCache::new(2).unwrap();

        assert!(cache.set("a", 1).is_none());
        assert!(cache.set("b", 2).is_none());
        assert_eq!(cache.set("c", 3), Some(("a".to_string(), 1)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_update_moves_to_front_without_growth() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        assert!(cache.set("a", 10).is_none());

        assert_eq!(cache.len(), 3);
        assert_eq!(keys(&cache), vec!["a", "c", "b"]);
        assert_eq!(cache.peek("a"), Some(&10));
    }

    #[test]
    fn test_lru_get_refreshes_recency() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.get("a");

        assert_eq!(keys(&cache), vec!["a", "c", "b"]);
        assert_eq!(cache.set("d", 4).map(|(k, _)| k), Some("b".to_string()));
    }

    #[test]
    fn test_lru_get_head_is_noop() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.get("b");

        assert_eq!(keys(&cache), vec!["b", "a"]);
    }

    #[test]
    fn test_lru_peek_does_not_refresh() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.peek("a"), Some(&1));
        cache.set("c", 3);

        assert!(!cache.contains_key("a"));
    }

    #[test]
    fn test_lru_delete() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        assert_eq!(cache.delete("b"), Some(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec!["c", "a"]);
    }

    #[test]
    fn test_lru_delete_nonexistent_key() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set("a", 1);

        assert_eq!(cache.delete("missing"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(keys(&cache), vec!["a"]);
    }

    #[test]
    fn test_lru_slots_are_recycled() {
        let mut cache = LruCache::new(2).unwrap();

        for i in 0..100 {
            cache.set(format!("k{i}"), i);
        }

        // Two sentinels plus at most capacity + 1 live slots
        assert!(cache.nodes.len() <= 5);
        assert_eq!(keys(&cache), vec!["k99", "k98"]);
    }

    #[test]
    fn test_lru_pop_lru_order() {
        let mut cache = LruCache::new(4).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.get("a");

        assert_eq!(cache.pop_lru().map(|(k, _)| k), Some("b".to_string()));
        assert_eq!(cache.pop_lru().map(|(k, _)| k), Some("c".to_string()));
        assert_eq!(cache.pop_lru().map(|(k, _)| k), Some("a".to_string()));
        assert_eq!(cache.pop_lru(), None);
    }

    #[test]
    fn test_lru_ordered_sequence() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        assert_eq!(
            cache.to_ordered_sequence(),
            vec![
                ("c".to_string(), 3),
                ("b".to_string(), 2),
                ("a".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.iter().count(), 0);
        assert_eq!(cache.capacity(), 2);

        cache.set("c", 3);
        assert_eq!(keys(&cache), vec!["c"]);
    }
}
