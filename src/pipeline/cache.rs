//! Bounded memo of provider responses.

use std::collections::{HashMap, VecDeque};

use crate::pipeline::chunking::calculate_hash;

/// Default number of entries kept before the oldest is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// FIFO cache keyed by the SHA-256 of `provider + text`.
///
/// When full, inserting a new key evicts the oldest insertion. Reads do not
/// refresh an entry's position. A capacity of 0 disables caching.
#[derive(Debug, Clone)]
pub struct ResponseCache<V> {
    entries: HashMap<String, V>,
    order: VecDeque<String>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY)),
            order: VecDeque::new(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn key(provider: &str, text: &str) -> String {
        calculate_hash(&format!("{provider}{text}"))
    }

    pub fn get(&mut self, provider: &str, text: &str) -> Option<V> {
        let found = self.entries.get(&Self::key(provider, text)).cloned();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn insert(&mut self, provider: &str, text: &str, value: V) {
        if self.capacity == 0 {
            return;
        }
        let key = Self::key(provider, text);
        if self.entries.insert(key.clone(), value).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(hits, misses)` since creation or the last [`clear`](Self::clear).
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_after_insert() {
        let mut cache = ResponseCache::new(4);
        cache.insert("local", "texto", vec![1.0f32]);
        assert_eq!(cache.get("local", "texto"), Some(vec![1.0]));
        assert_eq!(cache.get("remote", "texto"), None);
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_fifo_eviction() {
        let mut cache = ResponseCache::new(2);
        cache.insert("p", "a", 1);
        cache.insert("p", "b", 2);
        // reading "a" does not protect it from eviction
        assert_eq!(cache.get("p", "a"), Some(1));
        cache.insert("p", "c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("p", "a"), None);
        assert_eq!(cache.get("p", "b"), Some(2));
        assert_eq!(cache.get("p", "c"), Some(3));
    }

    #[test]
    fn test_reinsert_updates_in_place() {
        let mut cache = ResponseCache::new(2);
        cache.insert("p", "a", 1);
        cache.insert("p", "a", 5);
        cache.insert("p", "b", 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("p", "a"), Some(5));
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let mut cache = ResponseCache::new(0);
        cache.insert("p", "a", 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_is_sha256_hex() {
        let key = ResponseCache::<u8>::key("p", "a");
        assert_eq!(key.len(), 64);
        assert_eq!(key, ResponseCache::<u8>::key("pa", ""));
    }
}
