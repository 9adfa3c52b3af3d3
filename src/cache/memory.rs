//! Bounded in-memory tier with strict least-recently-used eviction.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Fixed-capacity LRU map from content key to embedding.
///
/// A `get` counts as an access and moves the entry to the most-recent position.
/// A capacity of zero is raised to one.
pub struct MemoryTier {
    inner: Mutex<LruCache<String, Vec<f32>>>,
}

impl MemoryTier {
    /// Creates a tier holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns a copy of the stored vector and marks the entry as most recently used.
    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.inner.lock().get(key).cloned()
    }

    /// Inserts or replaces an entry, evicting the least recently used one when full.
    pub fn put(&self, key: String, value: Vec<f32>) {
        self.inner.lock().put(key, value);
    }

    /// Returns `true` if `key` is resident. Does not affect recency.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl std::fmt::Debug for MemoryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.lock();
        f.debug_struct("MemoryTier")
            .field("len", &guard.len())
            .field("capacity", &guard.cap())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let tier = MemoryTier::new(4);
        tier.put("a".into(), vec![1.0, 2.0]);

        assert_eq!(tier.get("a"), Some(vec![1.0, 2.0]));
        assert_eq!(tier.get("b"), None);
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let tier = MemoryTier::new(2);
        tier.put("a".into(), vec![1.0]);
        tier.put("b".into(), vec![2.0]);

        // Touch "a" so "b" becomes the eviction candidate.
        assert!(tier.get("a").is_some());
        tier.put("c".into(), vec![3.0]);

        assert!(tier.contains("a"));
        assert!(!tier.contains("b"));
        assert!(tier.contains("c"));
        assert_eq!(tier.len(), 2);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let tier = MemoryTier::new(0);
        assert_eq!(tier.capacity(), 1);

        tier.put("a".into(), vec![1.0]);
        tier.put("b".into(), vec![2.0]);
        assert!(!tier.contains("a"));
        assert!(tier.contains("b"));
    }

    #[test]
    fn test_clear() {
        let tier = MemoryTier::new(2);
        tier.put("a".into(), vec![1.0]);
        tier.clear();
        assert!(tier.is_empty());
    }
}
