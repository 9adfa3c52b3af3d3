//! Time-bounded result cache with expiry-ordered eviction.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct TtlEntry<V> {
    value: V,
    expires_at: Instant,
    seq: u64,
}

struct TtlState<K, V> {
    entries: HashMap<K, TtlEntry<V>>,
    next_seq: u64,
}

/// Key/value cache where every entry lives for a fixed `ttl`.
///
/// An entry is never returned at or after its expiry; expired entries are dropped
/// lazily on `get`. When an insert pushes the size past `capacity`, entries with the
/// soonest expiry are removed first (insertion order breaks ties).
pub struct TtlCache<K, V> {
    state: Mutex<TtlState<K, V>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            state: Mutex::new(TtlState {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            ttl,
            capacity,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the live value for `key`, removing it if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            None => return None,
            Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
            Some(_) => true,
        };

        if expired {
            state.entries.remove(key);
        }
        None
    }

    /// Inserts `value` with expiry `now + ttl`, then enforces `capacity`.
    pub fn set(&self, key: K, value: V) {
        let expires_at = Instant::now() + self.ttl;
        let mut state = self.state.lock();

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            TtlEntry {
                value,
                expires_at,
                seq,
            },
        );

        let excess = state.entries.len().saturating_sub(self.capacity);
        if excess > 0 {
            let mut order: Vec<(Instant, u64, K)> = state
                .entries
                .iter()
                .map(|(k, e)| (e.expires_at, e.seq, k.clone()))
                .collect();
            order.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

            for (_, _, k) in order.into_iter().take(excess) {
                state.entries.remove(&k);
            }
        }
    }

    /// Number of stored entries, including expired ones not yet collected.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Drops every entry whose key matches `predicate`.
    pub fn retain<F>(&self, mut predicate: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.state.lock().entries.retain(|k, _| predicate(k));
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .field("len", &self.state.lock().entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60), 4);
        cache.set("q".into(), 7);

        assert_eq!(cache.get(&"q".to_string()), Some(7));
        assert_eq!(cache.get(&"other".to_string()), None);
    }

    #[test]
    fn test_zero_ttl_is_immediately_absent() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::ZERO, 4);
        cache.set("q", 7);

        assert_eq!(cache.get(&"q"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entry_removed_on_get() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(20), 4);
        cache.set("q", 1);
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"q"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_overflow_evicts_soonest_expiry() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60), 2);
        cache.set("first", 1);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("second", 2);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("third", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"first"), None);
        assert_eq!(cache.get(&"second"), Some(2));
        assert_eq!(cache.get(&"third"), Some(3));
    }

    #[test]
    fn test_overwrite_does_not_grow() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60), 2);
        cache.set("a", 1);
        cache.set("a", 2);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a"), Some(2));
    }

    #[test]
    fn test_retain_filters_keys() {
        let cache: TtlCache<(String, u32), u32> = TtlCache::new(Duration::from_secs(60), 8);
        cache.set(("r1".into(), 1), 1);
        cache.set(("r2".into(), 1), 2);

        cache.retain(|(ns, _)| ns != "r1");

        assert_eq!(cache.get(&("r1".into(), 1)), None);
        assert_eq!(cache.get(&("r2".into(), 1)), Some(2));
    }
}
