//! Two-tier content-addressed embedding cache.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::disk::DiskTier;
use super::error::CacheResult;
use super::memory::MemoryTier;
use crate::hashing::text_cache_key;

/// Hit/miss counters for an [`EmbeddingCache`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
}

/// Maps exact text to its embedding through a bounded memory tier and an optional
/// unbounded disk tier.
///
/// - `get` checks memory first, then disk; a disk hit is promoted into memory.
/// - `set` writes through to both tiers.
/// - Disk failures are logged and never returned; the cache degrades to memory-only.
#[derive(Debug)]
pub struct EmbeddingCache {
    memory: MemoryTier,
    disk: Option<DiskTier>,
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    /// Memory-only cache.
    pub fn in_memory(capacity: usize) -> Self {
        Self::with_tiers(MemoryTier::new(capacity), None)
    }

    /// Cache with a disk tier rooted at `disk_path`.
    pub fn with_disk(capacity: usize, disk_path: PathBuf) -> CacheResult<Self> {
        let disk = DiskTier::open(disk_path)?;
        Ok(Self::with_tiers(MemoryTier::new(capacity), Some(disk)))
    }

    fn with_tiers(memory: MemoryTier, disk: Option<DiskTier>) -> Self {
        Self {
            memory,
            disk,
            memory_hits: AtomicU64::new(0),
            disk_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached embedding for `text`, or `None`.
    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        let key = text_cache_key(text);

        if let Some(values) = self.memory.get(&key) {
            self.memory_hits.fetch_add(1, Ordering::Relaxed);
            return Some(values);
        }

        if let Some(disk) = &self.disk {
            match disk.load(&key) {
                Ok(Some(values)) => {
                    self.disk_hits.fetch_add(1, Ordering::Relaxed);
                    self.memory.put(key, values.clone());
                    return Some(values);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "disk cache read failed; treating as miss");
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Stores `embedding` for `text` in every tier.
    pub fn set(&self, text: &str, embedding: &[f32]) {
        let key = text_cache_key(text);

        if let Some(disk) = &self.disk
            && let Err(e) = disk.store(&key, embedding)
        {
            warn!(key = %key, error = %e, "disk cache write failed; entry kept in memory only");
        }

        self.memory.put(key, embedding.to_vec());
    }

    /// Returns `true` if `text` is resident in the memory tier.
    pub fn contains_in_memory(&self, text: &str) -> bool {
        self.memory.contains(&text_cache_key(text))
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    pub fn has_disk_tier(&self) -> bool {
        self.disk.is_some()
    }

    /// Drops every memory-tier entry. The disk tier is left intact.
    pub fn clear_memory(&self) {
        let dropped = self.memory.len();
        self.memory.clear();
        debug!(dropped, "embedding memory tier cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_unset_is_none() {
        let cache = EmbeddingCache::in_memory(8);
        assert_eq!(cache.get("never stored"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_set_then_get_returns_equal_vector() {
        let cache = EmbeddingCache::in_memory(8);
        cache.set("def f(): pass", &[0.1, 0.2, 0.3]);

        assert_eq!(cache.get("def f(): pass"), Some(vec![0.1, 0.2, 0.3]));
        assert_eq!(cache.stats().memory_hits, 1);
    }

    #[test]
    fn test_key_is_exact_text() {
        let cache = EmbeddingCache::in_memory(8);
        cache.set("abc", &[1.0]);

        assert_eq!(cache.get("abc "), None);
        assert_eq!(cache.get("ABC"), None);
    }

    #[test]
    fn test_evicted_entry_served_from_disk_and_promoted() {
        let dir = TempDir::new().expect("tempdir");
        let capacity = 3;
        let cache = EmbeddingCache::with_disk(capacity, dir.path().to_path_buf()).expect("open");

        for i in 0..=capacity {
            cache.set(&format!("text-{i}"), &[i as f32]);
        }

        assert!(!cache.contains_in_memory("text-0"));
        assert_eq!(cache.memory_len(), capacity);

        assert_eq!(cache.get("text-0"), Some(vec![0.0]));
        assert_eq!(cache.stats().disk_hits, 1);
        assert!(cache.contains_in_memory("text-0"));
    }

    #[test]
    fn test_memory_only_eviction_loses_entry() {
        let cache = EmbeddingCache::in_memory(1);
        cache.set("a", &[1.0]);
        cache.set("b", &[2.0]);

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(vec![2.0]));
    }

    #[test]
    fn test_clear_memory_keeps_disk() {
        let dir = TempDir::new().expect("tempdir");
        let cache = EmbeddingCache::with_disk(4, dir.path().to_path_buf()).expect("open");
        cache.set("kept", &[9.0]);

        cache.clear_memory();

        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.get("kept"), Some(vec![9.0]));
    }

    #[test]
    fn test_disk_write_failure_falls_back_to_memory() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path().join("cache");
        let cache = EmbeddingCache::with_disk(4, root.clone()).expect("open");

        // Replace the cache root with a plain file so shard creation fails.
        std::fs::remove_dir_all(&root).expect("remove");
        std::fs::write(&root, b"not a dir").expect("write");

        cache.set("t", &[1.5]);
        assert_eq!(cache.get("t"), Some(vec![1.5]));
    }
}
