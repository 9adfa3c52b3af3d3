//! BLAKE3 content keys.
//!
//! Every cache in the crate is keyed by content, never by caller identity:
//! - embedding cache: digest of the exact text bytes ([`hash_text`], [`text_cache_key`])
//! - query cache: digest of `(repo namespace, prompt, top_k)` ([`query_cache_key`])
//! - vector point ids: 64-bit truncation of the chunk id ([`chunk_point_id`])

use blake3::Hasher;

/// Full 32-byte digest of `text`.
#[inline]
pub fn hash_text(text: &str) -> [u8; 32] {
    *blake3::hash(text.as_bytes()).as_bytes()
}

/// Hex digest of `text`, used as the embedding-cache key and disk-tier file stem.
///
/// Identical text maps to the same key regardless of which repository produced it.
#[inline]
pub fn text_cache_key(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Used for vector point ids, where the backend requires an integer id. With 64 bits the
/// birthday bound sits near 4 billion records, far beyond a single namespace's size.
/// The full chunk id is stored alongside each point, so ids stay recoverable.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Point id for a chunk id (`"{repo}:{path}:{offset}"`).
#[inline]
pub fn chunk_point_id(chunk_id: &str) -> u64 {
    hash_to_u64(chunk_id.as_bytes())
}

/// Digest of `(namespace, prompt, top_k)` for the query-result cache.
///
/// Fields are length-prefixed so that `("ab", "c")` and `("a", "bc")` never collide.
#[inline]
pub fn query_cache_key(namespace: &str, prompt: &str, top_k: u64) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(&(namespace.len() as u64).to_le_bytes());
    hasher.update(namespace.as_bytes());
    hasher.update(&(prompt.len() as u64).to_le_bytes());
    hasher.update(prompt.as_bytes());
    hasher.update(&top_k.to_le_bytes());
    *hasher.finalize().as_bytes()
}
