//! Fixed-size character windows with overlap.

use crate::vectordb::Attributes;

/// A window of one file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// `"{repo_id}:{path}:{start}"`, stable across re-indexing of the same region.
    pub id: String,
    pub repo_id: String,
    pub path: String,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
    pub text: String,
}

impl Chunk {
    /// Chunk fields as string attributes (`id`, `repoId`, `path`, `start_char`,
    /// `end_char`, `text`).
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("id".to_string(), self.id.clone());
        attrs.insert("repoId".to_string(), self.repo_id.clone());
        attrs.insert("path".to_string(), self.path.clone());
        attrs.insert("start_char".to_string(), self.start.to_string());
        attrs.insert("end_char".to_string(), self.end.to_string());
        attrs.insert("text".to_string(), self.text.clone());
        attrs
    }
}

/// Splits `content` into windows of `size` characters, each starting `size - overlap`
/// characters after the previous one.
///
/// Offsets count Unicode scalar values, not bytes. Empty content yields no chunks; any
/// non-empty content shorter than `size` yields exactly one. Callers must ensure
/// `overlap < size`; otherwise a stride of one is used.
pub fn chunk_text(repo_id: &str, path: &str, content: &str, size: usize, overlap: usize) -> Vec<Chunk> {
    let size = size.max(1);
    let stride = size.saturating_sub(overlap).max(1);

    // Byte offset of every character boundary, including the end.
    let boundaries: Vec<usize> = content
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(content.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut chunks = Vec::with_capacity(char_len.div_ceil(stride));
    let mut start = 0;
    while start < char_len {
        let end = (start + size).min(char_len);
        chunks.push(Chunk {
            id: format!("{}:{}:{}", repo_id, path, start),
            repo_id: repo_id.to_string(),
            path: path.to_string(),
            start,
            end,
            text: content[boundaries[start]..boundaries[end]].to_string(),
        });
        start += stride;
    }
    chunks
}
