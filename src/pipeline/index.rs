//! Chunk, embed and merge-upsert one repository.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use super::chunk::{Chunk, chunk_text};
use super::error::PipelineError;
use super::types::{IndexRequest, IndexResult, value_to_attribute};
use super::RagPipeline;
use crate::constants::validate_embedding_dim;
use crate::metadata::{IndexDocument, IndexSummary};
use crate::vectordb::{Attributes, StoredRecord, VectorRecord};

/// Result of reconciling fresh records with a namespace's current contents.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Full namespace state to write back, ordered by id.
    pub records: Vec<VectorRecord>,
    /// Distinct ids present before the merge.
    pub existing_before: usize,
    /// Fresh records that replaced an id already in the working set.
    pub upserts: usize,
}

/// Builds the post-merge namespace state.
///
/// Existing records are keyed by id; each fresh record then replaces or inserts its id.
/// A fresh record counts as an upsert when its id is already present in the working set
/// at that point. Existing records without a vector are padded with zeros. Any record
/// whose vector length is not `dim` aborts the merge.
pub fn merge_records(
    existing: Vec<StoredRecord>,
    fresh: Vec<VectorRecord>,
    dim: usize,
) -> Result<MergeOutcome, PipelineError> {
    let mut working: BTreeMap<String, VectorRecord> = BTreeMap::new();

    for record in existing {
        let values = record.values.unwrap_or_else(|| vec![0.0; dim]);
        working.insert(
            record.id.clone(),
            VectorRecord::new(record.id, values, record.attributes),
        );
    }
    let existing_before = working.len();

    let mut upserts = 0;
    for record in fresh {
        if working.contains_key(&record.id) {
            upserts += 1;
        }
        working.insert(record.id.clone(), record);
    }

    for record in working.values() {
        validate_embedding_dim(record.values.len(), dim).map_err(|_| {
            PipelineError::DimensionMismatch {
                id: record.id.clone(),
                expected: dim,
                actual: record.values.len(),
            }
        })?;
    }

    Ok(MergeOutcome {
        records: working.into_values().collect(),
        existing_before,
        upserts,
    })
}

/// Request metadata as string attributes.
pub fn flatten_metadata(metadata: &Map<String, Value>) -> Attributes {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), value_to_attribute(v)))
        .collect()
}

impl RagPipeline {
    /// Indexes `request.files` into the `request.repo_id` namespace.
    ///
    /// The namespace is read in full, merged by chunk id and written back in one upsert.
    /// This read-modify-write is not atomic: concurrent calls for the same namespace are
    /// last-writer-wins. The summary document is written best-effort afterwards.
    #[instrument(
        skip(self, request),
        fields(repo_id = %request.repo_id, files = request.files.len())
    )]
    pub async fn index_repo(&self, request: &IndexRequest) -> Result<IndexResult, PipelineError> {
        let repo_id = request.repo_id.as_str();
        if repo_id.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("repoId is required".to_string()));
        }

        let chunks: Vec<Chunk> = request
            .files
            .iter()
            .flat_map(|file| {
                let text = file.content_text();
                debug!(path = %file.filename, content_len = text.len(), "chunking file");
                chunk_text(
                    repo_id,
                    &file.filename,
                    &text,
                    self.settings.chunk_size,
                    self.settings.chunk_overlap,
                )
            })
            .collect();

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts).await?;

        let request_attrs = flatten_metadata(&request.metadata);
        let fresh: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, values)| {
                let mut attributes = chunk.attributes();
                attributes.extend(request_attrs.clone());
                VectorRecord::new(chunk.id.clone(), values, attributes)
            })
            .collect();

        let existing = self.index.fetch_all(repo_id).await?;
        let outcome = merge_records(existing, fresh, self.settings.embedding_dim)?;
        let merged_total = outcome.records.len();

        if merged_total > 0 {
            self.index.upsert(repo_id, outcome.records).await?;
        }
        self.invalidate_queries(repo_id);

        let result = IndexResult {
            repo_id: repo_id.to_string(),
            file_count: request.files.len(),
            chunk_count: chunks.len(),
            upserts: outcome.upserts,
            merged_total,
            existing_before: outcome.existing_before,
        };

        self.metadata
            .record_index_summary(&IndexDocument {
                repo_id: repo_id.to_string(),
                data: IndexSummary {
                    file_count: result.file_count,
                    chunk_count: result.chunk_count,
                    metadata: Value::Object(request.metadata.clone()),
                },
            })
            .await;

        info!(
            chunks = result.chunk_count,
            upserts = result.upserts,
            merged_total = result.merged_total,
            existing_before = result.existing_before,
            "indexing complete"
        );
        Ok(result)
    }
}
