use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::vectors_output::VectorsOptions;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
    PointStruct, RetrievedPoint, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use tracing::{debug, info, warn};

use super::VectorIndex;
use super::error::VectorDbError;
use super::model::{
    NAMESPACE_KEY, StoredRecord, VectorMatch, VectorRecord, from_payload, to_payload,
};
use crate::constants::MAX_NAMESPACE_RECORDS;
use crate::hashing::chunk_point_id;

/// Points per upsert request.
const UPSERT_BATCH_SIZE: usize = 256;

/// Points per scroll page.
const SCROLL_PAGE_SIZE: u32 = 512;

#[derive(Clone)]
/// [`VectorIndex`] over one Qdrant collection, partitioned by a namespace payload field.
///
/// Point ids are the 64-bit BLAKE3 truncation of the chunk id; the chunk id itself is
/// kept in the payload.
pub struct QdrantIndex {
    client: Qdrant,
    url: String,
    collection: String,
    dim: usize,
}

impl std::fmt::Debug for QdrantIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("url", &self.url)
            .field("collection", &self.collection)
            .field("dim", &self.dim)
            .finish()
    }
}

impl QdrantIndex {
    /// Connects to `url` and creates `collection` (cosine, `dim`) if it is missing.
    pub async fn connect(url: &str, collection: &str, dim: usize) -> Result<Self, VectorDbError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        let index = Self {
            client,
            url: url.to_string(),
            collection: collection.to_string(),
            dim,
        };
        index.ensure_collection().await?;
        Ok(index)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn collection_exists(&self) -> Result<bool, VectorDbError> {
        self.client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })
    }

    async fn ensure_collection(&self) -> Result<(), VectorDbError> {
        if self.collection_exists().await? {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(self.dim as u64, Distance::Cosine))
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| VectorDbError::CreateCollectionFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        info!(collection = %self.collection, dim = self.dim, "created vector collection");
        Ok(())
    }

    fn namespace_filter(namespace: &str) -> Filter {
        Filter::must([Condition::matches(NAMESPACE_KEY, namespace.to_string())])
    }

    #[allow(deprecated)]
    fn stored_record(point: RetrievedPoint) -> Option<StoredRecord> {
        let values = point
            .vectors
            .and_then(|v| v.vectors_options)
            .and_then(|opts| match opts {
                VectorsOptions::Vector(v) => Some(v.data),
                VectorsOptions::Vectors(_) => None,
            })
            .filter(|data| !data.is_empty());

        let (id, attributes) = from_payload(point.payload)?;
        Some(StoredRecord {
            id,
            values,
            attributes,
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<(), VectorDbError> {
        if records.is_empty() {
            return Ok(());
        }

        let total = records.len();
        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|r| {
                let point_id = chunk_point_id(&r.id);
                PointStruct::new(point_id, r.values, to_payload(namespace, &r.id, r.attributes))
            })
            .collect();

        let mut remaining = points;
        while !remaining.is_empty() {
            let rest = remaining.split_off(remaining.len().min(UPSERT_BATCH_SIZE));
            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, remaining).wait(true))
                .await
                .map_err(|e| VectorDbError::UpsertFailed {
                    namespace: namespace.to_string(),
                    message: e.to_string(),
                })?;
            remaining = rest;
        }

        debug!(namespace, total, "upserted points");
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<VectorMatch>, VectorDbError> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, top_k)
                    .filter(Self::namespace_filter(namespace))
                    .with_payload(true),
            )
            .await
            .map_err(|e| VectorDbError::SearchFailed {
                namespace: namespace.to_string(),
                message: e.to_string(),
            })?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|p| {
                let score = p.score;
                from_payload(p.payload).map(|(id, attributes)| VectorMatch {
                    id,
                    score,
                    attributes,
                })
            })
            .collect())
    }

    async fn fetch_all(&self, namespace: &str) -> Result<Vec<StoredRecord>, VectorDbError> {
        let mut records = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut request = ScrollPointsBuilder::new(&self.collection)
                .filter(Self::namespace_filter(namespace))
                .limit(SCROLL_PAGE_SIZE)
                .with_payload(true)
                .with_vectors(true);
            if let Some(next) = offset.take() {
                request = request.offset(next);
            }

            let page = self
                .client
                .scroll(request)
                .await
                .map_err(|e| VectorDbError::FetchFailed {
                    namespace: namespace.to_string(),
                    message: e.to_string(),
                })?;

            records.extend(page.result.into_iter().filter_map(Self::stored_record));

            if records.len() >= MAX_NAMESPACE_RECORDS {
                warn!(
                    namespace,
                    limit = MAX_NAMESPACE_RECORDS,
                    "namespace scan hit record limit; remaining records are not merged"
                );
                records.truncate(MAX_NAMESPACE_RECORDS);
                break;
            }

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(namespace, count = records.len(), "namespace scan complete");
        Ok(records)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<(), VectorDbError> {
        if !self.collection_exists().await? {
            return Ok(());
        }

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(Self::namespace_filter(namespace))
                    .wait(true),
            )
            .await
            .map_err(|e| VectorDbError::DeleteFailed {
                namespace: namespace.to_string(),
                message: e.to_string(),
            })?;

        info!(namespace, "deleted namespace");
        Ok(())
    }
}
