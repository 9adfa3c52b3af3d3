//! Namespaced vector index.
//!
//! One namespace per repository. [`QdrantIndex`] is the production backend;
//! [`MockVectorIndex`] is an in-memory stand-in for tests.

use async_trait::async_trait;

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;


pub use client::QdrantIndex;
pub use error::VectorDbError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockVectorIndex, cosine_similarity};
pub use model::{Attributes, StoredRecord, VectorMatch, VectorRecord};

/// Nearest-neighbour store partitioned by namespace.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces records by id.
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<(), VectorDbError>;

    /// Returns up to `top_k` records most similar to `vector`, best first.
    async fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<VectorMatch>, VectorDbError>;

    /// Reads every record in `namespace`. An unknown namespace yields an empty list.
    async fn fetch_all(&self, namespace: &str) -> Result<Vec<StoredRecord>, VectorDbError>;

    /// Removes every record in `namespace`. Succeeds if the namespace never existed.
    async fn delete_namespace(&self, namespace: &str) -> Result<(), VectorDbError>;
}
