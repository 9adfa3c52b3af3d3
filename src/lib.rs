//! PRODO RAG library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Config`], [`ConfigError`] - Server configuration
//! - [`RagPipeline`] - Indexing (chunk, embed, merge-upsert) and query answering
//! - [`IndexJobQueue`] - Background indexing workers
//! - [`LifecycleManager`] - Service construction and ordered shutdown
//!
//! ## Caches & Admission
//! - [`EmbeddingCache`] - Memory LRU over an optional content-addressed disk tier
//! - [`TtlCache`] - Time-boxed query-result cache
//! - [`ConcurrencyGate`] - Bounded admission for heavy requests
//! - [`RetryPolicy`] - Exponential backoff around embedding inference
//!
//! ## Collaborators
//! - [`Embedder`] ([`BertEmbedder`], [`StubEmbedder`]) - Text embedding
//! - [`VectorIndex`] ([`QdrantIndex`]) - Namespaced vector storage
//! - [`Generator`] ([`GenaiGenerator`]) - Answer generation
//! - [`MetadataStore`] ([`FileMetadataStore`]) - Summaries, query logs, job documents
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod gate;
pub mod gateway;
pub mod generation;
pub mod hashing;
pub mod jobs;
pub mod lifecycle;
pub mod metadata;
pub mod pipeline;
pub mod retry;
pub mod vectordb;

pub use cache::{CacheError, EmbeddingCache, TtlCache};
pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use embedding::{BertEmbedder, CachedEmbedder, Embedder, EmbeddingError, StubEmbedder};
pub use gate::{ConcurrencyGate, GateError, GatePermit};
pub use generation::{Advice, GenaiGenerator, GenerationError, Generator, parse_advice};
pub use hashing::{chunk_point_id, hash_to_u64, query_cache_key, text_cache_key};
pub use jobs::{IndexJobQueue, JobError, JobRecord, JobStatus};
pub use lifecycle::{LifecycleError, LifecycleManager, LifecycleResult};
pub use metadata::{BestEffort, FileMetadataStore, MetadataError, MetadataStore};
pub use pipeline::{
    IndexRequest, IndexResult, PipelineError, PipelineSettings, QueryRequest, QueryResponse,
    RagPipeline, SourceFile,
};
pub use retry::RetryPolicy;
pub use vectordb::{QdrantIndex, VectorDbError, VectorIndex, VectorMatch, VectorRecord};

#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use generation::MockGenerator;
#[cfg(any(test, feature = "mock"))]
pub use metadata::MockMetadataStore;
#[cfg(any(test, feature = "mock"))]
pub use pipeline::MockServices;
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockVectorIndex;
