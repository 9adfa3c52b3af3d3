//! End-to-end indexing and query scenarios against mock collaborators.

mod common;

use common::fixtures::{DiskBackedServices, IndexRequestBuilder, TEST_REPO, query};
use prodo::metadata::{FileMetadataStore, MetadataStore};
use prodo::pipeline::PipelineError;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_single_file_index_and_reindex() {
    let dir = TempDir::new().expect("tempdir");
    let services = DiskBackedServices::new();
    let pipeline = services.pipeline(dir.path(), 64).await;

    let request = IndexRequestBuilder::new()
        .repo_id("r1")
        .file("a.py", "x".repeat(50))
        .build();

    let first = pipeline.index_repo(&request).await.expect("index");
    assert_eq!(first.chunk_count, 1);
    assert_eq!(first.existing_before, 0);
    assert_eq!(first.upserts, 0);
    assert_eq!(first.merged_total, 1);

    let second = pipeline.index_repo(&request).await.expect("reindex");
    assert_eq!(second.chunk_count, 1);
    assert_eq!(second.upserts, 1);
    assert_eq!(second.merged_total, 1);
}

#[tokio::test]
async fn test_disjoint_file_extends_namespace() {
    let dir = TempDir::new().expect("tempdir");
    let services = DiskBackedServices::new();
    let pipeline = services.pipeline(dir.path(), 64).await;

    pipeline
        .index_repo(&IndexRequestBuilder::new().file("a.py", "a".repeat(2500)).build())
        .await
        .expect("index a");

    let result = pipeline
        .index_repo(&IndexRequestBuilder::new().file("b.py", "b".repeat(100)).build())
        .await
        .expect("index b");

    assert_eq!(result.existing_before, 2);
    assert_eq!(result.upserts, 0);
    assert_eq!(result.merged_total, result.existing_before + result.chunk_count);
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let dir = TempDir::new().expect("tempdir");
    let services = DiskBackedServices::new();
    let pipeline = services.pipeline(dir.path(), 64).await;

    let same_file = |repo: &str| IndexRequestBuilder::new().repo_id(repo).file("a.py", "shared").build();
    pipeline.index_repo(&same_file("r1")).await.expect("index r1");
    let r2 = pipeline.index_repo(&same_file("r2")).await.expect("index r2");

    assert_eq!(r2.existing_before, 0);
    assert_eq!(r2.upserts, 0);

    pipeline.reset_repo("r1").await.expect("reset");
    assert_eq!(services.index.record_count("r1"), 0);
    assert_eq!(services.index.record_count("r2"), 1);
}

#[tokio::test]
async fn test_identical_chunks_embedded_once_across_repos() {
    let dir = TempDir::new().expect("tempdir");
    let services = DiskBackedServices::new();
    let pipeline = services.pipeline(dir.path(), 64).await;

    for repo in ["r1", "r2", "r3"] {
        pipeline
            .index_repo(&IndexRequestBuilder::new().repo_id(repo).file("lib.rs", "fn main() {}").build())
            .await
            .expect("index");
    }

    assert_eq!(services.embedder.embedded_count(), 1);
}

#[tokio::test]
async fn test_embeddings_survive_restart_via_disk_tier() {
    let dir = TempDir::new().expect("tempdir");
    let services = DiskBackedServices::new();
    let request = IndexRequestBuilder::new()
        .file("a.py", "a".repeat(3000))
        .file("b.py", "print('b')")
        .build();

    {
        let pipeline = services.pipeline(dir.path(), 1).await;
        pipeline.index_repo(&request).await.expect("index");
    }
    let embedded_before_restart = services.embedder.embedded_count();

    let restarted = services.pipeline(dir.path(), 1).await;
    let result = restarted.index_repo(&request).await.expect("reindex");

    assert_eq!(result.upserts, result.chunk_count);
    assert_eq!(services.embedder.embedded_count(), embedded_before_restart);
}

#[tokio::test]
async fn test_summary_and_query_log_persisted() {
    let dir = TempDir::new().expect("tempdir");
    let services = DiskBackedServices::new();
    let pipeline = services.pipeline(dir.path(), 64).await;

    pipeline
        .index_repo(
            &IndexRequestBuilder::new()
                .file("a.py", "def a(): return 1")
                .meta("branch", json!("main"))
                .build(),
        )
        .await
        .expect("index");
    let answer = pipeline
        .query(&query(TEST_REPO, "What does a return?", 3))
        .await
        .expect("query");

    let store = FileMetadataStore::open(dir.path().join("metadata"))
        .await
        .expect("reopen store");

    let summary = store
        .load_index_summary(TEST_REPO)
        .await
        .expect("load")
        .expect("summary present");
    assert_eq!(summary.data.file_count, 1);
    assert_eq!(summary.data.chunk_count, 1);
    assert_eq!(summary.data.metadata["branch"], "main");

    let logs = store.query_logs(TEST_REPO).await.expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].log.prompt, "What does a return?");
    assert_eq!(logs[0].log.result.guidance, answer.guidance);
}

#[tokio::test]
async fn test_reindex_invalidates_cached_answers() {
    let dir = TempDir::new().expect("tempdir");
    let services = DiskBackedServices::new();
    let pipeline = services.pipeline(dir.path(), 64).await;
    let request = query(TEST_REPO, "Summarize", 6);

    pipeline.query(&request).await.expect("query");
    pipeline.query(&request).await.expect("cached query");
    assert_eq!(services.generator.call_count(), 1);

    pipeline
        .index_repo(&IndexRequestBuilder::new().file("new.py", "x = 1").build())
        .await
        .expect("index");
    pipeline.query(&request).await.expect("fresh query");
    assert_eq!(services.generator.call_count(), 2);
}

#[tokio::test]
async fn test_embedder_failure_surfaces_and_writes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let services = DiskBackedServices::new();
    let pipeline = services.pipeline(dir.path(), 64).await;
    services.embedder.fail_next(1);

    let err = pipeline
        .index_repo(&IndexRequestBuilder::new().file("a.py", "content").build())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Embedding(_)));
    assert_eq!(services.index.upsert_calls(), 0);
}
