use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::generation::Advice;
use crate::jobs::JobStatus;

fn summary(repo_id: &str, chunks: usize) -> IndexDocument {
    IndexDocument {
        repo_id: repo_id.to_string(),
        data: IndexSummary {
            file_count: 1,
            chunk_count: chunks,
            metadata: json!({"branch": "main"}),
        },
    }
}

fn job(job_id: &str, status: JobStatus) -> JobDocument {
    JobDocument {
        job_id: job_id.to_string(),
        repo_id: "r1".to_string(),
        meta: json!({}),
        status,
        result: None,
        error: None,
    }
}

#[tokio::test]
async fn test_file_store_index_summary_replaced() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileMetadataStore::open(dir.path()).await.expect("open");

    store.save_index_summary(&summary("r1", 1)).await.expect("save");
    store.save_index_summary(&summary("r1", 5)).await.expect("save");

    let loaded = store.load_index_summary("r1").await.expect("load");
    assert_eq!(loaded.map(|d| d.data.chunk_count), Some(5));
    assert!(store.load_index_summary("r2").await.expect("load").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_store_concurrent_summary_writes_same_repo() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(FileMetadataStore::open(dir.path()).await.expect("open"));

    let writers: Vec<_> = (1..=16)
        .map(|chunks| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.save_index_summary(&summary("r1", chunks)).await })
        })
        .collect();
    for writer in writers {
        writer.await.expect("join").expect("concurrent save");
    }

    let loaded = store.load_index_summary("r1").await.expect("load").expect("summary");
    assert!((1..=16).contains(&loaded.data.chunk_count));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("indexes"))
        .expect("read dir")
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_file_store_query_logs_appended_per_repo() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileMetadataStore::open(dir.path()).await.expect("open");

    for (repo, prompt) in [("r1", "first"), ("r2", "other"), ("r1", "second")] {
        store
            .append_query_log(&QueryLogDocument {
                repo_id: repo.to_string(),
                log: QueryLog {
                    prompt: prompt.to_string(),
                    result: Advice::default(),
                },
            })
            .await
            .expect("append");
    }

    let logs = store.query_logs("r1").await.expect("read");
    let prompts: Vec<_> = logs.iter().map(|d| d.log.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["first", "second"]);
}

#[tokio::test]
async fn test_file_store_job_documents() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileMetadataStore::open(dir.path()).await.expect("open");

    store.save_job(&job("j-1", JobStatus::Queued)).await.expect("save");
    let mut done = job("j-1", JobStatus::Completed);
    done.result = Some(json!({"chunkCount": 1}));
    store.save_job(&done).await.expect("save");

    let loaded = store.load_job("j-1").await.expect("load").expect("present");
    assert_eq!(loaded.status, JobStatus::Completed);
    assert_eq!(loaded.result, Some(json!({"chunkCount": 1})));
}

#[tokio::test]
async fn test_file_store_ids_with_path_separators() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileMetadataStore::open(dir.path()).await.expect("open");

    store.save_index_summary(&summary("org/repo", 2)).await.expect("save");
    store.save_index_summary(&summary("org_repo", 3)).await.expect("save");

    let a = store.load_index_summary("org/repo").await.expect("load");
    let b = store.load_index_summary("org_repo").await.expect("load");
    assert_eq!(a.map(|d| d.data.chunk_count), Some(2));
    assert_eq!(b.map(|d| d.data.chunk_count), Some(3));
}

#[test]
fn test_document_field_names() {
    let value = serde_json::to_value(summary("r1", 1)).expect("serialize");
    assert_eq!(value["repoId"], "r1");
    assert_eq!(value["data"]["file_count"], 1);
    assert_eq!(value["data"]["chunk_count"], 1);

    let value = serde_json::to_value(job("j", JobStatus::Queued)).expect("serialize");
    assert_eq!(value["job_id"], "j");
    assert_eq!(value["status"], "queued");
    assert!(value.get("result").is_none());
}

#[tokio::test]
async fn test_best_effort_swallows_failures() {
    let store = Arc::new(MockMetadataStore::failing());
    let best_effort = BestEffort::new(store.clone());

    best_effort.record_index_summary(&summary("r1", 1)).await;
    best_effort.record_job(&job("j", JobStatus::Queued)).await;
    assert!(best_effort.load_job("j").await.is_none());

    store.set_fail(false);
    best_effort.record_job(&job("j", JobStatus::Queued)).await;
    assert_eq!(store.job_writes(), 1);
    assert!(best_effort.load_job("j").await.is_some());
}
