use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::MetadataStore;
use super::error::MetadataError;
use super::model::{IndexDocument, JobDocument, QueryLogDocument};
use crate::hashing::text_cache_key;

const INDEXES_DIR: &str = "indexes";
const QUERY_LOGS_DIR: &str = "query_logs";
const JOBS_DIR: &str = "jobs";

/// [`MetadataStore`] writing JSON documents under a data directory:
///
/// ```text
/// {root}/indexes/{repo}.json       one summary per repo, replaced
/// {root}/query_logs/{repo}.jsonl   one line per query, appended
/// {root}/jobs/{job_id}.json        one document per job, replaced
/// ```
#[derive(Debug)]
pub struct FileMetadataStore {
    root: PathBuf,
    log_lock: Mutex<()>,
}

impl FileMetadataStore {
    /// Opens a store rooted at `root`, creating its directories.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, MetadataError> {
        let root = root.into();
        for dir in [INDEXES_DIR, QUERY_LOGS_DIR, JOBS_DIR] {
            fs::create_dir_all(root.join(dir)).await?;
        }
        Ok(Self {
            root,
            log_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem-safe stem for an arbitrary id: sanitized prefix plus a digest suffix,
    /// so distinct ids never share a file.
    fn file_stem(id: &str) -> String {
        let readable: String = id
            .chars()
            .take(48)
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}-{}", readable, &text_cache_key(id)[..12])
    }

    fn index_path(&self, repo_id: &str) -> PathBuf {
        self.root
            .join(INDEXES_DIR)
            .join(format!("{}.json", Self::file_stem(repo_id)))
    }

    fn query_log_path(&self, repo_id: &str) -> PathBuf {
        self.root
            .join(QUERY_LOGS_DIR)
            .join(format!("{}.jsonl", Self::file_stem(repo_id)))
    }

    fn job_path(&self, job_id: &str) -> PathBuf {
        self.root
            .join(JOBS_DIR)
            .join(format!("{}.json", Self::file_stem(job_id)))
    }

    /// Writes through a temp file unique to this call, then renames over `path`.
    async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MetadataError> {
        let temp_path = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, path).await
        }
        .await;
        if written.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }
        written?;
        Ok(())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, MetadataError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl MetadataStore for FileMetadataStore {
    async fn save_index_summary(&self, doc: &IndexDocument) -> Result<(), MetadataError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        Self::write_atomic(&self.index_path(&doc.repo_id), &bytes).await
    }

    async fn load_index_summary(&self, repo_id: &str) -> Result<Option<IndexDocument>, MetadataError> {
        Self::read_json(&self.index_path(repo_id)).await
    }

    async fn append_query_log(&self, doc: &QueryLogDocument) -> Result<(), MetadataError> {
        let mut line = serde_json::to_vec(doc)?;
        line.push(b'\n');

        let _guard = self.log_lock.lock().await;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.query_log_path(&doc.repo_id))
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn query_logs(&self, repo_id: &str) -> Result<Vec<QueryLogDocument>, MetadataError> {
        let content = match fs::read_to_string(self.query_log_path(repo_id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(MetadataError::from))
            .collect()
    }

    async fn save_job(&self, doc: &JobDocument) -> Result<(), MetadataError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        Self::write_atomic(&self.job_path(&doc.job_id), &bytes).await
    }

    async fn load_job(&self, job_id: &str) -> Result<Option<JobDocument>, MetadataError> {
        Self::read_json(&self.job_path(job_id)).await
    }
}
