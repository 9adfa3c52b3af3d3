//! Unbounded on-disk tier, one rkyv file per content key.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use super::error::{CacheError, CacheResult};

const RKYV_EXTENSION: &str = "rkyv";

const TEMP_EXTENSION: &str = "rkyv.tmp";

#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq)]
/// Serialized form of one cached embedding.
pub struct StoredEmbedding {
    /// Vector values.
    pub values: Vec<f32>,
}

#[derive(Debug, Clone)]
/// Stores embeddings under `{root}/{key[..2]}/{key}.rkyv`.
///
/// Writes go to a temporary file that is synced and then renamed into place, so a
/// reader never observes a partially written entry.
pub struct DiskTier {
    root: PathBuf,
}

impl DiskTier {
    /// Opens (and creates if needed) a tier rooted at `root`.
    pub fn open(root: PathBuf) -> CacheResult<Self> {
        fs::create_dir_all(&root)
            .map_err(|_| CacheError::DirectoryUnavailable { path: root.clone() })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn shard_dir(&self, key: &str) -> PathBuf {
        let shard = key.get(..2).unwrap_or("00");
        self.root.join(shard)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.shard_dir(key)
            .join(format!("{}.{}", key, RKYV_EXTENSION))
    }

    fn temp_entry_path(&self, key: &str) -> PathBuf {
        self.shard_dir(key)
            .join(format!("{}.{}", key, TEMP_EXTENSION))
    }

    /// Loads the entry for `key`. A missing file is `Ok(None)`.
    pub fn load(&self, key: &str) -> CacheResult<Option<Vec<f32>>> {
        let bytes = match fs::read(self.entry_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut aligned: AlignedVec = AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(&bytes);

        let stored = rkyv::from_bytes::<StoredEmbedding, RkyvError>(&aligned).map_err(|e| {
            CacheError::CorruptEntry {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Some(stored.values))
    }

    /// Writes the entry for `key`, replacing any previous value.
    pub fn store(&self, key: &str, values: &[f32]) -> CacheResult<()> {
        let shard = self.shard_dir(key);
        fs::create_dir_all(&shard)
            .map_err(|_| CacheError::DirectoryUnavailable { path: shard })?;

        let record = StoredEmbedding {
            values: values.to_vec(),
        };
        let bytes = rkyv::to_bytes::<RkyvError>(&record)
            .map_err(|e| CacheError::Serialization(format!("{:?}", e)))?;

        let temp_path = self.temp_entry_path(key);
        let final_path = self.entry_path(key);

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &final_path)?;
        Ok(())
    }

    /// Returns `true` if an entry exists for `key`.
    pub fn exists(&self, key: &str) -> bool {
        self.entry_path(key).exists()
    }
}
