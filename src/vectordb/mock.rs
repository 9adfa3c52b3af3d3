use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;

use super::{StoredRecord, VectorDbError, VectorIndex, VectorMatch, VectorRecord};
use super::model::Attributes;

#[derive(Clone)]
struct MockStoredPoint {
    values: Option<Vec<f32>>,
    attributes: Attributes,
}

/// In-memory [`VectorIndex`] with cosine scoring and failure injection.
pub struct MockVectorIndex {
    dim: usize,
    namespaces: RwLock<HashMap<String, BTreeMap<String, MockStoredPoint>>>,
    upsert_calls: AtomicUsize,
    fail_upserts: AtomicBool,
    fail_deletes: AtomicBool,
    upsert_hold: Mutex<Option<Arc<Notify>>>,
}

impl MockVectorIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            namespaces: RwLock::new(HashMap::new()),
            upsert_calls: AtomicUsize::new(0),
            fail_upserts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            upsert_hold: Mutex::new(None),
        }
    }

    /// Number of records in `namespace` (0 if it does not exist).
    pub fn record_count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .get(namespace)
            .map_or(0, |ns| ns.len())
    }

    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.namespaces.read().contains_key(namespace)
    }

    /// Returns a stored record, if present.
    pub fn get(&self, namespace: &str, id: &str) -> Option<StoredRecord> {
        self.namespaces.read().get(namespace)?.get(id).map(|p| StoredRecord {
            id: id.to_string(),
            values: p.values.clone(),
            attributes: p.attributes.clone(),
        })
    }

    /// Inserts a record directly, bypassing dimension checks. `values = None` models a
    /// record whose vector the backend did not return.
    pub fn insert_raw(
        &self,
        namespace: &str,
        id: &str,
        values: Option<Vec<f32>>,
        attributes: Attributes,
    ) {
        self.namespaces
            .write()
            .entry(namespace.to_string())
            .or_default()
            .insert(id.to_string(), MockStoredPoint { values, attributes });
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Parks every later upsert; each `notify_one` on the handle releases one.
    pub fn hold_upserts(&self) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        *self.upsert_hold.lock() = Some(Arc::clone(&hold));
        hold
    }
}

#[async_trait]
impl VectorIndex for MockVectorIndex {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<(), VectorDbError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        let hold = self.upsert_hold.lock().clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(VectorDbError::UpsertFailed {
                namespace: namespace.to_string(),
                message: "mock upsert failure".to_string(),
            });
        }

        if let Some(bad) = records.iter().find(|r| r.values.len() != self.dim) {
            return Err(VectorDbError::InvalidDimension {
                expected: self.dim,
                actual: bad.values.len(),
            });
        }

        let mut namespaces = self.namespaces.write();
        let ns = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            ns.insert(
                record.id,
                MockStoredPoint {
                    values: Some(record.values),
                    attributes: record.attributes,
                },
            );
        }
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<VectorMatch>, VectorDbError> {
        let namespaces = self.namespaces.read();
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<VectorMatch> = ns
            .iter()
            .filter_map(|(id, p)| {
                p.values.as_ref().map(|values| VectorMatch {
                    id: id.clone(),
                    score: cosine_similarity(&vector, values),
                    attributes: p.attributes.clone(),
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k as usize);
        Ok(matches)
    }

    async fn fetch_all(&self, namespace: &str) -> Result<Vec<StoredRecord>, VectorDbError> {
        Ok(self
            .namespaces
            .read()
            .get(namespace)
            .map(|ns| {
                ns.iter()
                    .map(|(id, p)| StoredRecord {
                        id: id.clone(),
                        values: p.values.clone(),
                        attributes: p.attributes.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<(), VectorDbError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(VectorDbError::DeleteFailed {
                namespace: namespace.to_string(),
                message: "mock delete failure".to_string(),
            });
        }
        self.namespaces.write().remove(namespace);
        Ok(())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
