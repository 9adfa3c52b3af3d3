use std::collections::{BTreeMap, HashMap};

use qdrant_client::qdrant::Value;

/// Flat string attributes stored with each vector.
pub type Attributes = BTreeMap<String, String>;

/// Payload key holding the namespace (repo id) of a point.
pub const NAMESPACE_KEY: &str = "_namespace";

/// Payload key holding the record id (chunk id) of a point.
pub const RECORD_ID_KEY: &str = "_record_id";

/// A vector ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Chunk id, unique within a namespace.
    pub id: String,
    pub values: Vec<f32>,
    pub attributes: Attributes,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, values: Vec<f32>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            values,
            attributes,
        }
    }
}

/// A record as read back from a namespace scan. The vector may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub values: Option<Vec<f32>>,
    pub attributes: Attributes,
}

/// A similarity search hit, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub attributes: Attributes,
}

/// Builds a point payload: the attributes plus the reserved namespace and id keys.
pub fn to_payload(namespace: &str, record_id: &str, attributes: Attributes) -> HashMap<String, Value> {
    let mut payload: HashMap<String, Value> = attributes
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect();
    payload.insert(NAMESPACE_KEY.to_string(), namespace.to_string().into());
    payload.insert(RECORD_ID_KEY.to_string(), record_id.to_string().into());
    payload
}

/// Splits a point payload into `(record id, attributes)`.
///
/// Reserved keys are removed; non-string values are skipped. Returns `None` when the
/// record id is missing.
pub fn from_payload(mut payload: HashMap<String, Value>) -> Option<(String, Attributes)> {
    let id = payload
        .remove(RECORD_ID_KEY)
        .and_then(|v| v.as_str().map(|s| s.to_string()))?;
    payload.remove(NAMESPACE_KEY);

    let attributes = payload
        .into_iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
        .collect();

    Some((id, attributes))
}
