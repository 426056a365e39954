use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable (vector, document, metadata) triple.
///
/// `id` is the insertion sequence number, so ordering by id is insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub document: String,
    pub metadata: Value,
    #[serde(skip_serializing, default)]
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// A query hit with its similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEntry {
    pub entry: KnowledgeEntry,
    pub similarity: f64,
}
