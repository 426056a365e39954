use crate::domain::entities::knowledge_entry::KnowledgeEntry;
use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Durable append-only log behind the knowledge base index.
pub trait KnowledgeStore: Send + Sync {
    /// Appends an entry and returns its sequence id. Ids increase with every call.
    fn append(
        &self,
        document: &str,
        metadata: &Value,
        vector: &[f32],
        created_at: &DateTime<Utc>,
    ) -> Result<i64, DomainError>;

    /// Every stored entry in insertion order.
    fn load_all(&self) -> Result<Vec<KnowledgeEntry>, DomainError>;

    fn count(&self) -> Result<usize, DomainError>;
}
