use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::application::knowledge_base::KnowledgeBase;
use crate::domain::entities::snapshot::DataSourceSnapshot;
use crate::domain::error::DomainError;
use crate::domain::values::freshness::is_stale;
use crate::infrastructure::cache::snapshot_cache::SnapshotCache;

/// Acknowledgement of a data-source update.
#[derive(Debug, Clone, Serialize)]
pub struct DataSourceAck {
    pub source: String,
    /// False when the cache already held a newer snapshot.
    pub applied: bool,
    pub timestamp: DateTime<Utc>,
    pub knowledge_entry_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub stale: bool,
    pub summary: String,
}

/// The single write path into the data source cache.
pub struct DataSourceUseCase {
    cache: Arc<SnapshotCache>,
    knowledge: Arc<KnowledgeBase>,
}

impl DataSourceUseCase {
    pub fn new(cache: Arc<SnapshotCache>, knowledge: Arc<KnowledgeBase>) -> Self {
        Self { cache, knowledge }
    }

    pub async fn update(
        &self,
        source: &str,
        payload: Value,
        timestamp: DateTime<Utc>,
    ) -> Result<DataSourceAck, DomainError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(DomainError::InvalidInput("source name is empty".into()));
        }
        if payload.is_null() {
            return Err(DomainError::InvalidInput(format!(
                "payload for '{source}' is null"
            )));
        }

        let snapshot = DataSourceSnapshot::new(source, payload, timestamp);
        let document = snapshot.to_document();
        let applied = self.cache.update(snapshot)?;
        if !applied {
            tracing::info!(source, %timestamp, "older snapshot ignored");
            return Ok(DataSourceAck {
                source: source.to_string(),
                applied,
                timestamp,
                knowledge_entry_id: None,
            });
        }

        let metadata = json!({
            "source": source,
            "timestamp": timestamp.to_rfc3339(),
        });
        let knowledge_entry_id = match self.knowledge.insert(&document, metadata).await {
            Ok(receipt) => Some(receipt.id),
            Err(e) => {
                tracing::warn!(error = %e, source, "snapshot not recorded in knowledge base");
                None
            }
        };
        tracing::info!(source, %timestamp, "data source updated");

        Ok(DataSourceAck {
            source: source.to_string(),
            applied,
            timestamp,
            knowledge_entry_id,
        })
    }

    pub fn list(&self, stale_after: Duration) -> Vec<SourceStatus> {
        let now = Utc::now();
        self.cache
            .all()
            .into_values()
            .map(|snap| SourceStatus {
                source: snap.source.clone(),
                timestamp: snap.timestamp,
                stale: is_stale(&snap.timestamp, stale_after, &now),
                summary: snap.summary(),
            })
            .collect()
    }
}
