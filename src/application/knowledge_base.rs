//! Append-only, similarity-searchable log of evidence. The in-memory index
//! is rebuilt from the store on open; an insert appends to the store and the
//! index under one write lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::domain::entities::knowledge_entry::{KnowledgeEntry, ScoredEntry};
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::ports::knowledge_store::KnowledgeStore;

/// Outcome of an insert. `embedding_error` is set when the entry was stored
/// with a zero vector because the embedding provider failed.
#[derive(Debug, Clone, Serialize)]
pub struct InsertReceipt {
    pub id: i64,
    pub embedding_error: Option<String>,
}

pub struct KnowledgeBase {
    store: Arc<dyn KnowledgeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    dimension: usize,
    embed_timeout: Duration,
    index: RwLock<Vec<Arc<KnowledgeEntry>>>,
}

impl KnowledgeBase {
    /// Opens the knowledge base and rebuilds the index from `store`.
    ///
    /// Stored entries whose vector length differs from the provider's
    /// dimension are left out of the index.
    pub fn open(
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        embed_timeout: Duration,
    ) -> Result<Self, DomainError> {
        let dimension = embedder.dimension();
        let mut skipped = 0usize;
        let entries: Vec<Arc<KnowledgeEntry>> = store
            .load_all()?
            .into_iter()
            .filter(|e| {
                let ok = e.vector.len() == dimension;
                if !ok {
                    skipped += 1;
                }
                ok
            })
            .map(Arc::new)
            .collect();
        if skipped > 0 {
            tracing::warn!(
                skipped,
                dimension,
                "stored knowledge entries have a different dimension than the embedding provider; left out of the index"
            );
        }
        tracing::info!(entries = entries.len(), dimension, "knowledge base loaded");

        Ok(Self {
            store,
            embedder,
            dimension,
            embed_timeout,
            index: RwLock::new(entries),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn size(&self) -> usize {
        self.index.read().len()
    }

    /// Embeds `document` and appends it.
    ///
    /// An embedding failure does not fail the insert: the entry is stored
    /// with a zero vector and the failure is reported in the receipt.
    pub async fn insert(&self, document: &str, metadata: Value) -> Result<InsertReceipt, DomainError> {
        let (vector, embedding_error) = match self.embed_text(document, InputType::Document).await {
            Ok(v) => (v, None),
            Err(e) => {
                tracing::warn!(error = %e, "embedding failed, storing zero vector");
                (vec![0.0; self.dimension], Some(e.to_string()))
            }
        };
        let id = self.append(document, metadata, vector)?;
        Ok(InsertReceipt { id, embedding_error })
    }

    /// Appends an entry with a precomputed embedding.
    pub fn insert_with_vector(
        &self,
        document: &str,
        metadata: Value,
        vector: Vec<f32>,
    ) -> Result<i64, DomainError> {
        if vector.len() != self.dimension {
            return Err(DomainError::InvalidInput(format!(
                "vector has dimension {}, knowledge base expects {}",
                vector.len(),
                self.dimension
            )));
        }
        self.append(document, metadata, vector)
    }

    /// Top-`k` entries by descending cosine similarity to `text`.
    ///
    /// Ties keep insertion order. An empty knowledge base answers with an
    /// empty result without calling the embedding provider.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredEntry>, DomainError> {
        if k == 0 || self.size() == 0 {
            return Ok(vec![]);
        }
        let query = self.embed_text(text, InputType::Query).await?;

        let index = self.index.read();
        let mut scored: Vec<(f64, &Arc<KnowledgeEntry>)> = index
            .iter()
            .map(|entry| (cosine_similarity(&query, &entry.vector), entry))
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.id.cmp(&b.1.id))
        });
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(similarity, entry)| ScoredEntry {
                entry: entry.as_ref().clone(),
                similarity,
            })
            .collect())
    }

    fn append(&self, document: &str, metadata: Value, vector: Vec<f32>) -> Result<i64, DomainError> {
        let created_at = Utc::now();
        let mut index = self.index.write();
        let id = self.store.append(document, &metadata, &vector, &created_at)?;
        index.push(Arc::new(KnowledgeEntry {
            id,
            document: document.to_string(),
            metadata,
            vector,
            created_at,
        }));
        Ok(id)
    }

    async fn embed_text(&self, text: &str, input_type: InputType) -> Result<Vec<f32>, DomainError> {
        let texts = [text.to_string()];
        let vectors = tokio::time::timeout(self.embed_timeout, self.embedder.embed(&texts, input_type))
            .await
            .map_err(|_| {
                DomainError::Embedding(format!("embedding timed out after {:?}", self.embed_timeout))
            })??;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::Embedding("provider returned no vector".into()))?;
        if vector.len() != self.dimension {
            return Err(DomainError::Embedding(format!(
                "provider returned dimension {}, expected {}",
                vector.len(),
                self.dimension
            )));
        }
        Ok(vector)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}
