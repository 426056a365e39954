use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::asset_record::AssetRecord;
use crate::domain::entities::knowledge_entry::ScoredEntry;
use crate::domain::entities::snapshot::DataSourceSnapshot;
use crate::domain::error::DomainError;
use crate::domain::values::trend::Trend;

/// Latest snapshot per source name.
pub type SnapshotSet = BTreeMap<String, Arc<DataSourceSnapshot>>;

/// What the reasoning step suggested for the price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PriceSuggestion {
    Absolute(f64),
    /// Relative change in percent (5.0 means +5%).
    ChangePct(f64),
}

/// A structured opinion returned by the reasoning step.
///
/// Not reproducible: identical inputs may yield different opinions, so every
/// opinion carries its own timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningOpinion {
    pub suggestion: PriceSuggestion,
    pub rationale: String,
    /// Self-reported confidence in [0, 1].
    pub confidence: f64,
    pub trend: Option<Trend>,
    pub produced_at: DateTime<Utc>,
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    fn name(&self) -> &str;

    /// Fails with `ReasoningUnavailable` or `ReasoningParse`.
    async fn evaluate(
        &self,
        asset: &AssetRecord,
        snapshots: &SnapshotSet,
        context: &[ScoredEntry],
    ) -> Result<ReasoningOpinion, DomainError>;
}

/// A chat-style large language model endpoint.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError>;
}
