use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::application::knowledge_base::KnowledgeBase;
use crate::domain::error::DomainError;
use crate::domain::ports::asset_repository::AssetRepository;
use crate::domain::values::freshness::is_stale;
use crate::infrastructure::cache::snapshot_cache::SnapshotCache;

#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub assets: usize,
    pub knowledge_entries: usize,
    pub embedding_dimension: usize,
    pub cached_sources: usize,
    pub stale_sources: Vec<String>,
}

pub struct StatsUseCase {
    assets: Arc<dyn AssetRepository>,
    cache: Arc<SnapshotCache>,
    knowledge: Arc<KnowledgeBase>,
}

impl StatsUseCase {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        cache: Arc<SnapshotCache>,
        knowledge: Arc<KnowledgeBase>,
    ) -> Self {
        Self {
            assets,
            cache,
            knowledge,
        }
    }

    pub fn stats(&self, stale_after: Duration) -> Result<EngineStats, DomainError> {
        let now = Utc::now();
        let snapshots = self.cache.all();
        let stale_sources = snapshots
            .values()
            .filter(|s| is_stale(&s.timestamp, stale_after, &now))
            .map(|s| s.source.clone())
            .collect();
        Ok(EngineStats {
            assets: self.assets.count()?,
            knowledge_entries: self.knowledge.size(),
            embedding_dimension: self.knowledge.dimension(),
            cached_sources: snapshots.len(),
            stale_sources,
        })
    }
}
