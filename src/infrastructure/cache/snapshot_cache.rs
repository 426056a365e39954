use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::entities::snapshot::DataSourceSnapshot;
use crate::domain::error::DomainError;
use crate::domain::ports::reasoning_port::SnapshotSet;
use crate::domain::ports::snapshot_repository::SnapshotRepository;

/// Latest snapshot per source. Readers clone `Arc`s out under the shared
/// lock; an update swaps one `Arc` under the exclusive lock and is rejected
/// when older than the cached snapshot.
pub struct SnapshotCache {
    entries: RwLock<HashMap<String, Arc<DataSourceSnapshot>>>,
    repo: Option<Arc<dyn SnapshotRepository>>,
}

impl SnapshotCache {
    /// A cache with no durable backing.
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            repo: None,
        }
    }

    /// Populates the cache from persisted snapshots and writes through to `repo`.
    pub fn load(repo: Arc<dyn SnapshotRepository>) -> Result<Self, DomainError> {
        let entries = repo
            .load_all()?
            .into_iter()
            .map(|s| (s.source.clone(), Arc::new(s)))
            .collect();
        Ok(Self {
            entries: RwLock::new(entries),
            repo: Some(repo),
        })
    }

    /// Applies `snapshot` unless a newer one is already cached.
    ///
    /// Returns whether the update was applied. When persistence fails the
    /// cached value is left untouched.
    pub fn update(&self, snapshot: DataSourceSnapshot) -> Result<bool, DomainError> {
        let mut entries = self.entries.write();
        if let Some(current) = entries.get(&snapshot.source) {
            if current.timestamp > snapshot.timestamp {
                return Ok(false);
            }
        }
        if let Some(repo) = &self.repo {
            repo.upsert(&snapshot)?;
        }
        entries.insert(snapshot.source.clone(), Arc::new(snapshot));
        Ok(true)
    }

    pub fn get(&self, source: &str) -> Option<Arc<DataSourceSnapshot>> {
        self.entries.read().get(source).cloned()
    }

    /// Latest snapshots for the named sources; missing names are skipped.
    pub fn latest(&self, sources: &[&str]) -> SnapshotSet {
        let entries = self.entries.read();
        sources
            .iter()
            .filter_map(|name| entries.get(*name).map(|s| (name.to_string(), s.clone())))
            .collect()
    }

    pub fn all(&self) -> SnapshotSet {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
