use crate::domain::entities::snapshot::DataSourceSnapshot;
use crate::domain::error::DomainError;

/// Persistence for the data source cache, one row per source name.
pub trait SnapshotRepository: Send + Sync {
    fn upsert(&self, snapshot: &DataSourceSnapshot) -> Result<(), DomainError>;
    fn load_all(&self) -> Result<Vec<DataSourceSnapshot>, DomainError>;
}
