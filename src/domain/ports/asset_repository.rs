use crate::domain::entities::asset_record::AssetRecord;
use crate::domain::error::DomainError;

pub trait AssetRepository: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<AssetRecord>, DomainError>;
    /// Inserts or replaces the record with the same id.
    fn upsert(&self, record: &AssetRecord) -> Result<(), DomainError>;
    fn list(&self) -> Result<Vec<AssetRecord>, DomainError>;
    fn count(&self) -> Result<usize, DomainError>;
}
