use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::domain::entities::asset_record::AssetRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::asset_repository::AssetRepository;

pub struct AssetUseCase {
    repo: Arc<dyn AssetRepository>,
}

impl AssetUseCase {
    pub fn new(repo: Arc<dyn AssetRepository>) -> Self {
        Self { repo }
    }

    pub fn get(&self, asset_id: &str) -> Result<Option<AssetRecord>, DomainError> {
        let asset_id = AssetRecord::validate_id(asset_id)?;
        self.repo.get(asset_id)
    }

    /// Inserts or replaces an asset. The original creation time is kept when
    /// the asset already exists.
    pub fn register(&self, mut record: AssetRecord) -> Result<AssetRecord, DomainError> {
        validate(&record)?;
        if record.name.is_empty() {
            record.name = record.id.clone();
        }
        let now = Utc::now();
        record.created_at = match self.repo.get(&record.id)? {
            Some(existing) => existing.created_at,
            None => now,
        };
        record.updated_at = now;
        self.repo.upsert(&record)?;
        tracing::info!(asset_id = %record.id, category = %record.category, "asset registered");
        Ok(record)
    }

    /// Registers every asset in `json`: either an array of records or an
    /// object keyed by asset id. Every record is validated before the first
    /// one is written, so an invalid record rejects the whole file.
    pub fn import(&self, json: &str) -> Result<Vec<AssetRecord>, DomainError> {
        let records = parse_records(json)?;
        for record in &records {
            validate(record)?;
        }
        let mut imported = Vec::with_capacity(records.len());
        for record in records {
            imported.push(self.register(record)?);
        }
        tracing::info!(count = imported.len(), "assets imported");
        Ok(imported)
    }

    pub fn list(&self) -> Result<Vec<AssetRecord>, DomainError> {
        self.repo.list()
    }
}

fn validate(record: &AssetRecord) -> Result<(), DomainError> {
    AssetRecord::validate_id(&record.id)?;
    match record.last_price {
        Some(price) if !price.is_finite() || price <= 0.0 => Err(DomainError::InvalidInput(format!(
            "price for '{}' must be positive, got {price}",
            record.id
        ))),
        _ => Ok(()),
    }
}

fn parse_records(json: &str) -> Result<Vec<AssetRecord>, DomainError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(DomainError::from))
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(id, mut item)| {
                if let Value::Object(fields) = &mut item {
                    fields.entry("id").or_insert(Value::String(id));
                }
                serde_json::from_value(item).map_err(DomainError::from)
            })
            .collect(),
        _ => Err(DomainError::InvalidInput(
            "asset import expects a JSON array or object".into(),
        )),
    }
}
