use crate::domain::error::DomainError;
use crate::domain::values::asset_category::AssetCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_ASSET_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    #[serde(alias = "asset_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: AssetCategory,
    #[serde(default)]
    pub description: String,
    /// Last price produced for (or registered with) this asset.
    #[serde(default, alias = "initial_price")]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub token_id: Option<u64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl AssetRecord {
    pub fn new(id: String, name: String, category: AssetCategory, description: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            category,
            description,
            last_price: None,
            contract_address: None,
            token_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Minimal record for an asset first seen through a price request.
    pub fn placeholder(id: &str, price_hint: Option<f64>) -> Self {
        let mut record = Self::new(id.to_string(), id.to_string(), AssetCategory::Other, String::new());
        record.last_price = price_hint.filter(|p| *p > 0.0);
        record
    }

    /// A copy of this record carrying a newly produced price.
    pub fn repriced(&self, price: f64, at: DateTime<Utc>) -> Self {
        Self {
            last_price: Some(price),
            updated_at: at,
            ..self.clone()
        }
    }

    /// Validates an asset identifier: non-empty, bounded, no whitespace or
    /// control characters.
    pub fn validate_id(id: &str) -> Result<&str, DomainError> {
        if id.is_empty() {
            return Err(DomainError::AssetNotResolvable("asset id is empty".into()));
        }
        if id.len() > MAX_ASSET_ID_LEN {
            return Err(DomainError::AssetNotResolvable(format!(
                "asset id longer than {MAX_ASSET_ID_LEN} bytes"
            )));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::AssetNotResolvable(format!(
                "asset id '{}' contains whitespace or control characters",
                id.escape_debug()
            )));
        }
        Ok(id)
    }

    /// Text representation for embedding/search
    pub fn searchable_text(&self) -> String {
        let mut text = format!("{} {} {}", self.id, self.name, self.category);
        if !self.description.is_empty() {
            text.push(' ');
            text.push_str(&self.description);
        }
        text
    }
}
