use crate::domain::entities::asset_record::AssetRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::asset_repository::AssetRepository;
use crate::domain::values::asset_category::AssetCategory;
use chrono::DateTime;
use rusqlite::{params, Connection};
use std::sync::Mutex;

const SELECT_COLS: &str =
    "id, name, category, description, last_price, contract_address, token_id, created_at, updated_at";

pub struct SqliteAssetRepo {
    conn: Mutex<Connection>,
}

impl SqliteAssetRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<AssetRecord, rusqlite::Error> {
        let cat_str: String = row.get(2)?;
        let token_id: Option<i64> = row.get(6)?;
        let created_str: String = row.get(7)?;
        let updated_str: String = row.get(8)?;

        Ok(AssetRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            category: cat_str.parse().unwrap_or_else(|_| {
                tracing::warn!(category = %cat_str, "invalid asset category in store, defaulting to other");
                AssetCategory::Other
            }),
            description: row.get(3)?,
            last_price: row.get(4)?,
            contract_address: row.get(5)?,
            token_id: token_id.map(|t| t as u64),
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&updated_str)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }
}

impl AssetRepository for SqliteAssetRepo {
    fn get(&self, id: &str) -> Result<Option<AssetRecord>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let sql = format!("SELECT {} FROM assets WHERE id = ?1", SELECT_COLS);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut rows = stmt
            .query_map(params![id], Self::row_to_record)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        rows.next().transpose().map_err(DomainError::from)
    }

    fn upsert(&self, record: &AssetRecord) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO assets (id, name, category, description, last_price, contract_address, token_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                description = excluded.description,
                last_price = excluded.last_price,
                contract_address = excluded.contract_address,
                token_id = excluded.token_id,
                updated_at = excluded.updated_at",
            params![
                record.id,
                record.name,
                record.category.to_string(),
                record.description,
                record.last_price,
                record.contract_address,
                record.token_id.map(|t| t as i64),
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        ).map_err(|e| DomainError::Database(format!("Failed to upsert asset: {e}")))?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<AssetRecord>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let sql = format!("SELECT {} FROM assets ORDER BY id ASC", SELECT_COLS);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let records = stmt
            .query_map([], Self::row_to_record)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    fn count(&self) -> Result<usize, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM assets", [], |r| r.get(0))
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(total as usize)
    }
}
