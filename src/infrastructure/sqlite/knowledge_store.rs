use crate::domain::entities::knowledge_entry::KnowledgeEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::knowledge_store::KnowledgeStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::sync::Mutex;

pub struct SqliteKnowledgeStore {
    conn: Mutex<Connection>,
}

impl SqliteKnowledgeStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    fn serialize_vector(v: &[f32]) -> Vec<u8> {
        v.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_vector(bytes: &[u8]) -> Vec<f32> {
        bytes.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

impl KnowledgeStore for SqliteKnowledgeStore {
    fn append(
        &self,
        document: &str,
        metadata: &Value,
        vector: &[f32],
        created_at: &DateTime<Utc>,
    ) -> Result<i64, DomainError> {
        let conn = self.conn.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO knowledge_entries (document, metadata, vector, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                document,
                metadata.to_string(),
                Self::serialize_vector(vector),
                created_at.to_rfc3339(),
            ],
        ).map_err(|e| DomainError::Database(format!("Failed to append knowledge entry: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    fn load_all(&self) -> Result<Vec<KnowledgeEntry>, DomainError> {
        let conn = self.conn.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare("SELECT id, document, metadata, vector, created_at FROM knowledge_entries ORDER BY id ASC")
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let entries = stmt
            .query_map([], |row| {
                let metadata_str: String = row.get(2)?;
                let blob: Vec<u8> = row.get(3)?;
                let created_str: String = row.get(4)?;
                Ok(KnowledgeEntry {
                    id: row.get(0)?,
                    document: row.get(1)?,
                    metadata: serde_json::from_str(&metadata_str).unwrap_or(Value::Null),
                    vector: Self::deserialize_vector(&blob),
                    created_at: DateTime::parse_from_rfc3339(&created_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn count(&self) -> Result<usize, DomainError> {
        let conn = self.conn.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM knowledge_entries", [], |r| r.get(0))
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(count as usize)
    }
}
