use crate::domain::entities::snapshot::DataSourceSnapshot;
use crate::domain::error::DomainError;
use crate::domain::ports::snapshot_repository::SnapshotRepository;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::Mutex;

pub struct SqliteSnapshotRepo {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotRepo {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }
}

impl SnapshotRepository for SqliteSnapshotRepo {
    fn upsert(&self, snapshot: &DataSourceSnapshot) -> Result<(), DomainError> {
        let conn = self.conn.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO data_source_snapshots (source, payload, timestamp) VALUES (?1, ?2, ?3)",
            params![
                snapshot.source,
                snapshot.payload.to_string(),
                snapshot.timestamp.to_rfc3339(),
            ],
        ).map_err(|e| DomainError::Database(format!("Failed to store snapshot: {e}")))?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<DataSourceSnapshot>, DomainError> {
        let conn = self.conn.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare("SELECT source, payload, timestamp FROM data_source_snapshots")
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows: Vec<(String, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<_, _>>()?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for (source, payload, ts) in rows {
            let timestamp = match DateTime::parse_from_rfc3339(&ts) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "skipping persisted snapshot with bad timestamp");
                    continue;
                }
            };
            snapshots.push(DataSourceSnapshot {
                source,
                payload: serde_json::from_str(&payload)?,
                timestamp,
            });
        }
        Ok(snapshots)
    }
}
