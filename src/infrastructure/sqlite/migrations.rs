use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS assets (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            last_price REAL,
            contract_address TEXT,
            token_id INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS data_source_snapshots (
            source TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS knowledge_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            vector BLOB NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_assets_category ON assets(category);
        CREATE INDEX IF NOT EXISTS idx_knowledge_created ON knowledge_entries(created_at);
        "
    ).map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}

/// Opens a connection in WAL mode with the schema in place.
pub fn open_connection(db_path: &str) -> Result<Connection, DomainError> {
    let conn = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
    // In-memory databases answer "memory" here.
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
    run_migrations(&conn)?;
    Ok(conn)
}
