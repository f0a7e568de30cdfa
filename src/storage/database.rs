//! Clips - Database operations module
//!
//! Uses SQLite as a key/value blob store

use std::fs;
use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{KeyValueStore, StorageError};

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "data.db";

/// SQLite backed store, owns its connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database in `data_dir`
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        // Ensure data directory exists
        fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join(DATABASE_FILE);
        log::info!("[Storage] Opening database at: {:?}", db_path);

        Self::init(Connection::open(&db_path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        log::debug!("[Storage] Database initialized");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, bytes, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let value = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(value)
    }
}
