//! Clips - Storage module
//!
//! Durable key/value blob storage consumed by the history engine and settings

pub mod database;
pub mod memory;

pub use database::SqliteStore;
pub use memory::MemoryStore;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub trait KeyValueStore: Send + Sync {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Load the blob stored under `key`, `None` when never saved
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}
