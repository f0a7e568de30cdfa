//! Clips - User settings module
//!
//! Manages application configuration, persisted next to the history

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clipboard::monitor::DEFAULT_POLL_INTERVAL_MS;
use crate::history::engine::DEFAULT_CAPACITY;
use crate::storage::{KeyValueStore, StorageError};

/// Storage key of the settings document
pub const SETTINGS_KEY: &str = "clips.settings";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CLIPS_DATA_DIR";

/// Lower bound for the polling interval (milliseconds)
const MIN_POLL_INTERVAL_MS: u64 = 50;

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Clipboard polling interval (milliseconds)
    pub poll_interval_ms: u64,
    /// Maximum number of history entries
    pub history_capacity: usize,
    /// Preview text length
    pub preview_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            history_capacity: DEFAULT_CAPACITY,
            preview_length: 100,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults for anything missing or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let settings = match store.load(SETTINGS_KEY) {
            Ok(Some(bytes)) => serde_json::from_slice::<Settings>(&bytes).unwrap_or_else(|e| {
                log::warn!("Stored settings are unreadable, using defaults: {}", e);
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(e) => {
                log::warn!("Failed to load settings, using defaults: {}", e);
                Settings::default()
            }
        };
        settings.normalized()
    }

    /// Save settings
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| StorageError::Unavailable(format!("failed to encode settings: {}", e)))?;
        store.save(SETTINGS_KEY, &bytes)
    }

    /// Clamp values into their usable ranges
    pub fn normalized(mut self) -> Self {
        self.history_capacity = self.history_capacity.max(1);
        self.poll_interval_ms = self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Get the application data directory
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clips")
}
