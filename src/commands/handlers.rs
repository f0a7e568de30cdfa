//! Clips - Command handlers
//!
//! Read and mutate the history on behalf of a UI. Every handler returns a
//! serializable `CommandResult`, never a panic or a raw error.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clipboard::{HistoryEntry, HistoryEntryView};
use crate::config::Settings;
use crate::history::{EntryFilter, HistoryEngine};
use crate::pasteboard::Pasteboard;
use crate::storage::KeyValueStore;

/// Command execution result
#[derive(Debug, Serialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, String> {
    Uuid::parse_str(id).map_err(|e| format!("Invalid item id '{}': {}", id, e))
}

/// Settings update request, absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub poll_interval_ms: Option<u64>,
    pub history_capacity: Option<usize>,
    pub preview_length: Option<usize>,
}

pub struct Commands {
    engine: Arc<HistoryEngine>,
    pasteboard: Arc<dyn Pasteboard>,
    store: Arc<dyn KeyValueStore>,
    settings: RwLock<Settings>,
}

impl Commands {
    pub fn new(
        engine: Arc<HistoryEngine>,
        pasteboard: Arc<dyn Pasteboard>,
        store: Arc<dyn KeyValueStore>,
        settings: Settings,
    ) -> Self {
        Self {
            engine,
            pasteboard,
            store,
            settings: RwLock::new(settings),
        }
    }

    fn views<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a HistoryEntry>,
    ) -> Vec<HistoryEntryView> {
        let preview_length = self.settings.read().preview_length;
        entries
            .into_iter()
            .map(|e| HistoryEntryView::from_entry(e, preview_length))
            .collect()
    }

    /// Get clipboard history list
    pub fn get_history(&self, limit: Option<usize>) -> CommandResult<Vec<HistoryEntryView>> {
        let entries = self.engine.entries();
        let limit = limit.unwrap_or(entries.len());
        CommandResult::ok(self.views(entries.iter().take(limit)))
    }

    /// Get complete content of a single record
    pub fn get_item(&self, id: &str) -> CommandResult<HistoryEntry> {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(e) => return CommandResult::err(e),
        };
        match self.engine.get(id) {
            Some(entry) => CommandResult::ok(entry),
            None => CommandResult::err(format!("Item not found: {}", id)),
        }
    }

    /// Search records, `filter` is one of "all", "text", "image", "favorites"
    pub fn search(
        &self,
        query: &str,
        filter: Option<&str>,
    ) -> CommandResult<Vec<HistoryEntryView>> {
        let filter = filter.map(EntryFilter::parse).unwrap_or_default();
        let entries = self.engine.search(query, filter);
        CommandResult::ok(self.views(&entries))
    }

    /// Copy a record back onto the system clipboard
    pub fn copy_item(&self, id: &str) -> CommandResult<bool> {
        let item = match self.get_item(id) {
            CommandResult { data: Some(item), .. } => item,
            CommandResult { error, .. } => {
                return CommandResult::err(error.unwrap_or_else(|| "Item not found".to_string()))
            }
        };

        match self.pasteboard.write(&item.content) {
            Ok(()) => {
                log::info!("Copied item {} to clipboard", item.id);
                CommandResult::ok(true)
            }
            Err(e) => CommandResult::err(format!("Failed to set clipboard: {}", e)),
        }
    }

    /// Toggle favorite, returns the new flag
    pub fn toggle_favorite(&self, id: &str) -> CommandResult<bool> {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(e) => return CommandResult::err(e),
        };
        match self.engine.toggle_favorite(id) {
            Some(is_favorite) => CommandResult::ok(is_favorite),
            None => CommandResult::err(format!("Item not found: {}", id)),
        }
    }

    pub fn get_favorites(&self) -> CommandResult<Vec<HistoryEntryView>> {
        CommandResult::ok(self.views(&self.engine.favorites()))
    }

    pub fn clear_favorites(&self) -> CommandResult<bool> {
        self.engine.clear_favorites();
        CommandResult::ok(true)
    }

    /// Delete specified record
    pub fn delete_item(&self, id: &str) -> CommandResult<bool> {
        match parse_id(id) {
            Ok(id) => CommandResult::ok(self.engine.remove(id)),
            Err(e) => CommandResult::err(e),
        }
    }

    /// Clear all history records
    pub fn clear_history(&self) -> CommandResult<bool> {
        self.engine.clear();
        CommandResult::ok(true)
    }

    /// Get total record count
    pub fn get_history_count(&self) -> CommandResult<usize> {
        CommandResult::ok(self.engine.len())
    }

    pub fn get_settings(&self) -> CommandResult<Settings> {
        CommandResult::ok(self.settings.read().clone())
    }

    /// Update and persist settings.
    ///
    /// Preview length applies immediately. Capacity and poll interval are
    /// read at startup and take effect on the next launch.
    pub fn update_settings(&self, updates: SettingsUpdate) -> CommandResult<Settings> {
        let mut settings = self.settings.read().clone();
        if let Some(interval) = updates.poll_interval_ms {
            settings.poll_interval_ms = interval;
        }
        if let Some(capacity) = updates.history_capacity {
            settings.history_capacity = capacity;
        }
        if let Some(length) = updates.preview_length {
            settings.preview_length = length;
        }
        let settings = settings.normalized();

        if let Err(e) = settings.save(self.store.as_ref()) {
            log::error!("Failed to save settings: {}", e);
            return CommandResult::err(format!("Failed to save settings: {}", e));
        }
        *self.settings.write() = settings.clone();
        log::info!("Settings updated");
        CommandResult::ok(settings)
    }
}
