//! Clips - Clipboard module
//!
//! Provides clipboard monitoring, classification and content models

pub mod classify;
pub mod models;
pub mod monitor;

pub use models::{ClipboardContent, ContentKind, HistoryEntry, HistoryEntryView};
pub use monitor::{ClipboardMonitor, MonitorError};
