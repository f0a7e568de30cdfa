//! Clips - History module
//!
//! Bounded, deduplicated, persisted clipboard history

pub mod codec;
pub mod engine;

pub use engine::{EntryFilter, HistoryEngine, HistorySnapshot};
