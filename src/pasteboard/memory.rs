//! In-process pasteboard
//!
//! Holds a snapshot in memory and bumps its change token on every replacement.
//! Used by headless hosts and tests.

use std::path::PathBuf;

use parking_lot::Mutex;

use super::{ChangeToken, Pasteboard, PasteboardError, PasteboardSnapshot};
use crate::clipboard::ClipboardContent;

#[derive(Debug, Default)]
struct State {
    token: u64,
    snapshot: PasteboardSnapshot,
    failing: bool,
}

#[derive(Debug, Default)]
pub struct MemoryPasteboard {
    state: Mutex<State>,
}

impl MemoryPasteboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot
    pub fn set_snapshot(&self, snapshot: PasteboardSnapshot) {
        let mut state = self.state.lock();
        state.snapshot = snapshot;
        state.token += 1;
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.set_snapshot(PasteboardSnapshot {
            text: Some(text.into()),
            ..Default::default()
        });
    }

    pub fn set_image(&self, bytes: Vec<u8>) {
        self.set_snapshot(PasteboardSnapshot {
            image: Some(bytes),
            ..Default::default()
        });
    }

    pub fn set_files(&self, files: Vec<PathBuf>) {
        self.set_snapshot(PasteboardSnapshot {
            files,
            ..Default::default()
        });
    }

    /// Empty the clipboard
    pub fn clear(&self) {
        self.set_snapshot(PasteboardSnapshot::default());
    }

    /// Make reads fail until reset, simulating another writer holding the clipboard
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Change the token without touching contents
    pub fn bump_token(&self) {
        self.state.lock().token += 1;
    }
}

impl Pasteboard for MemoryPasteboard {
    fn change_token(&self) -> Result<ChangeToken, PasteboardError> {
        Ok(ChangeToken(self.state.lock().token))
    }

    fn read_current(&self) -> Result<Option<PasteboardSnapshot>, PasteboardError> {
        let state = self.state.lock();
        if state.failing {
            return Err(PasteboardError::Unavailable("clipboard is busy".to_string()));
        }
        if state.snapshot.is_empty() {
            return Ok(None);
        }
        Ok(Some(state.snapshot.clone()))
    }

    fn write(&self, content: &ClipboardContent) -> Result<(), PasteboardError> {
        let snapshot = match content {
            ClipboardContent::Text { text } => PasteboardSnapshot {
                text: Some(text.clone()),
                ..Default::default()
            },
            ClipboardContent::Image { bytes, .. } => PasteboardSnapshot {
                image: Some(bytes.to_vec()),
                ..Default::default()
            },
        };
        self.set_snapshot(snapshot);
        Ok(())
    }
}
