//! Clips - Clipboard content data models
//!
//! Defines the observed clipboard payload and the history records built from it

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clipboard content kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Plain text
    Text,
    /// Encoded image bytes
    Image,
}

impl ContentKind {
    /// Convert from string to ContentKind
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ContentKind::Text),
            "image" => Some(ContentKind::Image),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Image => "image",
        }
    }
}

/// One observed clipboard payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipboardContent {
    Text {
        text: String,
    },
    Image {
        /// Shared so history snapshots never copy image data
        #[serde(with = "crate::history::codec::base64_bytes")]
        bytes: Arc<[u8]>,
        /// Original file name when the image came from a copied file
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
}

impl ClipboardContent {
    pub fn text(text: impl Into<String>) -> Self {
        ClipboardContent::Text { text: text.into() }
    }

    pub fn image(bytes: impl Into<Arc<[u8]>>, hint: Option<String>) -> Self {
        ClipboardContent::Image {
            bytes: bytes.into(),
            hint,
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ClipboardContent::Text { .. } => ContentKind::Text,
            ClipboardContent::Image { .. } => ContentKind::Image,
        }
    }

    /// Whether two payloads carry the same data.
    ///
    /// Text compares by exact string equality, images by exact encoded bytes.
    /// The file name hint of an image is not part of its identity.
    pub fn same_payload(&self, other: &ClipboardContent) -> bool {
        match (self, other) {
            (ClipboardContent::Text { text: a }, ClipboardContent::Text { text: b }) => a == b,
            (
                ClipboardContent::Image { bytes: a, .. },
                ClipboardContent::Image { bytes: b, .. },
            ) => a == b,
            _ => false,
        }
    }

    /// Text used for searching: the string itself, or the image's file hint
    pub fn searchable_text(&self) -> Option<&str> {
        match self {
            ClipboardContent::Text { text } => Some(text),
            ClipboardContent::Image { hint, .. } => hint.as_deref(),
        }
    }

    /// Generate preview text
    pub fn preview(&self, max_len: usize) -> String {
        match self {
            ClipboardContent::Text { text } => generate_preview(text, max_len),
            ClipboardContent::Image { hint: Some(name), .. } => format!("[Image] {}", name),
            ClipboardContent::Image { hint: None, .. } => "[Image]".to_string(),
        }
    }
}

/// Clipboard history record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Observed payload
    pub content: ClipboardContent,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Whether starred by the user
    #[serde(default)]
    pub is_favorite: bool,
}

impl HistoryEntry {
    /// Create a new record with a fresh id and the current time
    pub fn new(content: ClipboardContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            created_at: Utc::now(),
            is_favorite: false,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.content.kind()
    }
}

fn generate_preview(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}

/// Simplified record for list display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntryView {
    pub id: Uuid,
    pub kind: ContentKind,
    pub preview: String,
    pub created_at: DateTime<Utc>,
    pub is_favorite: bool,
}

impl HistoryEntryView {
    pub fn from_entry(entry: &HistoryEntry, preview_length: usize) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind(),
            preview: entry.content.preview(preview_length),
            created_at: entry.created_at,
            is_favorite: entry.is_favorite,
        }
    }
}
