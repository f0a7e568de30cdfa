//! Clips - Pasteboard adapter
//!
//! The contract the monitor consumes to observe and write the system clipboard

pub mod memory;
pub mod system;

use std::path::PathBuf;

use crate::clipboard::ClipboardContent;

pub use memory::MemoryPasteboard;
pub use system::SystemPasteboard;

/// Opaque counter that changes whenever the clipboard contents are replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeToken(pub u64);

/// Every representation present on the clipboard at read time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteboardSnapshot {
    /// Image data in an encoded image format (PNG for direct images)
    pub image: Option<Vec<u8>>,
    /// File references
    pub files: Vec<PathBuf>,
    /// String data
    pub text: Option<String>,
}

impl PasteboardSnapshot {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.files.is_empty() && self.text.is_none()
    }
}

/// Pasteboard error type
#[derive(Debug, thiserror::Error)]
pub enum PasteboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub trait Pasteboard: Send + Sync {
    fn change_token(&self) -> Result<ChangeToken, PasteboardError>;

    /// Read the current contents, `None` when the clipboard is empty
    fn read_current(&self) -> Result<Option<PasteboardSnapshot>, PasteboardError>;

    fn write(&self, content: &ClipboardContent) -> Result<(), PasteboardError>;
}
