//! Clips - Clipboard content classification
//!
//! Turns a raw pasteboard snapshot into a single `ClipboardContent`.
//! Image intent wins over text: some writers put an image together with a
//! textual placeholder on the clipboard.

use std::fs;
use std::path::{Path, PathBuf};

use super::models::ClipboardContent;
use crate::pasteboard::PasteboardSnapshot;

/// Raster image extensions recognised on copied files
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "ico", "tif", "tiff", "heic",
];

/// Classify a snapshot, first match wins:
/// direct image data, then an image file reference, then text.
pub fn classify(snapshot: PasteboardSnapshot) -> Option<ClipboardContent> {
    if let Some(bytes) = snapshot.image.filter(|b| !b.is_empty()) {
        return Some(ClipboardContent::image(bytes, None));
    }

    if let Some(content) = read_image_files(&snapshot.files) {
        return Some(content);
    }

    snapshot
        .text
        .filter(|t| !t.is_empty())
        .map(ClipboardContent::text)
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Load the first readable image file from a file reference list
fn read_image_files(files: &[PathBuf]) -> Option<ClipboardContent> {
    for path in files {
        if !is_image_path(path) {
            log::debug!("[Classify] Skipping non-image file: {:?}", path);
            continue;
        }
        if !path.is_file() {
            log::debug!("[Classify] Not a file: {:?}", path);
            continue;
        }

        match fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => {
                let hint = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                log::debug!("[Classify] Read image from file: {:?} ({} bytes)", path, bytes.len());
                return Some(ClipboardContent::image(bytes, hint));
            }
            Ok(_) => log::debug!("[Classify] Empty image file: {:?}", path),
            Err(e) => log::warn!("[Classify] Failed to read image file {:?}: {}", path, e),
        }
    }
    None
}
