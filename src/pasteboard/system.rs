//! System clipboard adapter
//!
//! Reads the OS clipboard through arboard. Windows exposes a clipboard sequence
//! number and a file-drop format through clipboard-win; other platforms get a
//! change token derived from a content fingerprint.

use std::io::Cursor;
use std::path::PathBuf;

use arboard::{Clipboard, ImageData};
use blake3::Hasher;
use parking_lot::Mutex;

use super::{ChangeToken, Pasteboard, PasteboardError, PasteboardSnapshot};
use crate::clipboard::ClipboardContent;

/// Raw clipboard contents before image encoding
struct RawContents {
    image: Option<ImageData<'static>>,
    files: Vec<PathBuf>,
    text: Option<String>,
}

#[derive(Default)]
struct FingerprintState {
    counter: u64,
    last_hash: Option<String>,
}

#[derive(Default)]
pub struct SystemPasteboard {
    fingerprint: Mutex<FingerprintState>,
}

impl SystemPasteboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new Clipboard instance on each access to ensure getting latest data
    fn open() -> Result<Clipboard, PasteboardError> {
        Clipboard::new().map_err(|e| PasteboardError::Unavailable(e.to_string()))
    }

    fn read_raw(clipboard: &mut Clipboard) -> RawContents {
        let image = match clipboard.get_image() {
            Ok(image) => {
                log::debug!("[Clipboard] Detected direct image: {}x{}", image.width, image.height);
                Some(image)
            }
            Err(e) => {
                log::debug!("[Clipboard] No direct image: {}", e);
                None
            }
        };

        let text = clipboard.get_text().ok().filter(|t| !t.is_empty());

        let mut files = platform::read_file_list();
        if files.is_empty() {
            if let Some(text) = &text {
                files = file_uris_from_text(text);
            }
        }

        RawContents { image, files, text }
    }

    /// Fingerprint of raw contents, image hashed on its RGBA data
    fn compute_hash(raw: &RawContents) -> String {
        let mut hasher = Hasher::new();
        if let Some(image) = &raw.image {
            hasher.update(b"image");
            hasher.update(&(image.width as u64).to_le_bytes());
            hasher.update(&(image.height as u64).to_le_bytes());
            hasher.update(&image.bytes);
        }
        for file in &raw.files {
            hasher.update(b"file");
            hasher.update(file.to_string_lossy().as_bytes());
        }
        if let Some(text) = &raw.text {
            hasher.update(b"text");
            hasher.update(text.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    fn fingerprint_token(&self) -> Result<ChangeToken, PasteboardError> {
        let mut clipboard = Self::open()?;
        let hash = Self::compute_hash(&Self::read_raw(&mut clipboard));

        let mut state = self.fingerprint.lock();
        if state.last_hash.as_deref() != Some(hash.as_str()) {
            log::debug!("[Clipboard] Fingerprint changed: {}", &hash[..8]);
            state.last_hash = Some(hash);
            state.counter += 1;
        }
        Ok(ChangeToken(state.counter))
    }
}

impl Pasteboard for SystemPasteboard {
    fn change_token(&self) -> Result<ChangeToken, PasteboardError> {
        match platform::sequence_number() {
            Some(seq) => Ok(ChangeToken(seq)),
            None => self.fingerprint_token(),
        }
    }

    fn read_current(&self) -> Result<Option<PasteboardSnapshot>, PasteboardError> {
        let mut clipboard = Self::open()?;
        let raw = Self::read_raw(&mut clipboard);

        let mut image = match &raw.image {
            Some(data) => Some(rgba_to_png(data)?),
            None => None,
        };
        if image.is_none() {
            image = platform::read_dib_image();
        }

        let snapshot = PasteboardSnapshot {
            image,
            files: raw.files,
            text: raw.text,
        };
        if snapshot.is_empty() {
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    fn write(&self, content: &ClipboardContent) -> Result<(), PasteboardError> {
        let mut clipboard = Self::open()?;
        match content {
            ClipboardContent::Text { text } => clipboard
                .set_text(text.as_str())
                .map_err(|e| PasteboardError::Unavailable(e.to_string())),
            ClipboardContent::Image { bytes, .. } => {
                let img = image::load_from_memory(bytes)?.into_rgba8();
                let (width, height) = img.dimensions();
                let image_data = ImageData {
                    width: width as usize,
                    height: height as usize,
                    bytes: std::borrow::Cow::Owned(img.into_raw()),
                };
                clipboard
                    .set_image(image_data)
                    .map_err(|e| PasteboardError::Unavailable(e.to_string()))
            }
        }
    }
}

/// Convert RGBA image data to PNG
fn rgba_to_png(data: &ImageData<'_>) -> Result<Vec<u8>, PasteboardError> {
    use image::{ImageBuffer, Rgba};

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(data.width as u32, data.height as u32, data.bytes.to_vec())
            .ok_or_else(|| {
                PasteboardError::Unavailable(format!(
                    "image buffer does not match {}x{}",
                    data.width, data.height
                ))
            })?;

    let mut png_data = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)?;
    log::debug!("[Clipboard] Converted to PNG: {} bytes", png_data.len());
    Ok(png_data)
}

/// Parse a `file://` URI list, as file managers put on the clipboard as text.
///
/// Returns nothing unless every non-empty line is a file URI.
pub(crate) fn file_uris_from_text(text: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(rest) = line.strip_prefix("file://") else {
            return Vec::new();
        };
        // Drop an optional host part ("file://localhost/path")
        let path = match rest.find('/') {
            Some(idx) => &rest[idx..],
            None => return Vec::new(),
        };
        let decoded = urlencoding::decode(path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| path.to_string());
        files.push(PathBuf::from(decoded));
    }
    files
}

#[cfg(windows)]
mod platform {
    use std::path::PathBuf;

    use clipboard_win::{formats, get_clipboard};

    pub fn sequence_number() -> Option<u64> {
        clipboard_win::raw::seq_num().map(|n| n.get() as u64)
    }

    pub fn read_file_list() -> Vec<PathBuf> {
        match get_clipboard::<Vec<String>, _>(formats::FileList) {
            Ok(files) => {
                log::debug!("[Clipboard] FileList detected: {} files", files.len());
                files.into_iter().map(PathBuf::from).collect()
            }
            Err(e) => {
                log::debug!("[Clipboard] No FileList in clipboard: {}", e);
                Vec::new()
            }
        }
    }

    /// Read DIB/Bitmap data written by third-party screenshot tools and convert to PNG
    pub fn read_dib_image() -> Option<Vec<u8>> {
        let bitmap_data: Vec<u8> = match get_clipboard::<Vec<u8>, _>(formats::Bitmap) {
            Ok(data) if !data.is_empty() => data,
            Ok(_) => return None,
            Err(e) => {
                log::debug!("[Clipboard] No DIB/Bitmap data: {}", e);
                return None;
            }
        };

        match image::load_from_memory(&bitmap_data) {
            Ok(img) => {
                let mut png_data = Vec::new();
                let mut cursor = std::io::Cursor::new(&mut png_data);
                match img.write_to(&mut cursor, image::ImageFormat::Png) {
                    Ok(()) => {
                        log::debug!("[Clipboard] Converted DIB to PNG: {} bytes", png_data.len());
                        Some(png_data)
                    }
                    Err(e) => {
                        log::error!("[Clipboard] Failed to convert DIB to PNG: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                log::debug!("[Clipboard] Failed to decode DIB data: {}", e);
                None
            }
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use std::path::PathBuf;

    pub fn sequence_number() -> Option<u64> {
        None
    }

    pub fn read_file_list() -> Vec<PathBuf> {
        Vec::new()
    }

    pub fn read_dib_image() -> Option<Vec<u8>> {
        None
    }
}
