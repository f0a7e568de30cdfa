//! Clips - History persistence codec
//!
//! The history is stored as one JSON document under a single key

use serde::{Deserialize, Serialize};

use crate::clipboard::HistoryEntry;

/// Current document format version
pub const FORMAT_VERSION: u32 = 1;

/// Codec error type
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported history format version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    entries: &'a [HistoryEntry],
}

#[derive(Deserialize)]
struct Document {
    version: u32,
    entries: Vec<HistoryEntry>,
}

/// Encode entries, newest first
pub fn encode(entries: &[HistoryEntry]) -> Result<Vec<u8>, CodecError> {
    let doc = DocumentRef {
        version: FORMAT_VERSION,
        entries,
    };
    Ok(serde_json::to_vec(&doc)?)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<HistoryEntry>, CodecError> {
    let doc: Document = serde_json::from_slice(bytes)?;
    if doc.version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(doc.version));
    }
    Ok(doc.entries)
}

/// Serde adapter storing image bytes as a base64 string
pub mod base64_bytes {
    use std::sync::Arc;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<[u8]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map(Arc::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ClipboardContent;

    #[test]
    fn round_trips_mixed_history() {
        let image = ClipboardContent::image(vec![0, 159, 146, 150], Some("a.png".into()));
        let mut favorite = HistoryEntry::new(image);
        favorite.is_favorite = true;
        let text = HistoryEntry::new(ClipboardContent::text("héllo\n\"quoted\""));
        let entries = vec![favorite, text];

        let decoded = decode(&encode(&entries).unwrap()).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn round_trips_empty_history() {
        let decoded = decode(&encode(&[]).unwrap()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn image_bytes_are_base64() {
        let entries = vec![HistoryEntry::new(ClipboardContent::image(b"hi".to_vec(), None))];
        let json = String::from_utf8(encode(&entries).unwrap()).unwrap();
        assert!(json.contains("\"bytes\":\"aGk=\""));
        assert!(json.contains("\"kind\":\"image\""));
        assert!(!json.contains("hint"));
    }

    #[test]
    fn rejects_corrupt_input() {
        assert!(matches!(decode(b"\x00\x01garbage"), Err(CodecError::Json(_))));
        assert!(decode(br#"{"version":1,"entries":[{"id":"nope"}]}"#).is_err());
    }

    #[test]
    fn bad_base64_surfaces_as_json_error() {
        let doc = format!(
            r#"{{"version":1,"entries":[{{"id":"{}","content":{},"created_at":"{}"}}]}}"#,
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            r#"{"kind":"image","bytes":"!!!"}"#,
            "2024-01-01T00:00:00Z",
        );
        assert!(matches!(decode(doc.as_bytes()), Err(CodecError::Json(_))));
    }

    #[test]
    fn rejects_unknown_version() {
        assert!(matches!(
            decode(br#"{"version":7,"entries":[]}"#),
            Err(CodecError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn missing_favorite_flag_defaults_to_false() {
        let doc = concat!(
            r#"{"version":1,"entries":[{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","#,
            r#""content":{"kind":"text","text":"x"},"created_at":"2024-01-01T00:00:00Z"}]}"#,
        );
        let decoded = decode(doc.as_bytes()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert!(!decoded[0].is_favorite);
    }
}
