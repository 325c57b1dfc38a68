//! Content classification and display rendering
//!
//! Decides from an object key whether its bytes should be shown as UTF-8
//! text, as base64 (images), or as an opaque binary marker. The agent tool
//! layer always wants a string back, so rendering never fails.

use base64::Engine;

/// Marker returned for text objects that are not valid UTF-8
pub const UNREADABLE_TEXT_MARKER: &str = "[Unreadable text file]";

/// How an object's bytes are presented to a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `text/*`: decoded as UTF-8
    Text,
    /// `image/*`: base64-encoded
    Image,
    /// Everything else, including unknown extensions
    Binary,
}

/// Result of classifying a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Presentation kind
    pub kind: ContentKind,
    /// Guessed MIME type, if the extension is known
    pub mime: Option<String>,
}

/// Classify an object key by the MIME type guessed from its extension
pub fn classify(key: &str) -> Classification {
    let mime = mime_guess::from_path(key).first();

    let kind = match &mime {
        Some(m) if m.type_() == mime_guess::mime::TEXT => ContentKind::Text,
        Some(m) if m.type_() == mime_guess::mime::IMAGE => ContentKind::Image,
        _ => ContentKind::Binary,
    };

    Classification {
        kind,
        mime: mime.map(|m| m.essence_str().to_string()),
    }
}

/// Render object bytes as a caller-facing string
pub fn render(key: &str, data: &[u8], classification: &Classification) -> String {
    match classification.kind {
        ContentKind::Text => match std::str::from_utf8(data) {
            Ok(text) => text.to_string(),
            Err(_) => UNREADABLE_TEXT_MARKER.to_string(),
        },
        ContentKind::Image => base64::engine::general_purpose::STANDARD.encode(data),
        ContentKind::Binary => binary_marker(key, classification.mime.as_deref()),
    }
}

/// Classify `key` and render `data` accordingly
pub fn render_object(key: &str, data: &[u8]) -> String {
    render(key, data, &classify(key))
}

/// Placeholder text for content that is not shown inline
pub fn binary_marker(key: &str, mime: Option<&str>) -> String {
    format!("[Binary file: {}, type: {}]", key, mime.unwrap_or("unknown"))
}
