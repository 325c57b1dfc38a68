//! Common types for backend abstraction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Strip the surrounding double quotes S3 puts around ETags
pub fn normalize_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

/// Object metadata across all backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object key (path within bucket)
    pub key: String,

    /// Size in bytes
    pub size: u64,

    /// Last modification time
    pub last_modified: Option<DateTime<Utc>>,

    /// MIME type / content type
    pub content_type: Option<String>,

    /// ETag with quoting stripped
    pub etag: String,

    /// User metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Version ID (if versioning is enabled)
    pub version_id: Option<String>,
}

impl ObjectRecord {
    /// Create a record for a key with the given size
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
            content_type: None,
            etag: String::new(),
            metadata: HashMap::new(),
            version_id: None,
        }
    }

    /// Builder pattern: set the ETag (quotes are stripped)
    pub fn with_etag(mut self, etag: &str) -> Self {
        self.etag = normalize_etag(etag);
        self
    }

    /// Builder pattern: set modification time
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Builder pattern: set content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Fill in the content type from the key's extension when the backend gave none
    pub fn with_inferred_content_type(mut self) -> Self {
        if self.content_type.is_none() {
            self.content_type = crate::content::classify(&self.key).mime;
        }
        self
    }
}

/// Result of a write operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Target bucket
    pub bucket: String,

    /// Object key
    pub key: String,

    /// ETag with quoting stripped
    pub etag: String,

    /// Version ID (if versioning is enabled)
    pub version_id: Option<String>,
}

/// Options for put operations
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Content type / MIME type
    pub content_type: Option<String>,

    /// Custom metadata
    pub metadata: Option<HashMap<String, String>>,
}

impl PutOptions {
    /// Create with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set custom metadata
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// HTTP method a presigned URL is valid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresignMethod {
    /// Download (GetObject)
    #[default]
    Get,

    /// Upload (PutObject)
    Put,
}

impl PresignMethod {
    /// Map an HTTP method name; anything but `GET` is treated as an upload
    pub fn from_http_method(method: &str) -> Self {
        if method.eq_ignore_ascii_case("GET") {
            PresignMethod::Get
        } else {
            PresignMethod::Put
        }
    }

    /// HTTP method name
    pub fn as_str(&self) -> &'static str {
        match self {
            PresignMethod::Get => "GET",
            PresignMethod::Put => "PUT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_etag() {
        assert_eq!(normalize_etag("\"abc123\""), "abc123");
        assert_eq!(normalize_etag("abc123"), "abc123");
        assert_eq!(normalize_etag(""), "");
    }

    #[test]
    fn test_record_builder() {
        let record = ObjectRecord::new("docs/readme.txt", 42).with_etag("\"e1\"");
        assert_eq!(record.key, "docs/readme.txt");
        assert_eq!(record.size, 42);
        assert_eq!(record.etag, "e1");
        assert!(record.metadata.is_empty());
    }

    #[test]
    fn test_inferred_content_type() {
        let record = ObjectRecord::new("photo.jpeg", 1).with_inferred_content_type();
        assert_eq!(record.content_type.as_deref(), Some("image/jpeg"));

        let record = ObjectRecord::new("photo.jpeg", 1)
            .with_content_type("application/x-custom")
            .with_inferred_content_type();
        assert_eq!(record.content_type.as_deref(), Some("application/x-custom"));

        let record = ObjectRecord::new("mystery", 1).with_inferred_content_type();
        assert_eq!(record.content_type, None);
    }

    #[test]
    fn test_presign_method() {
        assert_eq!(PresignMethod::from_http_method("GET"), PresignMethod::Get);
        assert_eq!(PresignMethod::from_http_method("get"), PresignMethod::Get);
        assert_eq!(PresignMethod::from_http_method("PUT"), PresignMethod::Put);
        assert_eq!(PresignMethod::from_http_method("POST"), PresignMethod::Put);
        assert_eq!(PresignMethod::default().as_str(), "GET");
    }
}
