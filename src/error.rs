/*!
 * Error types for anf-storage
 */

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Coarse classification of a storage failure
///
/// Callers pattern-match on this instead of string-matching native error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bucket or object does not exist
    NotFound,

    /// Bucket (or object, for exclusive writes) already exists
    AlreadyExists,

    /// Credentials rejected or access denied
    Forbidden,

    /// Transport failure, timeout, throttling or server-side fault
    BackendUnavailable,

    /// Invalid or incomplete configuration
    Configuration,

    /// Anything the backend reported that has no better category
    Unknown,
}

impl ErrorKind {
    /// Stable string name of this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::BackendUnavailable => "BackendUnavailable",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Unknown => "Unknown",
        }
    }

    /// Map a native S3 error code (or HTTP status) onto the taxonomy
    ///
    /// The error code wins; the HTTP status is only consulted when the code
    /// itself is not recognised. A bare 409 is not `AlreadyExists`: S3 also
    /// uses it for `BucketNotEmpty`, `OperationAborted` and
    /// `InvalidBucketState`.
    pub fn from_native_code(code: &str, status: Option<u16>) -> Self {
        match code {
            "NoSuchKey" | "NoSuchBucket" | "NotFound" | "NoSuchVersion" | "404" => {
                ErrorKind::NotFound
            }
            "BucketAlreadyExists" | "BucketAlreadyOwnedByYou" => ErrorKind::AlreadyExists,
            "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "Forbidden"
            | "403" => ErrorKind::Forbidden,
            "ServiceUnavailable" | "SlowDown" | "InternalError" | "RequestTimeout" | "500"
            | "503" => ErrorKind::BackendUnavailable,
            _ => match status {
                Some(404) => ErrorKind::NotFound,
                Some(401) | Some(403) => ErrorKind::Forbidden,
                Some(s) if s >= 500 => ErrorKind::BackendUnavailable,
                _ => ErrorKind::Unknown,
            },
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Fault reported by the backend, carrying its native error code
    #[error("{backend} error ({code}): {message}")]
    Backend {
        kind: ErrorKind,
        backend: String,
        code: String,
        message: String,
    },

    /// Request never produced a backend response (dispatch failure, timeout)
    #[error("{backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Local file passed to an upload does not exist
    #[error("Local file not found: {}", .0.display())]
    LocalFileNotFound(PathBuf),

    /// Local I/O error (upload source, download target)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Build a backend error, deriving its kind from the native code
    pub fn backend(
        backend: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        let code = code.into();
        StorageError::Backend {
            kind: ErrorKind::from_native_code(&code, status),
            backend: backend.into(),
            code,
            message: message.into(),
        }
    }

    /// Build a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        StorageError::Configuration(message.into())
    }

    /// Error kind of this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Backend { kind, .. } => *kind,
            StorageError::Unavailable { .. } => ErrorKind::BackendUnavailable,
            StorageError::Configuration(_) => ErrorKind::Configuration,
            StorageError::LocalFileNotFound(_) => ErrorKind::NotFound,
            StorageError::Io(e) => match e.kind() {
                io::ErrorKind::NotFound => ErrorKind::NotFound,
                io::ErrorKind::PermissionDenied => ErrorKind::Forbidden,
                io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
                _ => ErrorKind::Unknown,
            },
        }
    }

    /// Native backend error code, if the failure came from the backend
    pub fn native_code(&self) -> Option<&str> {
        match self {
            StorageError::Backend { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if this error indicates the bucket or object was not found
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error indicates the resource already exists
    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }

    /// Check if a caller may reasonably retry the operation
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Unavailable { .. } => true,
            StorageError::Backend { kind, .. } => *kind == ErrorKind::BackendUnavailable,
            StorageError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            ),
            StorageError::Configuration(_) | StorageError::LocalFileNotFound(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_code_mapping() {
        assert_eq!(ErrorKind::from_native_code("NoSuchKey", None), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_native_code("NoSuchBucket", None), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_native_code("404", None), ErrorKind::NotFound);
        assert_eq!(
            ErrorKind::from_native_code("BucketAlreadyOwnedByYou", None),
            ErrorKind::AlreadyExists
        );
        assert_eq!(ErrorKind::from_native_code("AccessDenied", None), ErrorKind::Forbidden);
        assert_eq!(
            ErrorKind::from_native_code("SlowDown", None),
            ErrorKind::BackendUnavailable
        );
        assert_eq!(ErrorKind::from_native_code("Weird", None), ErrorKind::Unknown);
    }

    #[test]
    fn test_status_fallback() {
        assert_eq!(ErrorKind::from_native_code("Weird", Some(404)), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_native_code("Weird", Some(403)), ErrorKind::Forbidden);
        assert_eq!(
            ErrorKind::from_native_code("Weird", Some(502)),
            ErrorKind::BackendUnavailable
        );
        // Code takes precedence over status
        assert_eq!(
            ErrorKind::from_native_code("AccessDenied", Some(404)),
            ErrorKind::Forbidden
        );
    }

    #[test]
    fn test_conflicts_other_than_existing_bucket() {
        for code in ["BucketNotEmpty", "OperationAborted", "InvalidBucketState", "409"] {
            assert_eq!(
                ErrorKind::from_native_code(code, Some(409)),
                ErrorKind::Unknown,
                "{} must not read as AlreadyExists",
                code
            );
        }
        assert_eq!(
            ErrorKind::from_native_code("BucketAlreadyExists", Some(409)),
            ErrorKind::AlreadyExists
        );
        assert!(!StorageError::backend("s3", "OperationAborted", "conflict", Some(409))
            .is_already_exists());
    }

    #[test]
    fn test_backend_error_keeps_native_code() {
        let err = StorageError::backend("s3", "NoSuchKey", "The specified key does not exist", None);
        assert!(err.is_not_found());
        assert_eq!(err.native_code(), Some("NoSuchKey"));
        assert_eq!(
            err.to_string(),
            "s3 error (NoSuchKey): The specified key does not exist"
        );
    }

    #[test]
    fn test_retryable() {
        let err = StorageError::Unavailable {
            backend: "s3".to_string(),
            message: "dispatch failure".to_string(),
        };
        assert!(err.is_retryable());

        let err = StorageError::backend("s3", "InternalError", "boom", Some(500));
        assert!(err.is_retryable());

        let err = StorageError::backend("s3", "AccessDenied", "no", Some(403));
        assert!(!err.is_retryable());

        assert!(!StorageError::config("bad").is_retryable());
    }

    #[test]
    fn test_kind_of_local_errors() {
        let err = StorageError::LocalFileNotFound(PathBuf::from("/missing"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Local file not found: /missing");

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: StorageError = io_err.into();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::Configuration.to_string(), "ConfigurationError");
        assert_eq!(ErrorKind::NotFound.code(), "NotFound");
    }
}
