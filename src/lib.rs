/*!
 * anf-storage - uniform object storage facade
 *
 * Exposes an S3-compatible object store (Azure NetApp Files Object REST API,
 * or any S3-compatible endpoint) through one facade with:
 * - Display operations that never fail (errors are rendered inline)
 * - Service operations that return typed errors
 * - Text / image / binary content rendering
 * - Backend selection from environment variables or a TOML manifest
 */

pub mod backend;
pub mod config;
pub mod content;
pub mod error;
pub mod facade;
pub mod logging;
pub mod selector;

// Re-export commonly used types
pub use backend::{
    InMemoryClient, ObjectRecord, ObjectStoreClient, ObjectStoreConfig, PresignMethod,
    UploadResult,
};
pub use config::{AddressingStyle, LogConfig, LogLevel, StorageSettings};
pub use content::{classify, render_object, ContentKind};
pub use error::{ErrorKind, StorageError, StorageResult};
pub use facade::{BlobStorage, FacadeOptions, MetadataView, ObjectMetadataView, StorageFacade};
pub use selector::BackendSelector;

#[cfg(feature = "s3-native")]
pub use backend::S3ObjectClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
