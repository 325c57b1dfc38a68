//! Object store client abstraction
//!
//! This module provides the narrow client layer the storage facade talks to:
//! one async trait, [`ObjectStoreClient`], with an S3-compatible
//! implementation (Azure NetApp Files Object REST API and friends) and an
//! in-memory implementation for tests and local development.
//!
//! # Features
//!
//! - **Async-first design**: All operations use `async/await` with Tokio runtime
//! - **Trait-based abstraction**: `ObjectStoreClient` for uniform access patterns
//! - **Native error codes**: failures keep the backend's own code next to a coarse [`ErrorKind`]
//! - **Security**: Secure credential handling with `secrecy` crate
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "s3-native")]
//! # {
//! use anf_storage::backend::{Credentials, ObjectStoreClient, ObjectStoreConfig, S3ObjectClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ObjectStoreConfig::new(
//!         "https://account.blob.netapp.azure.com",
//!         Credentials::new("ACCESS", "SECRET"),
//!     )?;
//!     let client = S3ObjectClient::connect(config).await?;
//!
//!     for record in client.list_objects("data", None, Some(10)).await? {
//!         println!("{}: {} bytes", record.key, record.size);
//!     }
//!     Ok(())
//! }
//! # }
//! ```
//!
//! [`ErrorKind`]: crate::error::ErrorKind

pub mod config;
pub mod memory;
pub mod types;

#[cfg(feature = "s3-native")]
mod s3;

pub use config::{Credentials, ObjectStoreConfig};
pub use memory::InMemoryClient;
pub use types::{normalize_etag, ObjectRecord, PresignMethod, PutOptions, UploadResult};

#[cfg(feature = "s3-native")]
pub use s3::S3ObjectClient;

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Client trait for S3-compatible object stores
///
/// Each method maps onto a single backend call, except [`list_objects`] which
/// follows continuation tokens. No retries or caching happen at this layer.
///
/// # Thread Safety
///
/// Implementors must be `Send + Sync`; the facade shares one client behind an
/// `Arc` across concurrent reads.
///
/// [`list_objects`]: ObjectStoreClient::list_objects
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// List bucket names in backend order
    async fn list_buckets(&self) -> StorageResult<Vec<String>>;

    /// List objects in a bucket
    ///
    /// # Arguments
    ///
    /// * `bucket` - Bucket to list
    /// * `prefix` - Only return keys starting with this prefix
    /// * `max_keys` - Stop after this many records (`None` lists everything)
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if the bucket does not exist.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: Option<usize>,
    ) -> StorageResult<Vec<ObjectRecord>>;

    /// Fetch metadata for a single object
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if the bucket or the key does not exist.
    async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectRecord>;

    /// Fetch the full body of an object
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Bytes>;

    /// Store an object, replacing any existing object under the same key
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: PutOptions,
    ) -> StorageResult<UploadResult>;

    /// Delete an object
    ///
    /// Deleting a key that does not exist succeeds, matching S3.
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Create a bucket
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` error if the bucket exists.
    async fn create_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// Produce a time-limited URL for downloading or uploading one object
    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
        method: PresignMethod,
    ) -> StorageResult<String>;

    /// Check whether an object exists
    ///
    /// The default implementation issues a metadata lookup and treats a
    /// `NotFound` failure as `false`. Any other failure is returned.
    async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        match self.head_object(bucket, key).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Backend name used in logs and error messages
    fn backend_name(&self) -> &str;
}
