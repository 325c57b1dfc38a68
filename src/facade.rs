//! Storage facade
//!
//! One object exposing two families of operations over a single
//! [`ObjectStoreClient`]:
//!
//! - **Display operations** (`list_buckets`, `list_objects`,
//!   `get_object_metadata`, `get_object_content`, `iterate_objects_in_bucket`)
//!   never return an error. Failures are rendered inline so a tool-calling
//!   agent always receives a value.
//! - **Service operations** (`upload_file`, `upload_bytes`, `download_file`,
//!   `delete_file`, `object_exists`, `create_bucket`, `generate_presigned_url`,
//!   ...) return [`StorageResult`] and propagate failures.
//!
//! The [`BlobStorage`] trait offers the same display operations under
//! container/blob names.

use crate::backend::{ObjectRecord, ObjectStoreClient, PresignMethod, PutOptions, UploadResult};
use crate::content;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Key under which `iterate_objects_in_bucket` reports a listing failure
pub const LISTING_ERROR_KEY: &str = "_error";

/// Default lifetime of a presigned URL
pub const DEFAULT_PRESIGN_EXPIRATION: Duration = Duration::from_secs(3600);

/// Default number of concurrent object reads during bucket iteration
pub const DEFAULT_READ_CONCURRENCY: usize = 4;

/// Tuning knobs for the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacadeOptions {
    /// Concurrent object reads in `iterate_objects_in_bucket` (1 = sequential)
    pub read_concurrency: usize,

    /// Cap on keys returned by display listings (`None` = all)
    pub listing_limit: Option<usize>,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self {
            read_concurrency: DEFAULT_READ_CONCURRENCY,
            listing_limit: None,
        }
    }
}

impl FacadeOptions {
    /// Builder pattern: set read concurrency (clamped to at least 1)
    pub fn with_read_concurrency(mut self, read_concurrency: usize) -> Self {
        self.read_concurrency = read_concurrency.max(1);
        self
    }

    /// Builder pattern: cap display listings
    pub fn with_listing_limit(mut self, limit: usize) -> Self {
        self.listing_limit = Some(limit);
        self
    }
}

/// Object metadata as shown to display callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadataView {
    /// Stored content type, or the one inferred from the key
    pub content_type: Option<String>,

    /// Size in bytes
    pub content_length: u64,

    /// RFC 3339 modification time
    pub last_modified: Option<String>,

    /// ETag with quoting stripped
    pub etag: String,

    /// User metadata
    pub metadata: HashMap<String, String>,
}

impl From<ObjectRecord> for ObjectMetadataView {
    fn from(record: ObjectRecord) -> Self {
        let record = record.with_inferred_content_type();
        Self {
            content_type: record.content_type,
            content_length: record.size,
            last_modified: record.last_modified.map(|dt| dt.to_rfc3339()),
            etag: record.etag,
            metadata: record.metadata,
        }
    }
}

/// Result of a display metadata lookup: the metadata or an `{"error": ...}` mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataView {
    /// Lookup succeeded
    Found(ObjectMetadataView),

    /// Lookup failed; `error` is the rendered failure
    Error { error: String },
}

impl MetadataView {
    /// Check if this view carries an error
    pub fn is_error(&self) -> bool {
        matches!(self, MetadataView::Error { .. })
    }

    /// Metadata, if the lookup succeeded
    pub fn found(&self) -> Option<&ObjectMetadataView> {
        match self {
            MetadataView::Found(view) => Some(view),
            MetadataView::Error { .. } => None,
        }
    }

    /// JSON mapping of this view
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
    }
}

fn read_error(err: &StorageError) -> String {
    format!("[Error reading object: {}]", err)
}

/// Uniform storage facade over one object store client
#[derive(Clone)]
pub struct StorageFacade {
    client: Arc<dyn ObjectStoreClient>,
    options: FacadeOptions,
}

impl std::fmt::Debug for StorageFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageFacade")
            .field("backend", &self.client.backend_name())
            .field("options", &self.options)
            .finish()
    }
}

impl StorageFacade {
    /// Wrap a shared client with default options
    pub fn new(client: Arc<dyn ObjectStoreClient>) -> Self {
        Self::with_options(client, FacadeOptions::default())
    }

    /// Wrap a shared client with explicit options
    pub fn with_options(client: Arc<dyn ObjectStoreClient>, options: FacadeOptions) -> Self {
        Self { client, options }
    }

    /// Wrap an owned client
    pub fn from_client<C: ObjectStoreClient + 'static>(client: C) -> Self {
        Self::new(Arc::new(client))
    }

    /// Underlying client
    pub fn client(&self) -> &Arc<dyn ObjectStoreClient> {
        &self.client
    }

    /// Facade options
    pub fn options(&self) -> FacadeOptions {
        self.options
    }

    /// Backend name used in logs
    pub fn backend_name(&self) -> &str {
        self.client.backend_name()
    }

    // ---------------------------------------------------------------------
    // Display operations
    // ---------------------------------------------------------------------

    /// List bucket names, or a single error line
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn list_buckets(&self) -> Vec<String> {
        match self.client.list_buckets().await {
            Ok(buckets) => buckets,
            Err(e) => {
                tracing::warn!(error = %e, "Bucket listing failed");
                vec![format!("Error listing buckets: {}", e)]
            }
        }
    }

    /// List object keys in a bucket, or a single error line
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn list_objects(&self, bucket: &str) -> Vec<String> {
        match self
            .client
            .list_objects(bucket, None, self.options.listing_limit)
            .await
        {
            Ok(records) => records.into_iter().map(|r| r.key).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Object listing failed");
                vec![format!("Error listing objects: {}", e)]
            }
        }
    }

    /// Object metadata, or an error mapping
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn get_object_metadata(&self, bucket: &str, key: &str) -> MetadataView {
        match self.client.head_object(bucket, key).await {
            Ok(record) => MetadataView::Found(record.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Metadata lookup failed");
                MetadataView::Error {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Object content rendered for display (text, base64 image, or a binary marker)
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn get_object_content(&self, bucket: &str, key: &str) -> String {
        match self.client.get_object(bucket, key).await {
            Ok(data) => content::render_object(key, &data),
            Err(e) => {
                tracing::warn!(error = %e, "Object read failed");
                read_error(&e)
            }
        }
    }

    /// Render every object in a bucket
    ///
    /// A failed read maps that key to an error string and iteration continues.
    /// A failed listing yields a map holding only [`LISTING_ERROR_KEY`].
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn iterate_objects_in_bucket(&self, bucket: &str) -> HashMap<String, String> {
        let mut result = HashMap::new();

        let records = match self
            .client
            .list_objects(bucket, None, self.options.listing_limit)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Object listing failed");
                result.insert(
                    LISTING_ERROR_KEY.to_string(),
                    format!("Error listing objects: {}", e),
                );
                return result;
            }
        };

        let total = records.len();
        let client = &self.client;
        let mut reads = stream::iter(records)
            .map(|record| async move {
                let rendered = match client.get_object(bucket, &record.key).await {
                    Ok(data) => content::render_object(&record.key, &data),
                    Err(e) => {
                        tracing::warn!(key = %record.key, error = %e, "Object read failed");
                        read_error(&e)
                    }
                };
                (record.key, rendered)
            })
            .buffer_unordered(self.options.read_concurrency.max(1));

        while let Some((key, rendered)) = reads.next().await {
            result.insert(key, rendered);
        }

        tracing::debug!(objects = total, "Iterated bucket");
        result
    }

    // ---------------------------------------------------------------------
    // Service operations
    // ---------------------------------------------------------------------

    /// Upload a local file
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::LocalFileNotFound`] if `local_path` does not
    /// exist, or the backend failure.
    #[tracing::instrument(skip(self, metadata), fields(backend = self.client.backend_name(), path = %local_path.display()))]
    pub async fn upload_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> StorageResult<UploadResult> {
        let data = match tokio::fs::read(local_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::LocalFileNotFound(local_path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };

        let result = self.put(bucket, key, Bytes::from(data), metadata).await?;
        tracing::info!(etag = %result.etag, "Uploaded file");
        Ok(result)
    }

    /// Upload an in-memory buffer
    #[tracing::instrument(skip(self, data, metadata), fields(backend = self.client.backend_name()))]
    pub async fn upload_bytes(
        &self,
        data: impl Into<Bytes>,
        bucket: &str,
        key: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> StorageResult<UploadResult> {
        let result = self.put(bucket, key, data.into(), metadata).await?;
        tracing::info!(etag = %result.etag, "Uploaded bytes");
        Ok(result)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        metadata: Option<HashMap<String, String>>,
    ) -> StorageResult<UploadResult> {
        let mut options = PutOptions::new();
        options.content_type = content::classify(key).mime;
        options.metadata = metadata.filter(|m| !m.is_empty());

        self.client
            .put_object(bucket, key, data, options)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Upload failed"))
    }

    /// Download an object, optionally writing it to `local_path`
    ///
    /// Parent directories of `local_path` are created as needed.
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn download_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: Option<&Path>,
    ) -> StorageResult<Bytes> {
        let data = self.client.get_object(bucket, key).await.inspect_err(|e| {
            if e.is_not_found() {
                tracing::error!("Object not found");
            } else {
                tracing::error!(error = %e, "Download failed");
            }
        })?;

        if let Some(path) = local_path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, &data).await?;
            tracing::info!(path = %path.display(), bytes = data.len(), "Downloaded object to file");
        } else {
            tracing::info!(bytes = data.len(), "Downloaded object");
        }

        Ok(data)
    }

    /// Delete an object; `Ok(true)` on success
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn delete_file(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        self.client
            .delete_object(bucket, key)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Delete failed"))?;
        tracing::info!("Deleted object");
        Ok(true)
    }

    /// Check whether an object exists; a not-found failure is `Ok(false)`
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        self.client.object_exists(bucket, key).await
    }

    /// Create a bucket; an existing bucket also yields `Ok(true)`
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn create_bucket(&self, bucket: &str) -> StorageResult<bool> {
        match self.client.create_bucket(bucket).await {
            Ok(()) => {
                tracing::info!("Created bucket");
                Ok(true)
            }
            Err(e) if e.is_already_exists() => {
                tracing::warn!("Bucket already exists");
                Ok(true)
            }
            Err(e) => {
                tracing::error!(error = %e, "Bucket creation failed");
                Err(e)
            }
        }
    }

    /// Time-limited URL for downloading (`Get`) or uploading (`Put`) one object
    ///
    /// `expiration` defaults to [`DEFAULT_PRESIGN_EXPIRATION`].
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn generate_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expiration: Option<Duration>,
        method: PresignMethod,
    ) -> StorageResult<String> {
        let url = self
            .client
            .presign(
                bucket,
                key,
                expiration.unwrap_or(DEFAULT_PRESIGN_EXPIRATION),
                method,
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Presigning failed"))?;
        tracing::debug!("Generated presigned URL");
        Ok(url)
    }

    /// Full object records; failures propagate
    #[tracing::instrument(skip(self), fields(backend = self.client.backend_name()))]
    pub async fn list_object_records(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: Option<usize>,
    ) -> StorageResult<Vec<ObjectRecord>> {
        let records = self.client.list_objects(bucket, prefix, max_keys).await?;
        tracing::debug!(count = records.len(), "Listed object records");
        Ok(records)
    }

    /// Object metadata; failures propagate
    pub async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectRecord> {
        Ok(self
            .client
            .head_object(bucket, key)
            .await?
            .with_inferred_content_type())
    }

    /// Bucket names; failures propagate
    pub async fn bucket_names(&self) -> StorageResult<Vec<String>> {
        self.client.list_buckets().await
    }
}

/// Container/blob vocabulary for the display operations
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Same as [`StorageFacade::list_buckets`]
    async fn list_containers(&self) -> Vec<String>;

    /// Same as [`StorageFacade::list_objects`]
    async fn list_blobs(&self, container: &str) -> Vec<String>;

    /// Same as [`StorageFacade::get_object_metadata`]
    async fn get_blob_metadata(&self, container: &str, blob: &str) -> MetadataView;

    /// Same as [`StorageFacade::get_object_content`]
    async fn get_blob_content(&self, container: &str, blob: &str) -> String;

    /// Same as [`StorageFacade::iterate_objects_in_bucket`]
    async fn iterate_blobs_in_container(&self, container: &str) -> HashMap<String, String>;
}

#[async_trait]
impl BlobStorage for StorageFacade {
    async fn list_containers(&self) -> Vec<String> {
        self.list_buckets().await
    }

    async fn list_blobs(&self, container: &str) -> Vec<String> {
        self.list_objects(container).await
    }

    async fn get_blob_metadata(&self, container: &str, blob: &str) -> MetadataView {
        self.get_object_metadata(container, blob).await
    }

    async fn get_blob_content(&self, container: &str, blob: &str) -> String {
        self.get_object_content(container, blob).await
    }

    async fn iterate_blobs_in_container(&self, container: &str) -> HashMap<String, String> {
        self.iterate_objects_in_bucket(container).await
    }
}
