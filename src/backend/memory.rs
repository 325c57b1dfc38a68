//! In-memory object store for tests and local development
//!
//! Behaves like a small S3: buckets must exist before objects are written,
//! failures carry S3 error codes, and deleting a missing key succeeds.

use super::types::{ObjectRecord, PresignMethod, PutOptions, UploadResult};
use super::ObjectStoreClient;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use url::Url;

const BACKEND: &str = "memory";

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    etag: String,
    last_modified: DateTime<Utc>,
    content_type: Option<String>,
    metadata: HashMap<String, String>,
}

impl StoredObject {
    fn record(&self, key: &str) -> ObjectRecord {
        let mut record = ObjectRecord::new(key, self.data.len() as u64)
            .with_etag(&self.etag)
            .with_last_modified(self.last_modified);
        record.content_type = self.content_type.clone();
        record.metadata = self.metadata.clone();
        record
    }
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    failing_reads: HashSet<(String, String)>,
    failing_listings: HashSet<String>,
    conflicting_creates: HashSet<String>,
}

/// In-memory [`ObjectStoreClient`]
///
/// Cloning the client shares the underlying store.
///
/// # Example
///
/// ```rust
/// use anf_storage::backend::{InMemoryClient, ObjectStoreClient, PutOptions};
/// use bytes::Bytes;
///
/// # #[tokio::main]
/// # async fn main() -> anf_storage::StorageResult<()> {
/// let client = InMemoryClient::new();
/// client.create_bucket("docs").await?;
/// client.put_object("docs", "a.txt", Bytes::from_static(b"hi"), PutOptions::default()).await?;
/// assert!(client.object_exists("docs", "a.txt").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryClient {
    state: Arc<RwLock<State>>,
}

impl InMemoryClient {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read (get or head) of one object fail with `AccessDenied`
    pub fn fail_reads_of(&self, bucket: &str, key: &str) {
        self.write()
            .failing_reads
            .insert((bucket.to_string(), key.to_string()));
    }

    /// Make every listing of one bucket fail with `ServiceUnavailable`
    pub fn fail_listing_of(&self, bucket: &str) {
        self.write().failing_listings.insert(bucket.to_string());
    }

    /// Make creating one bucket fail with `OperationAborted` (HTTP 409)
    pub fn fail_creation_of(&self, bucket: &str) {
        self.write().conflicting_creates.insert(bucket.to_string());
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        let mut state = self.write();
        state.failing_reads.clear();
        state.failing_listings.clear();
        state.conflicting_creates.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn no_such_bucket(bucket: &str) -> StorageError {
    StorageError::backend(
        BACKEND,
        "NoSuchBucket",
        format!("The specified bucket does not exist: {}", bucket),
        Some(404),
    )
}

fn read_denied(bucket: &str, key: &str) -> StorageError {
    StorageError::backend(
        BACKEND,
        "AccessDenied",
        format!("Access Denied: {}/{}", bucket, key),
        Some(403),
    )
}

impl State {
    fn bucket(&self, bucket: &str) -> StorageResult<&BTreeMap<String, StoredObject>> {
        self.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))
    }

    fn check_read(&self, bucket: &str, key: &str) -> StorageResult<()> {
        if self
            .failing_reads
            .contains(&(bucket.to_string(), key.to_string()))
        {
            return Err(read_denied(bucket, key));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryClient {
    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        Ok(self.read().buckets.keys().cloned().collect())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: Option<usize>,
    ) -> StorageResult<Vec<ObjectRecord>> {
        let state = self.read();
        if state.failing_listings.contains(bucket) {
            return Err(StorageError::backend(
                BACKEND,
                "ServiceUnavailable",
                format!("Listing of {} is unavailable", bucket),
                Some(503),
            ));
        }

        let prefix = prefix.unwrap_or("");
        let records = state
            .bucket(bucket)?
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .take(max_keys.unwrap_or(usize::MAX))
            .map(|(key, object)| object.record(key))
            .collect();

        Ok(records)
    }

    async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectRecord> {
        let state = self.read();
        state.check_read(bucket, key)?;
        state
            .bucket(bucket)?
            .get(key)
            .map(|object| object.record(key))
            .ok_or_else(|| StorageError::backend(BACKEND, "NotFound", "Not Found", Some(404)))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Bytes> {
        let state = self.read();
        state.check_read(bucket, key)?;
        state
            .bucket(bucket)?
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| {
                StorageError::backend(
                    BACKEND,
                    "NoSuchKey",
                    format!("The specified key does not exist: {}", key),
                    Some(404),
                )
            })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: PutOptions,
    ) -> StorageResult<UploadResult> {
        let etag = blake3::hash(&data).to_hex().to_string();
        let object = StoredObject {
            data,
            etag: etag.clone(),
            last_modified: Utc::now(),
            content_type: options.content_type,
            metadata: options.metadata.unwrap_or_default(),
        };

        let mut state = self.write();
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        objects.insert(key.to_string(), object);

        Ok(UploadResult {
            bucket: bucket.to_string(),
            key: key.to_string(),
            etag,
            version_id: None,
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let mut state = self.write();
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        objects.remove(key);
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut state = self.write();
        if state.conflicting_creates.contains(bucket) {
            return Err(StorageError::backend(
                BACKEND,
                "OperationAborted",
                format!("A conflicting operation is in progress on {}", bucket),
                Some(409),
            ));
        }
        if state.buckets.contains_key(bucket) {
            return Err(StorageError::backend(
                BACKEND,
                "BucketAlreadyOwnedByYou",
                format!("Bucket {} already exists and is owned by you", bucket),
                Some(409),
            ));
        }
        state.buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
        method: PresignMethod,
    ) -> StorageResult<String> {
        self.read().bucket(bucket)?;

        let mut url = Url::parse("memory://localhost/").map_err(|e| {
            StorageError::backend(BACKEND, "InvalidRequest", e.to_string(), None)
        })?;
        url.path_segments_mut()
            .map_err(|_| StorageError::backend(BACKEND, "InvalidRequest", "bad base URL", None))?
            .pop_if_empty()
            .push(bucket)
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair("method", method.as_str())
            .append_pair("expires_in", &expires_in.as_secs().to_string());

        Ok(url.to_string())
    }

    fn backend_name(&self) -> &str {
        BACKEND
    }
}
