//! S3-compatible client (Azure NetApp Files Object REST API)
//!
//! Built on the AWS SDK for Rust with static key credentials, a custom
//! endpoint and path-style addressing. Signing and retries stay inside the SDK.

use super::config::ObjectStoreConfig;
use super::types::{normalize_etag, ObjectRecord, PresignMethod, PutOptions, UploadResult};
use super::ObjectStoreClient;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as AwsS3Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use std::time::{Duration, SystemTime};

const BACKEND: &str = "s3";

/// Largest page ListObjectsV2 returns per request
const LIST_PAGE_SIZE: usize = 1000;

/// S3-compatible object store client
///
/// # Example
///
/// ```no_run
/// use anf_storage::backend::{Credentials, ObjectStoreClient, ObjectStoreConfig, S3ObjectClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ObjectStoreConfig::new(
///         "https://account.blob.netapp.azure.com",
///         Credentials::new("ACCESS", "SECRET"),
///     )?;
///     let client = S3ObjectClient::connect(config).await?;
///     println!("{:?}", client.list_buckets().await?);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct S3ObjectClient {
    client: AwsS3Client,
    config: ObjectStoreConfig,
}

impl S3ObjectClient {
    /// Build an SDK client for the configured endpoint
    ///
    /// No request is sent; connectivity problems surface on the first operation.
    pub async fn connect(config: ObjectStoreConfig) -> StorageResult<Self> {
        if !config.verify_ssl {
            tracing::warn!(
                endpoint = %config.endpoint,
                "TLS verification cannot be disabled with the rustls connector; certificates will still be verified"
            );
        }

        let client = Self::build_aws_client(&config).await;
        tracing::debug!(
            endpoint = %config.endpoint,
            region = %config.region,
            path_style = config.force_path_style(),
            "S3 client initialized"
        );

        Ok(Self { client, config })
    }

    async fn build_aws_client(config: &ObjectStoreConfig) -> AwsS3Client {
        let region_provider = RegionProviderChain::first_try(Region::new(config.region.clone()));

        let credentials = Credentials::new(
            config.credentials.access_key.clone(),
            config.credentials.secret_key.expose_secret().to_string(),
            None,
            None,
            "anf-storage-static",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .credentials_provider(credentials)
            .load()
            .await;

        let timeout_config = aws_sdk_s3::config::timeout::TimeoutConfig::builder()
            .operation_timeout(config.timeout)
            .build();

        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .endpoint_url(config.endpoint.as_str().trim_end_matches('/'))
            .force_path_style(config.force_path_style())
            .timeout_config(timeout_config)
            .build();

        AwsS3Client::from_conf(s3_config)
    }

    /// Connection settings this client was built with
    pub fn config(&self) -> &ObjectStoreConfig {
        &self.config
    }

    /// Underlying AWS SDK client
    pub fn aws_client(&self) -> &AwsS3Client {
        &self.client
    }
}

/// Translate an SDK failure, keeping the service's native error code
fn map_sdk_error<E>(operation: &str, error: SdkError<E>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match &error {
        SdkError::ServiceError(ctx) => {
            let status = ctx.raw().status().as_u16();
            let code = ctx
                .err()
                .code()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            let message = ctx
                .err()
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&error).to_string());
            StorageError::backend(BACKEND, code, format!("{}: {}", operation, message), Some(status))
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => StorageError::Unavailable {
            backend: BACKEND.to_string(),
            message: format!("{}: {}", operation, DisplayErrorContext(&error)),
        },
        _ => StorageError::backend(
            BACKEND,
            "Unknown",
            format!("{}: {}", operation, DisplayErrorContext(&error)),
            None,
        ),
    }
}

fn to_utc(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    SystemTime::try_from(*dt).ok().map(DateTime::<Utc>::from)
}

#[async_trait]
impl ObjectStoreClient for S3ObjectClient {
    #[tracing::instrument(skip(self), fields(otel.kind = "client", backend = "s3"))]
    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_sdk_error("ListBuckets", e))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    #[tracing::instrument(skip(self), fields(otel.kind = "client", backend = "s3"))]
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: Option<usize>,
    ) -> StorageResult<Vec<ObjectRecord>> {
        let limit = max_keys.unwrap_or(usize::MAX);
        let mut records = Vec::new();
        let mut continuation_token: Option<String> = None;

        while records.len() < limit {
            let page_size = (limit - records.len()).min(LIST_PAGE_SIZE);
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .max_keys(page_size as i32);

            if let Some(prefix) = prefix {
                request = request.prefix(prefix);
            }
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| map_sdk_error("ListObjectsV2", e))?;

            records.extend(response.contents().iter().filter_map(|obj| {
                let key = obj.key()?;
                let mut record = ObjectRecord::new(key, obj.size().unwrap_or(0).max(0) as u64)
                    .with_etag(obj.e_tag().unwrap_or_default());
                record.last_modified = obj.last_modified().and_then(to_utc);
                Some(record)
            }));

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        records.truncate(limit);
        tracing::debug!(count = records.len(), "Listed objects");
        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(otel.kind = "client", backend = "s3"))]
    async fn head_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectRecord> {
        let response = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error("HeadObject", e))?;

        let mut record = ObjectRecord::new(key, response.content_length().unwrap_or(0).max(0) as u64)
            .with_etag(response.e_tag().unwrap_or_default());
        record.last_modified = response.last_modified().and_then(to_utc);
        record.content_type = response.content_type().map(str::to_string);
        record.metadata = response.metadata().cloned().unwrap_or_default();
        record.version_id = response.version_id().map(str::to_string);

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(otel.kind = "client", backend = "s3"))]
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error("GetObject", e))?;

        let body = response.body.collect().await.map_err(|e| StorageError::Unavailable {
            backend: BACKEND.to_string(),
            message: format!("GetObject body: {}", e),
        })?;

        Ok(body.into_bytes())
    }

    #[tracing::instrument(skip(self, data, options), fields(otel.kind = "client", backend = "s3", size = data.len()))]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: PutOptions,
    ) -> StorageResult<UploadResult> {
        let response = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_content_type(options.content_type)
            .set_metadata(options.metadata)
            .send()
            .await
            .map_err(|e| map_sdk_error("PutObject", e))?;

        Ok(UploadResult {
            bucket: bucket.to_string(),
            key: key.to_string(),
            etag: normalize_etag(response.e_tag().unwrap_or_default()),
            version_id: response.version_id().map(str::to_string),
        })
    }

    #[tracing::instrument(skip(self), fields(otel.kind = "client", backend = "s3"))]
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteObject", e))?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(otel.kind = "client", backend = "s3"))]
    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateBucket", e))?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(otel.kind = "client", backend = "s3"))]
    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
        method: PresignMethod,
    ) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::backend(BACKEND, "InvalidPresignExpiry", e.to_string(), None))?;

        let request = match method {
            PresignMethod::Get => self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| map_sdk_error("PresignGetObject", e))?,
            PresignMethod::Put => self
                .client
                .put_object()
                .bucket(bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| map_sdk_error("PresignPutObject", e))?,
        };

        Ok(request.uri().to_string())
    }

    fn backend_name(&self) -> &str {
        BACKEND
    }
}
