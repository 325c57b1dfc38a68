//! Object store connection configuration
//!
//! The validated counterpart of [`StorageSettings`]: built once by the
//! selector, immutable afterwards.

use crate::config::{AddressingStyle, AuthType, StorageSettings, DEFAULT_REGION};
use crate::config::{ENV_ACCESS_KEY, ENV_AUTH_TYPE, ENV_SECRET_KEY};
use crate::error::{StorageError, StorageResult};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Static access key / secret key pair
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Access key ID
    pub access_key: String,
    /// Secret access key
    pub secret_key: SecretString,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: SecretString::new(secret_key.into().into_boxed_str()),
        }
    }
}

/// Connection settings for an S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Endpoint URL (e.g. `https://<account>.blob.netapp.azure.com`)
    pub endpoint: Url,

    /// Key credentials
    pub credentials: Credentials,

    /// Bucket addressing style
    pub addressing_style: AddressingStyle,

    /// Region placeholder
    pub region: String,

    /// Verify TLS certificates
    pub verify_ssl: bool,

    /// Per-operation timeout
    pub timeout: Duration,
}

impl ObjectStoreConfig {
    /// Create a config with defaults (path-style, placeholder region, 5 minute timeout)
    pub fn new(endpoint: &str, credentials: Credentials) -> StorageResult<Self> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            credentials,
            addressing_style: AddressingStyle::Path,
            region: DEFAULT_REGION.to_string(),
            verify_ssl: true,
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECONDS),
        })
    }

    /// Builder pattern: set addressing style
    pub fn with_addressing_style(mut self, style: AddressingStyle) -> Self {
        self.addressing_style = style;
        self
    }

    /// Builder pattern: set region placeholder
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Builder pattern: set operation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate raw settings into a connection config
    ///
    /// Returns `Ok(None)` when no endpoint is configured. Returns a
    /// configuration error when an endpoint is present but the endpoint or
    /// the credentials are structurally invalid.
    pub fn from_settings(settings: &StorageSettings) -> StorageResult<Option<Self>> {
        let Some(endpoint) = settings.endpoint.as_deref().filter(|e| !e.trim().is_empty())
        else {
            return Ok(None);
        };

        match settings.auth_kind() {
            AuthType::Key => {}
            AuthType::ManagedIdentity => {
                return Err(StorageError::config(
                    "Managed identity authentication is not supported for the Object REST API; \
                     only 'key' authentication is supported",
                ))
            }
            AuthType::Other(other) => {
                return Err(StorageError::config(format!(
                    "Unsupported {} '{}': only 'key' authentication is supported",
                    ENV_AUTH_TYPE, other
                )))
            }
        }

        let credentials = match (present(&settings.access_key), present(&settings.secret_key)) {
            (Some(access_key), Some(secret_key)) => Credentials::new(access_key, secret_key),
            (Some(_), None) => {
                return Err(StorageError::config(format!(
                    "{} is set but {} is missing",
                    ENV_ACCESS_KEY, ENV_SECRET_KEY
                )))
            }
            (None, Some(_)) => {
                return Err(StorageError::config(format!(
                    "{} is set but {} is missing",
                    ENV_SECRET_KEY, ENV_ACCESS_KEY
                )))
            }
            (None, None) => {
                return Err(StorageError::config(format!(
                    "Key authentication requires {} and {}",
                    ENV_ACCESS_KEY, ENV_SECRET_KEY
                )))
            }
        };

        let config = Self::new(endpoint, credentials)?
            .with_addressing_style(settings.addressing_style)
            .with_region(settings.region.clone())
            .with_timeout(Duration::from_secs(settings.timeout_seconds));

        Ok(Some(Self {
            verify_ssl: settings.verify_ssl,
            ..config
        }))
    }

    /// Whether bucket names go in the URL path
    pub fn force_path_style(&self) -> bool {
        self.addressing_style == AddressingStyle::Path
    }
}

/// Blank values count as missing, whichever source the settings came from
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn parse_endpoint(endpoint: &str) -> StorageResult<Url> {
    let url = Url::parse(endpoint.trim())
        .map_err(|e| StorageError::config(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(StorageError::config(format!(
            "Invalid endpoint '{}': unsupported scheme '{}'",
            endpoint, other
        ))),
    }
}
