/*!
 * Configuration types for anf-storage
 */

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Storage backend selector variable (`anf`, `s3`, `memory`, anything else is another family)
pub const ENV_STORAGE_BACKEND: &str = "STORAGE_BACKEND";
/// Object REST API endpoint
pub const ENV_ENDPOINT: &str = "ANF_OBJECT_API_ENDPOINT";
/// S3 access key
pub const ENV_ACCESS_KEY: &str = "ANF_ACCESS_KEY";
/// S3 secret key
pub const ENV_SECRET_KEY: &str = "ANF_SECRET_KEY";
/// Authentication type (`key` or `managed_identity`)
pub const ENV_AUTH_TYPE: &str = "ANF_AUTH_TYPE";
/// TLS certificate verification toggle
pub const ENV_VERIFY_SSL: &str = "ANF_VERIFY_SSL";
/// Region placeholder required by S3 SDKs
pub const ENV_REGION: &str = "ANF_REGION";
/// Addressing style (`path` or `virtual`)
pub const ENV_ADDRESSING_STYLE: &str = "ANF_ADDRESSING_STYLE";
/// Operation timeout in seconds
pub const ENV_TIMEOUT_SECONDS: &str = "ANF_TIMEOUT_SECONDS";

/// Region sent to the SDK; ANF ignores it
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default operation timeout (5 minutes)
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Which storage family the settings select
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// S3-compatible object store (ANF Object REST API, MinIO, AWS S3)
    ObjectStore,

    /// Process-local in-memory store
    Memory,

    /// Some other storage family (e.g. `blob`); not handled here
    Other(String),
}

impl FromStr for BackendKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Ok(match normalized.as_str() {
            "anf" | "s3" => BackendKind::ObjectStore,
            "memory" => BackendKind::Memory,
            _ => BackendKind::Other(normalized),
        })
    }
}

/// Authentication scheme requested for the object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthType {
    /// Static access key / secret key pair
    Key,

    /// Azure AD managed identity (not supported by the Object REST API client)
    ManagedIdentity,

    /// Unrecognised value
    Other(String),
}

impl FromStr for AuthType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Ok(match normalized.as_str() {
            "" | "key" => AuthType::Key,
            "managed_identity" => AuthType::ManagedIdentity,
            _ => AuthType::Other(normalized),
        })
    }
}

/// URL addressing style for bucket requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressingStyle {
    /// `https://endpoint/bucket/key` (required by ANF)
    #[default]
    Path,

    /// `https://bucket.endpoint/key`
    Virtual,
}

impl FromStr for AddressingStyle {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "path" => Ok(AddressingStyle::Path),
            "virtual" => Ok(AddressingStyle::Virtual),
            other => Err(StorageError::config(format!(
                "Invalid addressing style '{}': expected 'path' or 'virtual'",
                other
            ))),
        }
    }
}

/// Raw storage settings, as read from the environment or a manifest
///
/// Nothing is validated here; [`crate::BackendSelector`] decides whether the
/// settings describe a usable backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Backend family selector
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Object REST API endpoint URL
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key for key authentication
    #[serde(default)]
    pub access_key: Option<String>,

    /// Secret key for key authentication
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Authentication type
    #[serde(default = "default_auth_type")]
    pub auth_type: String,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    /// Region placeholder
    #[serde(default = "default_region")]
    pub region: String,

    /// Addressing style
    #[serde(default)]
    pub addressing_style: AddressingStyle,

    /// Operation timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_backend() -> String {
    "blob".to_string()
}

fn default_auth_type() -> String {
    "key".to_string()
}

fn default_true() -> bool {
    true
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            auth_type: default_auth_type(),
            verify_ssl: true,
            region: default_region(),
            addressing_style: AddressingStyle::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("StorageSettings")
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("access_key", &redact(&self.access_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("auth_type", &self.auth_type)
            .field("verify_ssl", &self.verify_ssl)
            .field("region", &self.region)
            .field("addressing_style", &self.addressing_style)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl StorageSettings {
    /// Settings selecting the S3-compatible family with key authentication
    pub fn object_store(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            backend: "anf".to_string(),
            endpoint: Some(endpoint.into()),
            access_key: Some(access_key.into()),
            secret_key: Some(secret_key.into()),
            ..Default::default()
        }
    }

    /// Read settings from the process environment
    ///
    /// Call this once at startup and pass the result around; nothing else in
    /// the crate reads environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build settings from explicit key/value pairs using the environment variable names
    ///
    /// Malformed object store tunables (`ANF_VERIFY_SSL`, `ANF_ADDRESSING_STYLE`,
    /// `ANF_TIMEOUT_SECONDS`) are only an error when `STORAGE_BACKEND` selects
    /// the object store; otherwise they are logged and left at their defaults.
    pub fn from_vars<I, K, V>(vars: I) -> StorageResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut settings = Self::default();
        let mut invalid: Vec<StorageError> = Vec::new();

        for (key, value) in vars {
            let value: String = value.into();
            match key.as_ref() {
                ENV_STORAGE_BACKEND => settings.backend = value,
                ENV_ENDPOINT => settings.endpoint = non_blank(value),
                ENV_ACCESS_KEY => settings.access_key = non_blank(value),
                ENV_SECRET_KEY => settings.secret_key = non_blank(value),
                ENV_AUTH_TYPE => settings.auth_type = value,
                ENV_VERIFY_SSL => match parse_bool(ENV_VERIFY_SSL, &value) {
                    Ok(verify) => settings.verify_ssl = verify,
                    Err(e) => invalid.push(e),
                },
                ENV_REGION => {
                    if let Some(region) = non_blank(value) {
                        settings.region = region;
                    }
                }
                ENV_ADDRESSING_STYLE => match value.parse() {
                    Ok(style) => settings.addressing_style = style,
                    Err(e) => invalid.push(e),
                },
                ENV_TIMEOUT_SECONDS => match value.trim().parse() {
                    Ok(seconds) => settings.timeout_seconds = seconds,
                    Err(_) => invalid.push(StorageError::config(format!(
                        "{} must be a whole number of seconds, got '{}'",
                        ENV_TIMEOUT_SECONDS, value
                    ))),
                },
                _ => {}
            }
        }

        if let Some(first) = invalid.into_iter().next() {
            if settings.backend_kind() == BackendKind::ObjectStore {
                return Err(first);
            }
            tracing::warn!(
                backend = %settings.backend,
                error = %first,
                "Ignoring malformed object store setting for another storage backend"
            );
        }

        Ok(settings)
    }

    /// Parse settings from a TOML manifest
    pub fn from_toml_str(contents: &str) -> StorageResult<Self> {
        toml::from_str(contents)
            .map_err(|e| StorageError::config(format!("Invalid storage manifest: {}", e)))
    }

    /// Parse settings from a JSON manifest
    ///
    /// Accepts the flat field layout of [`from_toml_str`](Self::from_toml_str)
    /// as well as the plugin manifest layout, where credentials sit in a nested
    /// `auth` block and `"type": "anf_storage"` selects the object store:
    ///
    /// ```json
    /// {
    ///   "type": "anf_storage",
    ///   "endpoint": "https://<account>.blob.netapp.azure.com",
    ///   "auth": { "type": "key", "access_key": "...", "secret_key": "..." }
    /// }
    /// ```
    pub fn from_json_str(contents: &str) -> StorageResult<Self> {
        let manifest: JsonManifest = serde_json::from_str(contents)
            .map_err(|e| StorageError::config(format!("Invalid storage manifest: {}", e)))?;

        let mut settings = manifest.settings;
        if manifest.plugin_type.as_deref() == Some(PLUGIN_MANIFEST_TYPE) {
            settings.backend = "anf".to_string();
        }
        if let Some(auth) = manifest.auth {
            if let Some(auth_type) = auth.auth_type {
                settings.auth_type = auth_type;
            }
            settings.access_key = auth.access_key.or(settings.access_key);
            settings.secret_key = auth.secret_key.or(settings.secret_key);
        }

        Ok(settings)
    }

    /// Parsed backend family
    pub fn backend_kind(&self) -> BackendKind {
        match self.backend.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }

    /// Parsed authentication type
    pub fn auth_kind(&self) -> AuthType {
        match self.auth_type.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

/// Plugin manifest `type` that selects the object store
const PLUGIN_MANIFEST_TYPE: &str = "anf_storage";

#[derive(Deserialize)]
struct ManifestAuth {
    #[serde(rename = "type", default)]
    auth_type: Option<String>,
    #[serde(default)]
    access_key: Option<String>,
    #[serde(default)]
    secret_key: Option<String>,
}

#[derive(Deserialize)]
struct JsonManifest {
    #[serde(rename = "type", default)]
    plugin_type: Option<String>,
    #[serde(default)]
    auth: Option<ManifestAuth>,
    #[serde(flatten)]
    settings: StorageSettings,
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_bool(name: &str, value: &str) -> StorageResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(StorageError::config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = StorageSettings::default();
        assert_eq!(settings.backend, "blob");
        assert_eq!(settings.auth_type, "key");
        assert!(settings.verify_ssl);
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.addressing_style, AddressingStyle::Path);
        assert_eq!(settings.timeout_seconds, 300);
        assert_eq!(
            settings.backend_kind(),
            BackendKind::Other("blob".to_string())
        );
    }

    #[test]
    fn test_from_vars() {
        let settings = StorageSettings::from_vars([
            ("STORAGE_BACKEND", "ANF"),
            ("ANF_OBJECT_API_ENDPOINT", "https://acct.blob.netapp.azure.com"),
            ("ANF_ACCESS_KEY", "AKIA"),
            ("ANF_SECRET_KEY", "secret"),
            ("ANF_VERIFY_SSL", "false"),
            ("ANF_TIMEOUT_SECONDS", "30"),
            ("UNRELATED", "ignored"),
        ])
        .unwrap();

        assert_eq!(settings.backend_kind(), BackendKind::ObjectStore);
        assert_eq!(
            settings.endpoint.as_deref(),
            Some("https://acct.blob.netapp.azure.com")
        );
        assert_eq!(settings.access_key.as_deref(), Some("AKIA"));
        assert_eq!(settings.secret_key.as_deref(), Some("secret"));
        assert!(!settings.verify_ssl);
        assert_eq!(settings.timeout_seconds, 30);
        assert_eq!(settings.auth_kind(), AuthType::Key);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let settings = StorageSettings::from_vars([
            ("ANF_OBJECT_API_ENDPOINT", "  "),
            ("ANF_SECRET_KEY", ""),
            ("ANF_REGION", ""),
        ])
        .unwrap();
        assert!(settings.endpoint.is_none());
        assert!(settings.secret_key.is_none());
        assert_eq!(settings.region, DEFAULT_REGION);
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        let err = StorageSettings::from_vars([
            ("STORAGE_BACKEND", "anf"),
            ("ANF_TIMEOUT_SECONDS", "soon"),
        ])
        .unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));

        // Backend selected after the bad value still fails
        let err = StorageSettings::from_vars([
            ("ANF_VERIFY_SSL", "maybe"),
            ("STORAGE_BACKEND", "s3"),
        ])
        .unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));

        let err = StorageSettings::from_vars([
            ("STORAGE_BACKEND", "anf"),
            ("ANF_ADDRESSING_STYLE", "dns"),
        ])
        .unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_invalid_values_ignored_for_other_backends() {
        let settings = StorageSettings::from_vars([
            ("STORAGE_BACKEND", "blob"),
            ("ANF_TIMEOUT_SECONDS", "soon"),
            ("ANF_VERIFY_SSL", "maybe"),
            ("ANF_ADDRESSING_STYLE", "dns"),
        ])
        .unwrap();
        assert_eq!(settings.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert!(settings.verify_ssl);
        assert_eq!(settings.addressing_style, AddressingStyle::Path);

        // Unset backend defaults to blob
        assert!(StorageSettings::from_vars([("ANF_TIMEOUT_SECONDS", "soon")]).is_ok());
    }

    #[test]
    fn test_from_json_plugin_manifest() {
        let settings = StorageSettings::from_json_str(
            r#"{
                "name": "anf_storage_plugin",
                "type": "anf_storage",
                "endpoint": "https://acct.blob.netapp.azure.com",
                "auth": {
                    "type": "key",
                    "access_key": "AKIA",
                    "secret_key": "secret"
                },
                "metadata": {}
            }"#,
        )
        .unwrap();

        assert_eq!(settings.backend_kind(), BackendKind::ObjectStore);
        assert_eq!(
            settings.endpoint.as_deref(),
            Some("https://acct.blob.netapp.azure.com")
        );
        assert_eq!(settings.access_key.as_deref(), Some("AKIA"));
        assert_eq!(settings.secret_key.as_deref(), Some("secret"));
        assert_eq!(settings.auth_kind(), AuthType::Key);
        assert_eq!(settings.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_from_json_flat_manifest() {
        let settings = StorageSettings::from_json_str(
            r#"{"backend": "memory", "timeout_seconds": 12, "verify_ssl": false}"#,
        )
        .unwrap();
        assert_eq!(settings.backend_kind(), BackendKind::Memory);
        assert_eq!(settings.timeout_seconds, 12);
        assert!(!settings.verify_ssl);

        let settings = StorageSettings::from_json_str(
            r#"{"type": "anf_storage", "auth": {"type": "managed_identity"}}"#,
        )
        .unwrap();
        assert_eq!(settings.auth_kind(), AuthType::ManagedIdentity);

        assert!(StorageSettings::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("s3".parse::<BackendKind>().unwrap(), BackendKind::ObjectStore);
        assert_eq!(" Memory ".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!(
            "blob".parse::<BackendKind>().unwrap(),
            BackendKind::Other("blob".to_string())
        );
    }

    #[test]
    fn test_auth_type_parsing() {
        assert_eq!("KEY".parse::<AuthType>().unwrap(), AuthType::Key);
        assert_eq!(
            "managed_identity".parse::<AuthType>().unwrap(),
            AuthType::ManagedIdentity
        );
        assert_eq!(
            "oauth".parse::<AuthType>().unwrap(),
            AuthType::Other("oauth".to_string())
        );
    }

    #[test]
    fn test_from_toml_manifest() {
        let settings = StorageSettings::from_toml_str(
            r#"
            backend = "anf"
            endpoint = "https://acct.blob.netapp.azure.com"
            access_key = "AKIA"
            secret_key = "secret"
            addressing_style = "virtual"
            "#,
        )
        .unwrap();

        assert_eq!(settings.backend_kind(), BackendKind::ObjectStore);
        assert_eq!(settings.addressing_style, AddressingStyle::Virtual);
        assert_eq!(settings.auth_type, "key");
        assert_eq!(settings.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let settings = StorageSettings::object_store("https://example.com", "AKIA", "hunter2");
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("AKIA"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
