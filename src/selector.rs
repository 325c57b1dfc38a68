//! Backend selection
//!
//! Turns [`StorageSettings`] into a ready [`StorageFacade`], or `None` when
//! the settings select some other storage family (or this family is not
//! configured).

use crate::backend::{InMemoryClient, ObjectStoreConfig};
use crate::config::{BackendKind, StorageSettings, ENV_ENDPOINT, ENV_STORAGE_BACKEND};
use crate::error::StorageResult;
use crate::facade::{FacadeOptions, StorageFacade};
use std::sync::Arc;

/// Chooses and builds the storage backend described by the settings
///
/// # Example
///
/// ```no_run
/// use anf_storage::{BackendSelector, StorageSettings};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let settings = StorageSettings::from_env()?;
///     match BackendSelector::new().select(&settings).await? {
///         Some(facade) => println!("buckets: {:?}", facade.list_buckets().await),
///         None => println!("object storage not enabled"),
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BackendSelector {
    facade_options: FacadeOptions,
}

impl BackendSelector {
    /// Selector producing facades with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: options for the facades this selector builds
    pub fn with_facade_options(mut self, options: FacadeOptions) -> Self {
        self.facade_options = options;
        self
    }

    /// Build a facade for the configured backend
    ///
    /// Returns `Ok(None)` when another storage family is selected, when the
    /// object store endpoint is not set, or when the crate was built without
    /// native S3 support.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the object store is selected and
    /// its endpoint is set but the endpoint or the credentials are invalid.
    pub async fn select(&self, settings: &StorageSettings) -> StorageResult<Option<StorageFacade>> {
        match settings.backend_kind() {
            BackendKind::ObjectStore => self.select_object_store(settings).await,
            BackendKind::Memory => {
                tracing::info!("Using in-memory object store");
                Ok(Some(self.facade(Arc::new(InMemoryClient::new()))))
            }
            BackendKind::Other(kind) => {
                tracing::debug!(backend = %kind, "{} does not select object storage", ENV_STORAGE_BACKEND);
                Ok(None)
            }
        }
    }

    async fn select_object_store(
        &self,
        settings: &StorageSettings,
    ) -> StorageResult<Option<StorageFacade>> {
        let Some(config) = ObjectStoreConfig::from_settings(settings)? else {
            tracing::warn!("Object storage enabled but {} not set", ENV_ENDPOINT);
            return Ok(None);
        };

        self.connect(config).await
    }

    #[cfg(feature = "s3-native")]
    async fn connect(&self, config: ObjectStoreConfig) -> StorageResult<Option<StorageFacade>> {
        let endpoint = config.endpoint.clone();
        let client = crate::backend::S3ObjectClient::connect(config).await?;
        tracing::info!(endpoint = %endpoint, "Object storage initialized");
        Ok(Some(self.facade(Arc::new(client))))
    }

    #[cfg(not(feature = "s3-native"))]
    async fn connect(&self, config: ObjectStoreConfig) -> StorageResult<Option<StorageFacade>> {
        tracing::warn!(
            endpoint = %config.endpoint,
            "Object storage configured but this build lacks the 's3-native' feature"
        );
        Ok(None)
    }

    fn facade(&self, client: Arc<dyn crate::backend::ObjectStoreClient>) -> StorageFacade {
        StorageFacade::with_options(client, self.facade_options)
    }
}
