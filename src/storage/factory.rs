//! Backend selection.
//!
//! The factory turns the process configuration into exactly one file store.
//! It runs once at startup; the returned handle is injected into whatever
//! needs storage for the rest of the process lifetime.

use std::sync::Arc;

use super::error::Result;
use super::gcs::GcsStorage;
use super::local_fs::LocalFsStorage;
use super::s3::S3Storage;
use super::traits::SharedFileStore;
use super::types::{StorageConfig, StorageParams, StorageType};

/// Factory for creating the file store selected by configuration.
///
/// # Example
///
/// ```ignore
/// use filestore::storage::{StorageConfig, StorageFactory};
///
/// let config = StorageConfig::from_env()?;
/// let store = StorageFactory::create(&config).await?;
/// ```
pub struct StorageFactory;

impl StorageFactory {
    /// Create the file store for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - The selected provider has no settings section
    /// - Required settings (bucket, region, root path) are missing
    /// - The bucket check fails for a cloud provider
    pub async fn create(config: &StorageConfig) -> Result<SharedFileStore> {
        let params = config.resolve()?;
        Self::create_from_params(&params).await
    }

    /// Create a file store from already validated parameters.
    pub async fn create_from_params(params: &StorageParams) -> Result<SharedFileStore> {
        let store: SharedFileStore = match params {
            StorageParams::Local(settings) => {
                tracing::info!(
                    "Registering Local File System File Store at {}",
                    settings.root_path.display()
                );
                Arc::new(LocalFsStorage::new(settings).await?)
            }
            StorageParams::S3(settings) => {
                tracing::info!("Registering AWS S3 File Store for bucket {}", settings.bucket);
                Arc::new(S3Storage::new(settings).await?)
            }
            StorageParams::Gcs(settings) => {
                tracing::info!(
                    "Registering Google Cloud Storage File Store for bucket {}",
                    settings.bucket
                );
                Arc::new(GcsStorage::new(settings).await?)
            }
        };

        Ok(store)
    }

    /// Get a list of all supported storage types.
    pub fn supported_types() -> Vec<StorageType> {
        StorageType::all()
    }
}
