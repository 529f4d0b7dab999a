//! Google Cloud Storage implementation using OpenDAL.
//!
//! This module provides GCS storage support for Google Cloud Platform and
//! GCS emulators such as fake-gcs-server.

use async_trait::async_trait;
use bytes::Bytes;
use futures::io::AsyncWrite;
use opendal::Operator;
use opendal::services::Gcs;
use std::time::Duration;
use url::Url;

use super::backend::OperatorBackend;
use super::error::{FileStoreError, Result};
use super::keys;
use super::traits::{FileStore, KeyStream};
use super::types::{GcsSettings, StorageType, non_empty};

/// Google Cloud Storage file store.
///
/// Signed URLs are V4 signatures made with the service account key, so
/// they need a service account credential; anonymous and token-only
/// setups fail with a backend error.
pub struct GcsStorage {
    bucket: String,
    backend: OperatorBackend,
}

impl GcsStorage {
    /// Build the store from settings, verifying the bucket when
    /// `check_bucket` is set.
    pub async fn new(settings: &GcsSettings) -> Result<Self> {
        let backend = OperatorBackend::new(Self::builder(settings)?, StorageType::Gcs)?;
        if settings.check_bucket {
            backend.check().await?;
        }

        tracing::info!("GCS bucket {} ready", settings.bucket);
        Ok(Self {
            bucket: settings.bucket.clone(),
            backend,
        })
    }

    /// Wrap an operator configured elsewhere for `bucket`.
    pub fn with_operator(operator: Operator, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            backend: OperatorBackend::from_operator(operator, StorageType::Gcs),
        }
    }

    /// The bucket this store writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn builder(settings: &GcsSettings) -> Result<Gcs> {
        let mut builder = Gcs::default().bucket(&settings.bucket);

        // Optional: service account credentials, otherwise the ambient
        // Google credential chain
        if let Some(path) = &settings.credential_path {
            let path = path.to_str().ok_or_else(|| {
                FileStoreError::configuration(format!(
                    "Invalid credentials path: {}",
                    path.display()
                ))
            })?;
            builder = builder.credential_path(path);
        }

        if let Some(endpoint) = non_empty(&settings.endpoint) {
            builder = builder.endpoint(endpoint);
        }

        if settings.allow_anonymous {
            builder = builder.allow_anonymous();
        }

        Ok(builder)
    }
}

#[async_trait]
impl FileStore for GcsStorage {
    fn storage_type(&self) -> StorageType {
        StorageType::Gcs
    }

    fn object_uri(&self, key: &str) -> String {
        format!("gs://{}/{}", self.bucket, keys::normalize_key(key))
    }

    async fn list(&self, prefix: Option<&str>) -> Result<KeyStream> {
        self.backend.list(prefix).await
    }

    async fn upload_bytes(&self, key: &str, content: Bytes) -> Result<()> {
        self.backend.write(key, content).await
    }

    async fn download_bytes(&self, key: &str) -> Result<Bytes> {
        self.backend.read(key).await
    }

    async fn download_to(
        &self,
        key: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        self.backend.read_to(key, writer).await.map(|_| ())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.backend.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.backend.exists(key).await
    }

    async fn copy(&self, source: &str, dest: &str) -> Result<bool> {
        self.backend.copy(source, dest).await
    }

    async fn size_of(&self, key: &str) -> Result<u64> {
        self.backend.size_of(key).await
    }

    async fn generate_download_url(&self, key: &str, expiry: Duration) -> Result<Url> {
        self.backend.presign_read(key, expiry).await
    }

    async fn generate_upload_url(&self, key: &str, expiry: Duration) -> Result<Url> {
        self.backend.presign_write(key, expiry).await
    }
}
