//! S3 storage implementation using OpenDAL.
//!
//! This module provides S3 and S3-compatible storage support including:
//! - Amazon S3
//! - MinIO
//! - Cloudflare R2
//! - DigitalOcean Spaces
//! - Any S3-compatible service

use async_trait::async_trait;
use bytes::Bytes;
use futures::io::AsyncWrite;
use opendal::Operator;
use opendal::services::S3;
use std::time::Duration;
use url::Url;

use super::backend::OperatorBackend;
use super::error::Result;
use super::keys;
use super::traits::{FileStore, KeyStream};
use super::types::{S3Settings, StorageType, non_empty};

/// S3 file store.
///
/// Pagination, request signing and retries of the underlying client are
/// OpenDAL's; this type adds the contract semantics on top.
pub struct S3Storage {
    bucket: String,
    backend: OperatorBackend,
}

impl S3Storage {
    /// Build the store from settings, verifying the bucket when
    /// `check_bucket` is set.
    pub async fn new(settings: &S3Settings) -> Result<Self> {
        let backend = OperatorBackend::new(Self::builder(settings), StorageType::S3)?;
        if settings.check_bucket {
            backend.check().await?;
        }

        tracing::info!(
            "S3 bucket {} ready in region {}",
            settings.bucket,
            settings.region
        );
        Ok(Self {
            bucket: settings.bucket.clone(),
            backend,
        })
    }

    /// Wrap an operator configured elsewhere for `bucket`.
    pub fn with_operator(operator: Operator, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            backend: OperatorBackend::from_operator(operator, StorageType::S3),
        }
    }

    /// The bucket this store writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn builder(settings: &S3Settings) -> S3 {
        let mut builder = S3::default()
            .bucket(&settings.bucket)
            .region(&settings.region);

        // Custom endpoint for S3-compatible services and emulators
        if let Some(endpoint) = non_empty(&settings.endpoint) {
            builder = builder.endpoint(endpoint);
        }

        // Static credentials, otherwise the ambient AWS credential chain
        if let (Some(access_key), Some(secret_key)) = (
            non_empty(&settings.access_key),
            non_empty(&settings.secret_key),
        ) {
            builder = builder
                .access_key_id(access_key)
                .secret_access_key(secret_key)
                .disable_config_load();
        }

        if settings.virtual_host_style {
            builder = builder.enable_virtual_host_style();
        }

        builder
    }
}

#[async_trait]
impl FileStore for S3Storage {
    fn storage_type(&self) -> StorageType {
        StorageType::S3
    }

    fn object_uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, keys::normalize_key(key))
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
