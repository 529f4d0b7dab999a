//! Local filesystem storage implementation using OpenDAL.
//!
//! Keys map to paths relative to a root directory, created on
//! construction. Signed URLs have no filesystem equivalent, so both URL
//! operations fail with `Unsupported`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::io::AsyncWrite;
use opendal::services::Fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::backend::OperatorBackend;
use super::error::{FileStoreError, Result};
use super::keys;
use super::traits::{FileStore, KeyStream};
use super::types::{LocalSettings, StorageType};

/// Local filesystem file store.
///
/// Uses OpenDAL's `fs` service, providing the same behaviour as the cloud
/// backends for development and single-host deployments.
pub struct LocalFsStorage {
    root_path: PathBuf,
    backend: OperatorBackend,
}

impl LocalFsStorage {
    /// Create the store, creating the root directory if needed.
    pub async fn new(settings: &LocalSettings) -> Result<Self> {
        let root_path = settings.root_path.clone();

        async_fs::create_dir_all(&root_path).await.map_err(|e| {
            FileStoreError::configuration(format!(
                "Error creating local root directory {}: {}",
                root_path.display(),
                e
            ))
        })?;

        let backend = OperatorBackend::new(Self::builder(&root_path)?, StorageType::Local)?;

        Ok(Self { root_path, backend })
    }

    /// The root directory keys are resolved against.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn builder(root_path: &Path) -> Result<Fs> {
        let root = root_path.to_str().ok_or_else(|| {
            FileStoreError::configuration(format!(
                "Local root path is not valid UTF-8: {}",
                root_path.display()
            ))
        })?;

        Ok(Fs::default().root(root))
    }

    /// Refuse keys that would resolve outside the root directory.
    fn check_key(key: &str) -> Result<()> {
        if keys::has_parent_segment(key) {
            return Err(FileStoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("key escapes the store root: {}", key),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for LocalFsStorage {
    fn storage_type(&self) -> StorageType {
        StorageType::Local
    }

    fn object_uri(&self, key: &str) -> String {
        let root = self.root_path.display().to_string();
        format!(
            "file://{}/{}",
            root.trim_end_matches('/'),
            keys::normalize_key(key)
        )
    }

    async fn list(&self, prefix: Option<&str>) -> Result<KeyStream> {
        Self::check_key(prefix.unwrap_or_default())?;
        self.backend.list(prefix).await
    }

    async fn upload_bytes(&self, key: &str, content: Bytes) -> Result<()> {
        Self::check_key(key)?;
        self.backend.write(key, content).await
    }

    async fn download_bytes(&self, key: &str) -> Result<Bytes> {
        Self::check_key(key)?;
        self.backend.read(key).await
    }

    async fn download_to(
        &self,
        key: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        Self::check_key(key)?;
        self.backend.read_to(key, writer).await.map(|_| ())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        self.backend.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Self::check_key(key)?;
        self.backend.exists(key).await
    }

    async fn copy(&self, source: &str, dest: &str) -> Result<bool> {
        Self::check_key(source)?;
        Self::check_key(dest)?;
        self.backend.copy(source, dest).await
    }

    /// A filesystem rename replaces copy-then-delete, so the move is atomic
    /// when source and destination share a filesystem.
    async fn move_object(&self, source: &str, dest: &str) -> Result<bool> {
        Self::check_key(source)?;
        Self::check_key(dest)?;
        if !self.backend.supports_rename() {
            if !self.backend.copy(source, dest).await? {
                return Ok(false);
            }
            self.backend.delete(source).await?;
            return self.backend.exists(dest).await;
        }
        self.backend.rename(source, dest).await
    }

    async fn size_of(&self, key: &str) -> Result<u64> {
        Self::check_key(key)?;
        self.backend.size_of(key).await
    }

    async fn generate_download_url(&self, _key: &str, _expiry: Duration) -> Result<Url> {
        Err(self.backend.unsupported("generate_download_url"))
    }

    async fn generate_upload_url(&self, _key: &str, _expiry: Duration) -> Result<Url> {
        Err(self.backend.unsupported("generate_upload_url"))
    }
}
