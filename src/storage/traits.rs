//! The file store contract.
//!
//! This module defines the trait every storage backend implements, giving
//! application code one key/blob interface whichever backend is selected at
//! startup.

use async_trait::async_trait;
use bytes::Bytes;
use futures::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use futures::stream::BoxStream;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::error::Result;
use super::types::{DEFAULT_URL_EXPIRY, StorageType};

/// Lazily produced sequence of keys returned by [`FileStore::list`].
///
/// Backend pages are fetched only as the stream is polled. Dropping the
/// stream, whether exhausted, abandoned early or after an error, releases
/// the underlying lister.
pub type KeyStream = BoxStream<'static, Result<String>>;

/// Core trait for key/blob storage.
///
/// Keys are opaque UTF-8 strings; `/` separates levels by convention only.
/// A later upload to the same key replaces the earlier blob.
///
/// Leading `/` characters are not part of a key: `/a.txt` and `a.txt` name
/// the same blob, and `list` reports it as `a.txt`. The local backend
/// rejects keys with a `..` segment with an I/O error.
///
/// # Missing keys
///
/// Operations that hand back data (`download_bytes`, `download_to`,
/// `size_of`) fail with [`NotFound`](super::FileStoreError::NotFound) when
/// the key is absent. Query-style operations report absence as a value
/// instead: `exists` returns `false`, `copy` and `move_object` return
/// `false` for a missing source, and `delete` of a missing key succeeds.
///
/// # Example
///
/// ```ignore
/// use filestore::storage::{FileStore, StorageConfig, StorageFactory};
///
/// let store = StorageFactory::create(&StorageConfig::local("/var/lib/blobs")).await?;
///
/// store.upload_bytes("images/logo.png", png.into()).await?;
/// let size = store.size_of("images/logo.png").await?;
///
/// let mut keys = store.list(Some("images/")).await?;
/// while let Some(key) = keys.try_next().await? {
///     println!("{key}");
/// }
/// ```
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Get the storage type for this store.
    fn storage_type(&self) -> StorageType;

    /// Get the full URI for a key (e.g., "s3://bucket/path/to/object").
    fn object_uri(&self, key: &str) -> String;

    /// List keys starting with `prefix`, or every key when `prefix` is
    /// `None` or empty.
    ///
    /// The prefix is a plain string filter, not a directory. Ordering is
    /// backend-defined.
    async fn list(&self, prefix: Option<&str>) -> Result<KeyStream>;

    /// Write `content` to `key`, replacing any existing blob.
    async fn upload_bytes(&self, key: &str, content: Bytes) -> Result<()>;

    /// Upload the contents of a local file.
    ///
    /// Fails with an I/O error if the file cannot be read.
    async fn upload_file(&self, key: &str, path: &Path) -> Result<()> {
        let content = async_fs::read(path).await?;
        self.upload_bytes(key, Bytes::from(content)).await
    }

    /// Upload everything `reader` yields.
    ///
    /// The content is buffered in full before it is sent. The reader is
    /// drained but stays owned (and open) by the caller.
    async fn upload_reader(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<()> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content).await?;
        self.upload_bytes(key, Bytes::from(content)).await
    }

    /// Read a whole blob into memory.
    async fn download_bytes(&self, key: &str) -> Result<Bytes>;

    /// Stream a blob into `writer`.
    ///
    /// All bytes are written and the writer is flushed before this returns.
    /// The writer is not closed.
    async fn download_to(&self, key: &str, writer: &mut (dyn AsyncWrite + Unpin + Send))
        -> Result<()>;

    /// Delete a blob. Deleting a missing key is logged and succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a blob exists.
    ///
    /// Only absence yields `false`; other backend failures are errors.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Copy `source` to `dest`, keeping the source.
    ///
    /// Returns `false` without error if `source` does not exist, otherwise
    /// whether `dest` exists afterwards.
    async fn copy(&self, source: &str, dest: &str) -> Result<bool>;

    /// Move `source` to `dest`.
    ///
    /// This is copy-then-delete and not atomic: a failure between the two
    /// steps leaves both keys present, never neither. Returns `false`
    /// without error if `source` does not exist, otherwise whether `dest`
    /// exists afterwards.
    async fn move_object(&self, source: &str, dest: &str) -> Result<bool> {
        if !self.copy(source, dest).await? {
            return Ok(false);
        }
        self.delete(source).await?;
        self.exists(dest).await
    }

    /// Size of a blob in bytes.
    async fn size_of(&self, key: &str) -> Result<u64>;

    /// Signed GET-only URL for `key`, valid for `expiry` from now.
    ///
    /// The key is not checked; a missing key is only noticed when the URL
    /// is used.
    async fn generate_download_url(&self, key: &str, expiry: Duration) -> Result<Url>;

    /// Signed PUT-only URL for `key`, valid for `expiry` from now.
    ///
    /// Writes through the URL bypass this store entirely.
    async fn generate_upload_url(&self, key: &str, expiry: Duration) -> Result<Url>;

    /// Signed download URL with the default ten minute expiry.
    async fn download_url(&self, key: &str) -> Result<Url> {
        self.generate_download_url(key, DEFAULT_URL_EXPIRY).await
    }

    /// Signed upload URL with the default ten minute expiry.
    async fn upload_url(&self, key: &str) -> Result<Url> {
        self.generate_upload_url(key, DEFAULT_URL_EXPIRY).await
    }
}

/// The process-wide store handle, built once by the factory and injected
/// wherever storage is needed.
pub type SharedFileStore = Arc<dyn FileStore>;
