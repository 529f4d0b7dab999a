//! OpenDAL plumbing shared by the adapters.
//!
//! Each adapter builds its own OpenDAL service from its settings and wraps
//! the resulting operator in a [`OperatorBackend`], which implements the
//! contract semantics (string-prefix listing, not-found mapping, copy
//! fallback, signed URLs) once for every service.

use bytes::Bytes;
use futures::io::{AsyncWrite, AsyncWriteExt};
use futures::{StreamExt, TryStreamExt, future};
use opendal::layers::LoggingLayer;
use opendal::{Builder, EntryMode, Metadata, Operator};
use std::time::Duration;
use url::Url;

use super::error::{FileStoreError, Result};
use super::keys;
use super::traits::KeyStream;
use super::types::StorageType;

/// Download chunk size used by [`OperatorBackend::read_to`].
const DOWNLOAD_CHUNK_SIZE: u64 = 8 * 1024 * 1024;

/// An OpenDAL operator plus the backend it talks to.
#[derive(Clone)]
pub(crate) struct OperatorBackend {
    op: Operator,
    storage_type: StorageType,
}

impl OperatorBackend {
    /// Build the operator for `builder` with logging enabled.
    pub fn new<B: Builder>(builder: B, storage_type: StorageType) -> Result<Self> {
        let op = Operator::new(builder)
            .map_err(|e| {
                FileStoreError::configuration(format!(
                    "Failed to initialize {} backend: {}",
                    storage_type, e
                ))
            })?
            .layer(LoggingLayer::default())
            .finish();

        Ok(Self { op, storage_type })
    }

    /// Use an operator that was configured by the caller.
    pub fn from_operator(op: Operator, storage_type: StorageType) -> Self {
        Self { op, storage_type }
    }

    /// Verify the backend is reachable with the configured credentials.
    pub async fn check(&self) -> Result<()> {
        self.op.check().await.map_err(|e| {
            FileStoreError::configuration(format!(
                "Failed to access {}: {}. Check your credentials and bucket name.",
                self.storage_type, e
            ))
        })
    }

    /// Lazily list keys matching `prefix`.
    ///
    /// The nearest enclosing directory is listed recursively and the
    /// entries are filtered by string prefix. OpenDAL fetches the next page
    /// when the stream is polled past the current one.
    pub async fn list(&self, prefix: Option<&str>) -> Result<KeyStream> {
        let prefix = keys::normalize_key(prefix.unwrap_or_default()).to_string();
        let root = keys::listing_root(&prefix);

        let lister = match self.op.lister_with(root).recursive(true).await {
            Ok(lister) => lister,
            Err(e) if is_missing_directory(&e) => {
                return Ok(futures::stream::empty().boxed());
            }
            Err(e) => return Err(FileStoreError::Backend(e)),
        };

        let keys = lister
            .map_err(FileStoreError::Backend)
            .try_filter_map(move |entry| {
                let path = entry.path();
                let key = (entry.metadata().mode() != EntryMode::DIR
                    && !keys::is_directory_marker(path)
                    && keys::matches_prefix(path, &prefix))
                .then(|| path.to_string());
                future::ready(Ok(key))
            });

        Ok(keys.boxed())
    }

    pub async fn write(&self, key: &str, content: Bytes) -> Result<()> {
        let key = keys::normalize_key(key);
        let len = content.len();

        self.op
            .write(key, content)
            .await
            .map_err(FileStoreError::Backend)?;

        tracing::debug!("Uploaded {} bytes to {}: {}", len, self.storage_type, key);
        Ok(())
    }

    pub async fn read(&self, key: &str) -> Result<Bytes> {
        let key = keys::normalize_key(key);

        let data = self
            .op
            .read(key)
            .await
            .map_err(|e| FileStoreError::from_backend(key, e))?
            .to_bytes();

        tracing::debug!(
            "Downloaded {} bytes from {}: {}",
            data.len(),
            self.storage_type,
            key
        );
        Ok(data)
    }

    /// Copy a blob into `writer` chunk by chunk, then flush it.
    pub async fn read_to(
        &self,
        key: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let key = keys::normalize_key(key);
        let size = self.file_stat(key).await?.content_length();
        let reader = self
            .op
            .reader(key)
            .await
            .map_err(|e| FileStoreError::from_backend(key, e))?;

        let mut offset = 0;
        while offset < size {
            let end = size.min(offset + DOWNLOAD_CHUNK_SIZE);
            let chunk = reader
                .read(offset..end)
                .await
                .map_err(|e| FileStoreError::from_backend(key, e))?;
            let chunk = chunk.to_bytes();
            if chunk.is_empty() {
                // Object shrank while we were reading it.
                break;
            }
            writer.write_all(&chunk).await?;
            offset += chunk.len() as u64;
        }
        writer.flush().await?;

        tracing::debug!(
            "Downloaded {} bytes from {} to writer: {}",
            offset,
            self.storage_type,
            key
        );
        Ok(offset)
    }

    /// Delete `key`, treating a missing key as a logged no-op.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let key = keys::normalize_key(key);

        if !self.exists(key).await? {
            tracing::warn!("Object does not exist in {}: {}", self.storage_type, key);
            return Ok(());
        }

        self.op
            .delete(key)
            .await
            .map_err(FileStoreError::Backend)?;

        tracing::debug!("Deleted object from {}: {}", self.storage_type, key);
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self.file_stat(key).await {
            Ok(_) => Ok(true),
            Err(FileStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn size_of(&self, key: &str) -> Result<u64> {
        Ok(self.file_stat(key).await?.content_length())
    }

    /// Copy `source` to `dest`; `false` when the source is missing.
    ///
    /// Uses the service's server-side copy where available and falls back
    /// to read-then-write otherwise.
    pub async fn copy(&self, source: &str, dest: &str) -> Result<bool> {
        let source = keys::normalize_key(source);
        let dest = keys::normalize_key(dest);

        if !self.exists(source).await? {
            return Ok(false);
        }

        if self.op.info().full_capability().copy {
            match self.op.copy(source, dest).await {
                Ok(()) => {}
                Err(e) if e.kind() == opendal::ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(FileStoreError::Backend(e)),
            }
        } else {
            let content = match self.read(source).await {
                Ok(content) => content,
                Err(FileStoreError::NotFound { .. }) => return Ok(false),
                Err(e) => return Err(e),
            };
            self.write(dest, content).await?;
        }

        tracing::debug!("Copied {} -> {} in {}", source, dest, self.storage_type);
        self.exists(dest).await
    }

    /// Rename `source` to `dest` in one backend call; `false` when the
    /// source is missing.
    pub async fn rename(&self, source: &str, dest: &str) -> Result<bool> {
        let source = keys::normalize_key(source);
        let dest = keys::normalize_key(dest);

        if !self.exists(source).await? {
            return Ok(false);
        }

        match self.op.rename(source, dest).await {
            Ok(()) => {}
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(FileStoreError::Backend(e)),
        }

        tracing::debug!("Moved {} -> {} in {}", source, dest, self.storage_type);
        self.exists(dest).await
    }

    pub fn supports_rename(&self) -> bool {
        self.op.info().full_capability().rename
    }

    pub async fn presign_read(&self, key: &str, expiry: Duration) -> Result<Url> {
        if !self.op.info().full_capability().presign_read {
            return Err(self.unsupported("generate_download_url"));
        }

        let key = keys::normalize_key(key);
        let request = self
            .op
            .presign_read(key, expiry)
            .await
            .map_err(FileStoreError::Backend)?;
        to_url(&request.uri().to_string())
    }

    pub async fn presign_write(&self, key: &str, expiry: Duration) -> Result<Url> {
        if !self.op.info().full_capability().presign_write {
            return Err(self.unsupported("generate_upload_url"));
        }

        let key = keys::normalize_key(key);
        let request = self
            .op
            .presign_write(key, expiry)
            .await
            .map_err(FileStoreError::Backend)?;
        to_url(&request.uri().to_string())
    }

    pub fn unsupported(&self, operation: &'static str) -> FileStoreError {
        FileStoreError::Unsupported {
            operation,
            backend: self.storage_type,
        }
    }

    /// Stat `key`, treating anything that is not a regular blob as absent.
    async fn file_stat(&self, key: &str) -> Result<Metadata> {
        let key = keys::normalize_key(key);
        if keys::is_directory_marker(key) {
            return Err(FileStoreError::not_found(key));
        }

        let metadata = self
            .op
            .stat(key)
            .await
            .map_err(|e| FileStoreError::from_backend(key, e))?;

        if metadata.mode() == EntryMode::DIR {
            return Err(FileStoreError::not_found(key));
        }
        Ok(metadata)
    }
}

/// Whether a list failure means the listed directory cannot hold keys:
/// it is absent, or one of its components is a blob.
fn is_missing_directory(err: &opendal::Error) -> bool {
    if matches!(
        err.kind(),
        opendal::ErrorKind::NotFound | opendal::ErrorKind::NotADirectory
    ) {
        return true;
    }

    // The fs service reports ENOTDIR as `Unexpected` with the io error as
    // its source.
    std::error::Error::source(err)
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .is_some_and(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
            )
        })
}

fn to_url(uri: &str) -> Result<Url> {
    Url::parse(uri).map_err(|e| {
        FileStoreError::Backend(
            opendal::Error::new(
                opendal::ErrorKind::Unexpected,
                "presigned request is not a valid URL",
            )
            .with_context("uri", uri)
            .set_source(e),
        )
    })
}
