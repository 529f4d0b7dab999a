//! Failure taxonomy for file store operations.
//!
//! Every adapter reports failures through [`FileStoreError`], so callers can
//! branch on [`ErrorKind`] without knowing which backend is active.

use thiserror::Error;

use super::types::StorageType;

/// Result alias used across the storage module.
pub type Result<T> = std::result::Result<T, FileStoreError>;

/// Errors surfaced by [`FileStore`](super::FileStore) operations and by
/// backend selection.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The key does not exist. Only raised by operations that must return
    /// data (`download_bytes`, `download_to`, `size_of`).
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// Local I/O failed while reading an upload source or writing a
    /// download destination.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend rejected the request for any reason other than a missing
    /// key. The backend error is kept as the source.
    #[error("Backend error: {0}")]
    Backend(#[source] opendal::Error),

    /// The operation has no meaningful implementation on this backend.
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        operation: &'static str,
        backend: StorageType,
    },

    /// The backend selector could not build an adapter. Startup only.
    #[error("Invalid storage configuration: {0}")]
    Configuration(String),
}

/// Fieldless view of [`FileStoreError`] for matching on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Io,
    Backend,
    Unsupported,
    Configuration,
}

impl FileStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FileStoreError::NotFound { .. } => ErrorKind::NotFound,
            FileStoreError::Io(_) => ErrorKind::Io,
            FileStoreError::Backend(_) => ErrorKind::Backend,
            FileStoreError::Unsupported { .. } => ErrorKind::Unsupported,
            FileStoreError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn not_found(key: &str) -> Self {
        FileStoreError::NotFound {
            key: key.to_string(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        FileStoreError::Configuration(message.into())
    }

    /// Translate a backend error raised while operating on `key`.
    ///
    /// OpenDAL's `NotFound` becomes [`FileStoreError::NotFound`]; everything
    /// else is a [`FileStoreError::Backend`] carrying the original error.
    pub(crate) fn from_backend(key: &str, err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(key),
            _ => FileStoreError::Backend(err),
        }
    }
}
