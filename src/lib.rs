//! One key/blob storage contract over interchangeable backends.
//!
//! Application code depends on [`storage::FileStore`]; the concrete backend
//! (local filesystem, S3-compatible or GCS) is picked once at startup by
//! [`storage::StorageFactory`] from a [`storage::StorageConfig`].

pub mod config;
pub mod storage;

pub use storage::{FileStore, FileStoreError, SharedFileStore, StorageConfig, StorageFactory};
