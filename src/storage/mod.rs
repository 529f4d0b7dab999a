//! Blob storage backend implementations.
//!
//! This module provides one key/blob contract, [`FileStore`], implemented
//! over several backends using Apache OpenDAL.
//!
//! Supported storage backends:
//!
//! - **Local Filesystem** for development and single-host deployments
//! - **Amazon S3** and S3-compatible services (MinIO, Cloudflare R2, DigitalOcean Spaces)
//! - **Google Cloud Storage (GCS)** for Google Cloud Platform
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    StorageConfig                            │
//! │  - provider discriminator + per-provider settings           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    StorageFactory                           │
//! │  - Builds exactly one store at startup                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//! ┌──────────────────┐ ┌──────────────┐ ┌──────────────────┐
//! │  LocalFsStorage  │ │  S3Storage   │ │   GcsStorage     │
//! └──────────────────┘ └──────────────┘ └──────────────────┘
//!              └───────────────┼───────────────┘
//!                              ▼
//!                   OperatorBackend (OpenDAL)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use filestore::storage::{FileStore, S3Settings, StorageConfig, StorageFactory};
//!
//! let config = StorageConfig::s3(S3Settings {
//!     bucket: "my-bucket".to_string(),
//!     region: "us-east-1".to_string(),
//!     ..Default::default()
//! });
//!
//! let store = StorageFactory::create(&config).await?;
//!
//! store.upload_bytes("data/config.json", body).await?;
//! let url = store.download_url("data/config.json").await?;
//! ```

mod backend;
mod error;
mod factory;
mod gcs;
pub mod keys;
mod local_fs;
mod s3;
mod traits;
mod types;

// Re-export main types
pub use error::{ErrorKind, FileStoreError, Result};
pub use factory::StorageFactory;
pub use traits::{FileStore, KeyStream, SharedFileStore};
pub use types::{
    DEFAULT_URL_EXPIRY, GcsSettings, LocalSettings, S3Settings, StorageConfig, StorageParams,
    StorageType,
};

// Re-export storage implementations
pub use gcs::GcsStorage;
pub use local_fs::LocalFsStorage;
pub use s3::S3Storage;
