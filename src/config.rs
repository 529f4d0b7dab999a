//! Loading the storage configuration.
//!
//! The configuration is read once at startup, either from a JSON file or
//! from `OSS_*` environment variables, and is immutable afterwards.

use std::path::{Path, PathBuf};

use crate::storage::{
    FileStoreError, GcsSettings, Result, S3Settings, StorageConfig, StorageType,
};

const ENV_PROVIDER: &str = "OSS_PROVIDER";

impl StorageConfig {
    /// Read the configuration from `OSS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build the configuration from a variable lookup.
    ///
    /// Only the section of the selected provider is read.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider: StorageType = var(ENV_PROVIDER)
            .ok_or_else(|| {
                FileStoreError::configuration(format!("{} is not set", ENV_PROVIDER))
            })?
            .parse()?;

        let config = match provider {
            StorageType::Local => {
                let root_path = var("OSS_LOCAL_ROOT_PATH").unwrap_or_default();
                StorageConfig::local(root_path)
            }
            StorageType::S3 => {
                let defaults = S3Settings::default();
                StorageConfig::s3(S3Settings {
                    bucket: var("OSS_S3_BUCKET").unwrap_or_default(),
                    region: var("OSS_S3_REGION").unwrap_or_default(),
                    endpoint: var("OSS_S3_ENDPOINT"),
                    access_key: var("OSS_S3_ACCESS_KEY"),
                    secret_key: var("OSS_S3_SECRET_KEY"),
                    virtual_host_style: parse_flag(
                        &var,
                        "OSS_S3_VIRTUAL_HOST_STYLE",
                        defaults.virtual_host_style,
                    )?,
                    check_bucket: parse_flag(&var, "OSS_S3_CHECK_BUCKET", defaults.check_bucket)?,
                })
            }
            StorageType::Gcs => {
                let defaults = GcsSettings::default();
                StorageConfig::gcs(GcsSettings {
                    bucket: var("OSS_GCS_BUCKET").unwrap_or_default(),
                    credential_path: var("OSS_GCS_CREDENTIAL_PATH").map(PathBuf::from),
                    endpoint: var("OSS_GCS_ENDPOINT"),
                    allow_anonymous: parse_flag(
                        &var,
                        "OSS_GCS_ALLOW_ANONYMOUS",
                        defaults.allow_anonymous,
                    )?,
                    check_bucket: parse_flag(&var, "OSS_GCS_CHECK_BUCKET", defaults.check_bucket)?,
                })
            }
        };

        Ok(config)
    }

    /// Read the JSON configuration file at `path`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FileStoreError::configuration(format!(
                "Could not read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            FileStoreError::configuration(format!(
                "Invalid configuration file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load from `path` if given, else from the default config file if it
    /// exists, else from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_json_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Loading storage configuration from {}", path.display());
                Self::from_json_file(&path)
            }
            _ => Self::from_env(),
        }
    }
}

/// `<config dir>/filestore/config.json`, when the platform has a config
/// directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("filestore").join("config.json"))
}

fn parse_flag<F>(var: &F, name: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = var(name) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(FileStoreError::configuration(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}
