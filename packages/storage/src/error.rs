// ABOUTME: Error types for the key-value persistence layer
// ABOUTME: Covers IO, serialization, configuration, suite naming, and document versions

use appsettings_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid suite name: {0}. {1}")]
    InvalidSuiteName(String, String),
    #[error("Unsupported domain version {version} in {path:?}")]
    UnsupportedVersion { path: PathBuf, version: u32 },
}

pub type StorageResult<T> = Result<T, StorageError>;
