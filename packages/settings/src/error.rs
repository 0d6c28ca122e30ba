// ABOUTME: Error types for settings access
// ABOUTME: Wraps validation and storage failures behind one settings error

use appsettings_storage::StorageError;
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type SettingsResult<T> = Result<T, SettingsError>;
