// ABOUTME: Store configuration loaded from the environment
// ABOUTME: Selects the persistence backend, its root directory, and the standard domain name

pub mod constants;

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use constants::{
    APPSETTINGS_APP_ID, APPSETTINGS_BACKEND, APPSETTINGS_HOME, DEFAULT_APP_ID, DEFAULT_DIR_NAME,
    FALLBACK_DIR_NAME,
};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid backend: {0}. Must be one of: file, memory")]
    InvalidBackend(String),
    #[error("App id cannot be empty")]
    EmptyAppId,
    #[error("Invalid app id: {0}. {1}")]
    InvalidAppId(String, String),
}

const MAX_DOMAIN_NAME_LEN: usize = 255;

/// Where persisted domains live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// One JSON document per domain under the store directory
    #[default]
    File,
    /// Process-lifetime maps, nothing touches disk
    Memory,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(Backend::File),
            "memory" => Ok(Backend::Memory),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub backend: Backend,
    pub directory: PathBuf,
    pub app_id: String,
}

impl StoreConfig {
    /// File-backed configuration rooted at `directory`
    pub fn at(directory: impl AsRef<Path>) -> Self {
        Self {
            backend: Backend::File,
            directory: directory.as_ref().to_path_buf(),
            app_id: DEFAULT_APP_ID.to_string(),
        }
    }

    /// Configuration that never persists anything
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            directory: default_directory(),
            app_id: DEFAULT_APP_ID.to_string(),
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = env::var(APPSETTINGS_BACKEND)
            .unwrap_or_else(|_| "file".to_string())
            .parse::<Backend>()?;

        let directory = env::var(APPSETTINGS_HOME)
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_directory);

        let app_id = env::var(APPSETTINGS_APP_ID).unwrap_or_else(|_| DEFAULT_APP_ID.to_string());
        validate_app_id(&app_id)?;

        debug!(
            "Loaded store config: backend={:?}, directory={:?}, app_id={}",
            backend, directory, app_id
        );

        Ok(Self {
            backend,
            directory,
            app_id,
        })
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::at(default_directory())
    }
}

/// Why `name` cannot name a domain file, if it cannot
///
/// Domain names become file names under the store directory, so they must
/// stay a single path component.
pub fn domain_name_problem(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        return Some("Name cannot be empty");
    }
    if name.len() > MAX_DOMAIN_NAME_LEN {
        return Some("Name is too long");
    }
    if name.contains("..") {
        return Some("Path traversal detected");
    }
    if name.starts_with('.') {
        return Some("Name cannot start with a dot");
    }
    if name.contains(['/', '\\', '\0']) {
        return Some("Name cannot contain path separators or NUL");
    }
    None
}

pub fn validate_app_id(app_id: &str) -> Result<(), ConfigError> {
    if app_id.trim().is_empty() {
        return Err(ConfigError::EmptyAppId);
    }
    match domain_name_problem(app_id) {
        Some(reason) => Err(ConfigError::InvalidAppId(
            app_id.to_string(),
            reason.to_string(),
        )),
        None => Ok(()),
    }
}

/// Platform config directory, or a dot directory under the working directory
pub fn default_directory() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(DEFAULT_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DIR_NAME))
}
