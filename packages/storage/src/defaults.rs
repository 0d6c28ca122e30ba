// ABOUTME: Registry of persisted domains, one shared store per suite
// ABOUTME: Resolves the standard domain and named shared containers to backend stores

use appsettings_config::{domain_name_problem, validate_app_id, Backend, StoreConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::file::FileStore;
use crate::store::{KeyValueStore, MemoryStore};

/// Hands out one store per domain and keeps it for the life of the registry
pub struct Defaults {
    config: StoreConfig,
    stores: RwLock<HashMap<String, Arc<dyn KeyValueStore>>>,
}

impl Defaults {
    pub fn new(config: StoreConfig) -> Self {
        debug!("Creating defaults registry with backend: {:?}", config.backend);
        Self {
            config,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Registry configured from `APPSETTINGS_*` environment variables
    pub fn from_env() -> StorageResult<Self> {
        let config = StoreConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Registry whose domains are never written to disk
    pub fn in_memory() -> Self {
        Self::new(StoreConfig::in_memory())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Store for the standard domain (`None`) or a named suite
    ///
    /// Repeated calls for the same domain return the same store. A suite
    /// may not reuse the standard domain's name.
    pub fn store(&self, suite: Option<&str>) -> StorageResult<Arc<dyn KeyValueStore>> {
        let domain = match suite {
            Some(name) => {
                validate_suite_name(name)?;
                if name == self.config.app_id {
                    return Err(StorageError::InvalidSuiteName(
                        name.to_string(),
                        "Suite name cannot be the app id".to_string(),
                    ));
                }
                name.to_string()
            }
            None => {
                validate_app_id(&self.config.app_id)?;
                self.config.app_id.clone()
            }
        };

        if let Some(store) = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&domain)
        {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have opened the domain between the two locks
        if let Some(store) = stores.get(&domain) {
            return Ok(Arc::clone(store));
        }

        let store = self.open_domain(&domain)?;
        stores.insert(domain, Arc::clone(&store));
        Ok(store)
    }

    /// Domains opened so far, sorted by name
    pub fn suites(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Flush every opened domain
    pub fn synchronize(&self) -> StorageResult<()> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        for store in stores.values() {
            store.synchronize()?;
        }
        Ok(())
    }

    /// Location of a domain's document for the file backend
    pub fn domain_path(&self, domain: &str) -> PathBuf {
        self.config.directory.join(format!("{}.json", domain))
    }

    fn open_domain(&self, domain: &str) -> StorageResult<Arc<dyn KeyValueStore>> {
        match self.config.backend {
            Backend::Memory => {
                info!("Initializing in-memory domain '{}'", domain);
                Ok(Arc::new(MemoryStore::new(domain)))
            }
            Backend::File => {
                let path = self.domain_path(domain);
                info!("Initializing file domain '{}' at {:?}", domain, path);
                Ok(Arc::new(FileStore::open(domain, path)?))
            }
        }
    }
}

/// Suite names become file names, so they must stay inside the store directory
pub fn validate_suite_name(name: &str) -> StorageResult<()> {
    match domain_name_problem(name) {
        Some(reason) => Err(StorageError::InvalidSuiteName(
            name.to_string(),
            reason.to_string(),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::StoredValue;
    use appsettings_config::ConfigError;
    use rstest::rstest;

    #[test]
    fn test_same_domain_returns_same_store() {
        let defaults = Defaults::in_memory();

        let first = defaults.store(None).unwrap();
        let second = defaults.store(None).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_suites_are_isolated() {
        let defaults = Defaults::in_memory();

        let standard = defaults.store(None).unwrap();
        let shared = defaults.store(Some("group.com.example.shared")).unwrap();
        shared.set("name", StoredValue::from("Morty")).unwrap();

        assert!(standard.get("name").is_none());
        assert_eq!(
            defaults.suites(),
            vec!["default".to_string(), "group.com.example.shared".to_string()]
        );
    }

    #[test]
    fn test_suite_named_like_app_id_is_rejected() {
        let defaults = Defaults::new(StoreConfig::in_memory().with_app_id("com.example.app"));

        assert!(matches!(
            defaults.store(Some("com.example.app")),
            Err(StorageError::InvalidSuiteName(_, _))
        ));
        assert!(defaults.store(Some("group.com.example.app")).is_ok());
    }

    #[test]
    fn test_app_id_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        let defaults = Defaults::new(StoreConfig::at(&home).with_app_id("../escaped"));

        assert!(matches!(
            defaults.store(None),
            Err(StorageError::Config(ConfigError::InvalidAppId(_, _)))
        ));
        assert!(!dir.path().join("escaped.json").exists());
    }

    #[rstest]
    #[case("group.com.example")]
    #[case("shared-prefs_2")]
    #[case("a")]
    fn test_valid_suite_names(#[case] name: &str) {
        assert!(validate_suite_name(name).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("../../etc/passwd")]
    #[case("..")]
    #[case(".hidden")]
    #[case("group/child")]
    #[case("group\\child")]
    #[case("nul\0byte")]
    fn test_invalid_suite_names(#[case] name: &str) {
        assert!(matches!(
            validate_suite_name(name),
            Err(StorageError::InvalidSuiteName(_, _))
        ));
    }

    #[test]
    fn test_overlong_suite_name() {
        let name = "a".repeat(256);
        assert!(validate_suite_name(&name).is_err());
    }

    #[test]
    fn test_domain_path() {
        let defaults = Defaults::new(StoreConfig::at("/prefs").with_app_id("com.example.app"));
        assert_eq!(
            defaults.domain_path("com.example.app"),
            PathBuf::from("/prefs/com.example.app.json")
        );
    }
}
