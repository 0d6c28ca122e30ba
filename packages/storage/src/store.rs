// ABOUTME: Key-value store trait shared by all persistence backends
// ABOUTME: Includes the in-memory backend used for tests and ephemeral settings

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::error::StorageResult;
use crate::value::StoredValue;

/// Main storage trait that every domain backend implements
///
/// Reads are served from memory and never fail. Writes report persistence
/// failures to the caller.
pub trait KeyValueStore: Send + Sync {
    /// Human-readable name of the domain, used in logs
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<StoredValue>;
    fn set(&self, key: &str, value: StoredValue) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Remove several keys with a single write
    fn remove_all(&self, keys: &[String]) -> StorageResult<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }

    fn snapshot(&self) -> BTreeMap<String, StoredValue>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn keys(&self) -> Vec<String> {
        self.snapshot().into_keys().collect()
    }

    fn clear(&self) -> StorageResult<()> {
        let keys = self.keys();
        self.remove_all(&keys)
    }

    /// Flush pending state to the backing medium
    fn synchronize(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Store that lives for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    name: String,
    values: RwLock<BTreeMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(BTreeMap::new()),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: StoredValue) -> StorageResult<()> {
        debug!("[{}] set {}", self.name, key);
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        debug!("[{}] remove {}", self.name, key);
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn snapshot(&self) -> BTreeMap<String, StoredValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
