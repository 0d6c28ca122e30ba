// ABOUTME: JSON-file backed domain store with write-through persistence
// ABOUTME: Corrupt documents are moved aside so preferences never block startup

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::store::KeyValueStore;
use crate::value::StoredValue;

/// Version written into every domain document
pub const DOMAIN_VERSION: u32 = 1;

#[derive(Deserialize)]
struct DomainDocument {
    version: u32,
    #[serde(default)]
    values: BTreeMap<String, StoredValue>,
}

#[derive(Serialize)]
struct DomainDocumentRef<'a> {
    version: u32,
    values: &'a BTreeMap<String, StoredValue>,
}

pub struct FileStore {
    name: String,
    path: PathBuf,
    values: RwLock<BTreeMap<String, StoredValue>>,
}

impl FileStore {
    /// Open the domain stored at `path`
    ///
    /// A missing file is an empty domain. A file that cannot be parsed is
    /// renamed to `<file>.bad-<timestamp>` and the domain starts empty.
    pub fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> StorageResult<Self> {
        let name = name.into();
        let path = path.into();
        let values = load_domain(&path)?;

        info!(
            "Opened domain '{}' at {:?} ({} entries)",
            name,
            path,
            values.len()
        );

        Ok(Self {
            name,
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the values, persist it, then publish it
    fn update<F>(&self, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, StoredValue>) -> bool,
    {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = values.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, StoredValue>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let document = DomainDocumentRef {
            version: DOMAIN_VERSION,
            values,
        };
        let json = serde_json::to_string_pretty(&document)?;

        let temp_path = temp_path_for(&self.path);
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        debug!("[{}] persisted {} entries", self.name, values.len());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
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
        self.update(|values| {
            values.insert(key.to_string(), value);
            true
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        debug!("[{}] remove {}", self.name, key);
        self.update(|values| values.remove(key).is_some())
    }

    fn remove_all(&self, keys: &[String]) -> StorageResult<()> {
        self.update(|values| {
            let mut changed = false;
            for key in keys {
                changed |= values.remove(key).is_some();
            }
            changed
        })
    }

    fn snapshot(&self) -> BTreeMap<String, StoredValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn synchronize(&self) -> StorageResult<()> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        self.persist(&values)
    }
}

fn load_domain(path: &Path) -> StorageResult<BTreeMap<String, StoredValue>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            warn!("Domain file {:?} is not valid UTF-8: {}", path, e);
            quarantine(path)?;
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str::<DomainDocument>(&contents) {
        Ok(document) if document.version == DOMAIN_VERSION => Ok(document.values),
        Ok(document) => Err(StorageError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: document.version,
        }),
        Err(e) => {
            warn!("Error parsing domain file {:?}: {}", path, e);
            quarantine(path)?;
            Ok(BTreeMap::new())
        }
    }
}

/// Move a corrupt domain file out of the way, keeping it for inspection
fn quarantine(path: &Path) -> StorageResult<PathBuf> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "domain.json".to_string());
    let backup = path.with_file_name(format!("{}.bad-{}", file_name, Utc::now().timestamp()));

    fs::rename(path, &backup)?;
    warn!("Moved corrupt domain file to {:?}", backup);
    Ok(backup)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{}.tmp", file_name))
}
