// ABOUTME: Settings context owning the suite registry and the instance cache
// ABOUTME: One cached settings object per (type, identifier, suite), plus the process-wide context

use appsettings_config::StoreConfig;
use appsettings_storage::Defaults;
use lazy_static::lazy_static;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::error::SettingsResult;
use crate::settings::{AppSettings, SettingsHandle};

type InstanceKey = (TypeId, Option<String>, Option<String>);
type InstanceMap = HashMap<InstanceKey, Arc<dyn Any + Send + Sync>>;

lazy_static! {
    static ref GLOBAL_CONTEXT: SettingsContext = SettingsContext::from_env_or_memory();
}

/// Owns the stores and every settings instance created through it
pub struct SettingsContext {
    defaults: Defaults,
    instances: RwLock<InstanceMap>,
}

impl SettingsContext {
    pub fn new(defaults: Defaults) -> Self {
        Self {
            defaults,
            instances: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: StoreConfig) -> Self {
        Self::new(Defaults::new(config))
    }

    pub fn in_memory() -> Self {
        Self::new(Defaults::in_memory())
    }

    /// Process-wide context configured from the environment
    pub fn global() -> &'static SettingsContext {
        &GLOBAL_CONTEXT
    }

    fn from_env_or_memory() -> Self {
        match StoreConfig::from_env() {
            Ok(config) => Self::from_config(config),
            Err(e) => {
                warn!("Invalid settings environment ({}), using in-memory store", e);
                Self::in_memory()
            }
        }
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Cached instance of `S` for the identifier and suite, created on first use
    ///
    /// Empty identifiers and suite names are treated as absent.
    pub fn instance<S: AppSettings>(
        &self,
        identifier: Option<&str>,
        suite_name: Option<&str>,
    ) -> SettingsResult<Arc<S>> {
        let identifier = identifier.filter(|id| !id.is_empty()).map(str::to_string);
        let suite_name = suite_name.filter(|s| !s.is_empty()).map(str::to_string);
        let key = (TypeId::of::<S>(), identifier, suite_name);

        if let Some(settings) = cached::<S>(
            &self.instances.read().unwrap_or_else(PoisonError::into_inner),
            &key,
        ) {
            debug!("Instance cache hit for {}", S::type_key());
            return Ok(settings);
        }

        let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(settings) = cached::<S>(&instances, &key) {
            return Ok(settings);
        }

        let (type_id, identifier, suite_name) = key;
        debug!(
            "Creating {} instance (identifier: {:?}, suite: {:?})",
            S::type_key(),
            identifier,
            suite_name
        );
        let store = self.defaults.store(suite_name.as_deref())?;
        let handle = SettingsHandle::new(S::schema(), identifier.clone(), suite_name.clone(), store)?;
        let settings = Arc::new(S::from_handle(handle));

        instances.insert(
            (type_id, identifier, suite_name),
            Arc::clone(&settings) as Arc<dyn Any + Send + Sync>,
        );
        Ok(settings)
    }

    /// Number of instances created so far
    pub fn instance_count(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn cached<S: AppSettings>(instances: &InstanceMap, key: &InstanceKey) -> Option<Arc<S>> {
    instances
        .get(key)
        .and_then(|instance| Arc::clone(instance).downcast::<S>().ok())
}
