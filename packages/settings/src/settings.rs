// ABOUTME: Settings handle and the AppSettings trait implemented by every settings type
// ABOUTME: Maps property names to store keys, applies defaults, and keeps ignored values in memory

use appsettings_storage::{KeyValueStore, StoredValue};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::context::SettingsContext;
use crate::error::{SettingsError, SettingsResult};
use crate::property::PropertyValue;
use crate::schema::{schema_for, DefaultValues, Schema, SchemaBuilder};
use crate::types::PropertyDescriptor;
use crate::validation::validate_value;

/// Per-instance state shared by every settings type
///
/// Persisted properties read and write through the store. Ignored
/// properties live in `transient` and are dropped with the instance.
pub struct SettingsHandle {
    schema: Arc<Schema>,
    identifier: Option<String>,
    suite_name: Option<String>,
    store: Arc<dyn KeyValueStore>,
    transient: RwLock<HashMap<String, StoredValue>>,
}

impl SettingsHandle {
    /// Create the handle and write any default whose entry is missing
    pub fn new(
        schema: Arc<Schema>,
        identifier: Option<String>,
        suite_name: Option<String>,
        store: Arc<dyn KeyValueStore>,
    ) -> SettingsResult<Self> {
        let handle = Self {
            schema,
            identifier,
            suite_name,
            store,
            transient: RwLock::new(HashMap::new()),
        };
        handle.apply_defaults()?;
        Ok(handle)
    }

    fn apply_defaults(&self) -> SettingsResult<()> {
        let mut applied = 0;
        for (name, value) in self.schema.defaults() {
            if self.schema.is_ignored(name) {
                self.transient
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
                continue;
            }

            let key = self.key_for(name);
            if !self.store.contains(&key) {
                self.store.set(&key, value.clone())?;
                applied += 1;
            }
        }

        if applied > 0 {
            info!(
                "Applied {} default value(s) to {} in '{}'",
                applied,
                self.schema.type_key(),
                self.store.name()
            );
        }
        Ok(())
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn suite_name(&self) -> Option<&str> {
        self.suite_name.as_deref()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Store key for a property of this instance
    pub fn key_for(&self, name: &str) -> String {
        match &self.identifier {
            Some(identifier) => format!("{}.{}.{}", self.schema.type_key(), identifier, name),
            None => format!("{}.{}", self.schema.type_key(), name),
        }
    }

    fn descriptor(&self, name: &str) -> SettingsResult<&PropertyDescriptor> {
        self.schema
            .property(name)
            .ok_or_else(|| SettingsError::UnknownProperty(name.to_string()))
    }

    /// Current value of a property, `None` when nothing is set
    pub fn value(&self, name: &str) -> SettingsResult<Option<StoredValue>> {
        self.descriptor(name)?;

        if self.schema.is_ignored(name) {
            return Ok(self
                .transient
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(name)
                .cloned());
        }
        Ok(self.store.get(&self.key_for(name)))
    }

    /// Validate and store a value for a property
    pub fn set_value(&self, name: &str, value: StoredValue) -> SettingsResult<()> {
        let descriptor = self.descriptor(name)?;
        validate_value(descriptor, &value)?;

        if self.schema.is_ignored(name) {
            debug!("Keeping ignored property '{}' in memory", name);
            self.transient
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(name.to_string(), value);
            return Ok(());
        }

        self.store.set(&self.key_for(name), value)?;
        Ok(())
    }

    pub fn remove_value(&self, name: &str) -> SettingsResult<()> {
        self.descriptor(name)?;

        if self.schema.is_ignored(name) {
            self.transient
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(name);
            return Ok(());
        }

        self.store.remove(&self.key_for(name))?;
        Ok(())
    }

    /// Typed read; unset, unknown, or untranslatable values read as `T::default()`
    pub fn get<T: PropertyValue + Default>(&self, name: &str) -> T {
        match self.value(name) {
            Ok(Some(stored)) => T::from_stored(&stored).unwrap_or_else(|| {
                warn!(
                    "{}: stored {} for '{}' does not match the declared type",
                    self.schema.type_key(),
                    stored.kind(),
                    name
                );
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!("{}: {}", self.schema.type_key(), e);
                T::default()
            }
        }
    }

    /// Typed write; a value with no stored form (e.g. `None`) clears the entry
    pub fn set<T: PropertyValue>(&self, name: &str, value: T) -> SettingsResult<()> {
        match value.into_stored()? {
            Some(stored) => self.set_value(name, stored),
            None => self.remove_value(name),
        }
    }

    /// Remove every value of this instance, then re-apply defaults
    pub fn reset(&self) -> SettingsResult<()> {
        let keys: Vec<String> = self
            .schema
            .persisted_properties()
            .map(|descriptor| self.key_for(&descriptor.name))
            .collect();
        self.store.remove_all(&keys)?;
        self.transient
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        info!(
            "Reset {} (identifier: {:?})",
            self.schema.type_key(),
            self.identifier
        );
        self.apply_defaults()
    }

    /// Every declared property that currently has a value
    pub fn dictionary_representation(&self) -> BTreeMap<String, StoredValue> {
        self.schema
            .properties()
            .iter()
            .filter_map(|descriptor| {
                self.value(&descriptor.name)
                    .ok()
                    .flatten()
                    .map(|value| (descriptor.name.clone(), value))
            })
            .collect()
    }
}

/// A type whose properties are persisted automatically
///
/// Implementations are usually generated by [`app_settings!`](crate::app_settings).
/// Instances are obtained through the factory functions, which return the
/// same `Arc` for the same identifier and suite.
pub trait AppSettings: Any + Send + Sync + Sized {
    /// Register every property of the type
    fn declare_properties(schema: &mut SchemaBuilder);

    fn from_handle(handle: SettingsHandle) -> Self;

    fn handle(&self) -> &SettingsHandle;

    /// Properties kept in memory only
    fn ignored_properties() -> Vec<&'static str> {
        Vec::new()
    }

    /// Values written when a property has no stored entry
    fn default_property_values() -> DefaultValues {
        DefaultValues::new()
    }

    /// Prefix of every store key written by this type
    ///
    /// Defaults to the fully qualified type path so that same-named types
    /// in different modules never share entries. Override it to pin a
    /// shorter or stable key.
    fn type_key() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn schema() -> Arc<Schema> {
        schema_for::<Self>()
    }

    fn default_settings() -> SettingsResult<Arc<Self>> {
        Self::default_settings_in(SettingsContext::global())
    }

    fn default_settings_in(context: &SettingsContext) -> SettingsResult<Arc<Self>> {
        context.instance::<Self>(None, None)
    }

    fn with_identifier(identifier: &str) -> SettingsResult<Arc<Self>> {
        Self::with_identifier_in(SettingsContext::global(), identifier)
    }

    fn with_identifier_in(context: &SettingsContext, identifier: &str) -> SettingsResult<Arc<Self>> {
        context.instance::<Self>(Some(identifier), None)
    }

    fn with_suite_name(suite_name: &str) -> SettingsResult<Arc<Self>> {
        Self::with_suite_name_in(SettingsContext::global(), suite_name)
    }

    fn with_suite_name_in(context: &SettingsContext, suite_name: &str) -> SettingsResult<Arc<Self>> {
        context.instance::<Self>(None, Some(suite_name))
    }

    fn with_identifier_and_suite(identifier: &str, suite_name: &str) -> SettingsResult<Arc<Self>> {
        Self::with_identifier_and_suite_in(SettingsContext::global(), identifier, suite_name)
    }

    fn with_identifier_and_suite_in(
        context: &SettingsContext,
        identifier: &str,
        suite_name: &str,
    ) -> SettingsResult<Arc<Self>> {
        context.instance::<Self>(Some(identifier), Some(suite_name))
    }

    fn identifier(&self) -> Option<&str> {
        self.handle().identifier()
    }

    fn suite_name(&self) -> Option<&str> {
        self.handle().suite_name()
    }

    fn properties(&self) -> &[PropertyDescriptor] {
        self.handle().schema().properties()
    }

    fn value_for_key(&self, key: &str) -> SettingsResult<Option<StoredValue>> {
        self.handle().value(key)
    }

    fn set_value_for_key(&self, key: &str, value: StoredValue) -> SettingsResult<()> {
        self.handle().set_value(key, value)
    }

    fn remove_value_for_key(&self, key: &str) -> SettingsResult<()> {
        self.handle().remove_value(key)
    }

    fn reset(&self) -> SettingsResult<()> {
        self.handle().reset()
    }

    fn dictionary_representation(&self) -> BTreeMap<String, StoredValue> {
        self.handle().dictionary_representation()
    }
}
