// ABOUTME: Per-type property schema and the process-wide schema cache
// ABOUTME: Collects declared descriptors, ignored names, and default values once per settings type

use appsettings_storage::StoredValue;
use lazy_static::lazy_static;
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::property::PropertyValue;
use crate::settings::AppSettings;
use crate::types::PropertyDescriptor;
use crate::validation::validate_value;

lazy_static! {
    static ref SCHEMA_CACHE: RwLock<HashMap<TypeId, Arc<Schema>>> = RwLock::new(HashMap::new());
}

/// Everything known statically about one settings type
#[derive(Debug, Clone)]
pub struct Schema {
    type_key: String,
    properties: Vec<PropertyDescriptor>,
    index: HashMap<String, usize>,
    ignored: HashSet<String>,
    defaults: BTreeMap<String, StoredValue>,
}

impl Schema {
    /// Prefix used for every store key of this type
    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    /// Descriptors in declaration order
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    /// Descriptors whose values reach the store
    pub fn persisted_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties
            .iter()
            .filter(|descriptor| !self.ignored.contains(&descriptor.name))
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    pub fn ignored(&self) -> impl Iterator<Item = &str> {
        self.ignored.iter().map(String::as_str)
    }

    pub fn defaults(&self) -> &BTreeMap<String, StoredValue> {
        &self.defaults
    }
}

/// Receives property declarations from `AppSettings::declare_properties`
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    properties: Vec<PropertyDescriptor>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property backed by `T`
    pub fn property<T: PropertyValue>(&mut self, name: &str) -> &mut Self {
        self.descriptor(
            PropertyDescriptor::new(name, T::DATA_TYPE, T::object_class())
                .with_integer_range(T::integer_range()),
        )
    }

    pub fn descriptor(&mut self, descriptor: PropertyDescriptor) -> &mut Self {
        if let Some(existing) = self
            .properties
            .iter_mut()
            .find(|existing| existing.name == descriptor.name)
        {
            warn!(
                "Property '{}' declared more than once, keeping the last declaration",
                descriptor.name
            );
            *existing = descriptor;
        } else {
            self.properties.push(descriptor);
        }
        self
    }

    pub fn build(self, type_key: &str, ignored: &[&str], defaults: DefaultValues) -> Schema {
        let index: HashMap<String, usize> = self
            .properties
            .iter()
            .enumerate()
            .map(|(i, descriptor)| (descriptor.name.clone(), i))
            .collect();

        let mut ignored_names = HashSet::new();
        for name in ignored {
            if index.contains_key(*name) {
                ignored_names.insert(name.to_string());
            } else {
                warn!(
                    "{}: ignored property '{}' is not declared, skipping",
                    type_key, name
                );
            }
        }

        let mut default_values = BTreeMap::new();
        for (name, value) in defaults.values {
            let Some(&i) = index.get(&name) else {
                warn!(
                    "{}: default for undeclared property '{}', skipping",
                    type_key, name
                );
                continue;
            };
            match validate_value(&self.properties[i], &value) {
                Ok(()) => {
                    default_values.insert(name, value);
                }
                Err(e) => warn!("{}: invalid default for '{}': {}", type_key, name, e),
            }
        }

        debug!(
            "Built schema for {}: {} properties, {} ignored, {} defaults",
            type_key,
            self.properties.len(),
            ignored_names.len(),
            default_values.len()
        );

        Schema {
            type_key: type_key.to_string(),
            properties: self.properties,
            index,
            ignored: ignored_names,
            defaults: default_values,
        }
    }
}

/// Default values keyed by property name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultValues {
    values: BTreeMap<String, StoredValue>,
}

impl DefaultValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: PropertyValue>(self, name: &str, value: T) -> Self {
        match value.into_stored() {
            Ok(Some(stored)) => self.with_stored(name, stored),
            Ok(None) => self,
            Err(e) => {
                warn!("Default for '{}' could not be encoded: {}", name, e);
                self
            }
        }
    }

    pub fn with_stored(mut self, name: &str, value: StoredValue) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&StoredValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Schema for `S`, built on first use and shared afterwards
pub fn schema_for<S: AppSettings>() -> Arc<Schema> {
    let type_id = TypeId::of::<S>();

    if let Some(schema) = SCHEMA_CACHE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
    {
        return Arc::clone(schema);
    }

    debug!("Schema cache miss for {}", S::type_key());
    let mut builder = SchemaBuilder::new();
    S::declare_properties(&mut builder);
    let schema = Arc::new(builder.build(
        S::type_key(),
        &S::ignored_properties(),
        S::default_property_values(),
    ));

    // Two threads may build concurrently; the first insert wins
    let mut cache = SCHEMA_CACHE.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(cache.entry(type_id).or_insert(schema))
}
