// ABOUTME: Typed application settings backed by a persistent key-value store
// ABOUTME: Settings types declare properties once and read and write them through cached instances

#[macro_use]
mod macros;

pub mod context;
pub mod error;
pub mod property;
pub mod schema;
pub mod settings;
pub mod types;
pub mod validation;

pub use context::SettingsContext;
pub use error::{SettingsError, SettingsResult};
pub use property::{short_type_name, Archived, Data, PropertyValue};
pub use schema::{schema_for, DefaultValues, Schema, SchemaBuilder};
pub use settings::{AppSettings, SettingsHandle};
pub use types::{DataType, ObjectClass, PropertyDescriptor};
pub use validation::{parse_value, validate_value, ValidationError};

// Storage layer types used in the public API
pub use appsettings_config::{Backend, StoreConfig};
pub use appsettings_storage::{
    Defaults, FileStore, KeyValueStore, MemoryStore, StorageError, StoredValue, ValueKind,
};
