// ABOUTME: Key-value persistence for appsettings domains
// ABOUTME: Stored value model, store trait, memory and JSON-file backends, and the suite registry

pub mod defaults;
pub mod error;
pub mod file;
pub mod store;
pub mod value;

// Re-export main types for convenience
pub use defaults::{validate_suite_name, Defaults};
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use store::{KeyValueStore, MemoryStore};
pub use value::{StoredValue, ValueKind};
