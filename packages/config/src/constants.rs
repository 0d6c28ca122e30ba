// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names and defaults used by appsettings

// Store Location
pub const APPSETTINGS_HOME: &str = "APPSETTINGS_HOME";
pub const APPSETTINGS_APP_ID: &str = "APPSETTINGS_APP_ID";

// Store Backend ("file" or "memory")
pub const APPSETTINGS_BACKEND: &str = "APPSETTINGS_BACKEND";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";

// Defaults
pub const DEFAULT_APP_ID: &str = "default";
pub const DEFAULT_DIR_NAME: &str = "appsettings";
pub const FALLBACK_DIR_NAME: &str = ".appsettings";
pub const DEFAULT_LOG_FILTER: &str = "warn";
