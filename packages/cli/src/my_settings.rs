// ABOUTME: Example settings type driven by the appsettings binary
// ABOUTME: One property per supported category, an archived colour, an ignored note and a computed summary

use app_settings::{app_settings, Archived};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// RGB colour stored as an archived blob
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

app_settings! {
    /// Settings edited by the `appsettings` command
    pub struct MyAppSettings {
        bool_property, set_bool_property: bool;
        integer_property, set_integer_property: i64;
        float_property, set_float_property: f32;
        double_property, set_double_property: f64;
        string_property, set_string_property: String;
        date_property, set_date_property: Option<DateTime<Utc>>;
        url_property, set_url_property: Option<Url>;
        array_property, set_array_property: Vec<String>;
        dictionary_property, set_dictionary_property: BTreeMap<String, String>;
        accent_color, set_accent_color: Option<Archived<Color>>;
        /// Scratch text that is never written to disk
        scratch_note, set_scratch_note: String;
    }
    ignored: [scratch_note];
    defaults: { bool_property => true, integer_property => 42_i64 };
    readonly: {
        /// Computed from other properties, never stored
        read_only_string: String = |settings| {
            format!("{} x{}", settings.string_property(), settings.integer_property())
        },
    };
}
