// ABOUTME: Command implementations behind the appsettings binary
// ABOUTME: Schema and value tables, keyed get/set/unset/reset, and the demo walkthrough

use app_settings::{
    parse_value, AppSettings, ObjectClass, PropertyDescriptor, SettingsContext, SettingsError,
    SettingsResult, StoredValue,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{TimeZone, Utc};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::my_settings::MyAppSettings;

const UNSET: &str = "—";

/// Render a stored value the way `set` accepts it back
pub fn format_value(descriptor: &PropertyDescriptor, value: &StoredValue) -> String {
    match (descriptor.object_class, value) {
        (Some(ObjectClass::Archived(_)), StoredValue::Data(bytes)) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
        (Some(ObjectClass::Data), StoredValue::Data(bytes)) => STANDARD.encode(bytes),
        _ => value.to_string(),
    }
}

fn descriptor<'a, S: AppSettings>(settings: &'a S, key: &str) -> SettingsResult<&'a PropertyDescriptor> {
    settings
        .properties()
        .iter()
        .find(|descriptor| descriptor.name == key)
        .ok_or_else(|| SettingsError::UnknownProperty(key.to_string()))
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// One row per declared property with its type, storage, and default
pub fn schema_table<S: AppSettings>() -> Table {
    let schema = S::schema();
    let mut table = new_table();
    table.set_header(vec!["Property", "Type", "Stored", "Default"]);

    for descriptor in schema.properties() {
        let stored = if schema.is_ignored(&descriptor.name) {
            "memory"
        } else {
            "store"
        };
        let default = schema
            .defaults()
            .get(&descriptor.name)
            .map(|value| format_value(descriptor, value))
            .unwrap_or_else(|| UNSET.to_string());

        table.add_row(vec![
            descriptor.name.clone(),
            descriptor.type_label(),
            stored.to_string(),
            default,
        ]);
    }
    table
}

/// Current value of every property, in declaration order
pub fn show_table<S: AppSettings>(settings: &S) -> Table {
    let values = settings.dictionary_representation();
    let mut table = new_table();
    table.set_header(vec!["Property", "Value"]);

    for descriptor in settings.properties() {
        let value = values
            .get(&descriptor.name)
            .map(|value| format_value(descriptor, value))
            .unwrap_or_else(|| UNSET.to_string());
        table.add_row(vec![descriptor.name.clone(), value]);
    }
    table
}

pub fn get_value<S: AppSettings>(settings: &S, key: &str) -> SettingsResult<Option<String>> {
    let descriptor = descriptor(settings, key)?;
    Ok(settings
        .value_for_key(key)?
        .map(|value| format_value(descriptor, &value)))
}

/// Parse `text` for the property's type and store it
pub fn set_value<S: AppSettings>(settings: &S, key: &str, text: &str) -> SettingsResult<()> {
    let descriptor = descriptor(settings, key)?;
    let value = parse_value(descriptor, text)?;
    settings.set_value_for_key(key, value)?;
    info!("Set {} for {:?}", key, settings.identifier());
    Ok(())
}

pub fn unset_value<S: AppSettings>(settings: &S, key: &str) -> SettingsResult<()> {
    settings.remove_value_for_key(key)
}

pub fn reset<S: AppSettings>(settings: &S) -> SettingsResult<()> {
    settings.reset()
}

/// Write sample values to the default and "Morty" instances, then read them back
pub fn run_demo(context: &SettingsContext) -> SettingsResult<Vec<String>> {
    let mut lines = vec!["Saving settings".to_string()];

    {
        let settings = MyAppSettings::default_settings_in(context)?;
        settings.set_string_property("Rick")?;
        settings.set_integer_property(70)?;
        settings.set_double_property(6.1)?;
        if let Some(birthdate) = Utc.timestamp_opt(-241290000, 0).single() {
            settings.set_date_property(birthdate)?;
        }
        settings.set_array_property(vec!["Morty".to_string(), "Summer".to_string()])?;
        settings.set_dictionary_property(BTreeMap::from([(
            "English".to_string(),
            "Justin Roiland".to_string(),
        )]))?;
        if let Ok(url) = Url::parse("https://example.com/citadel") {
            settings.set_url_property(url)?;
        }
        lines.push("Settings saved".to_string());
    }

    let settings = MyAppSettings::default_settings_in(context)?;
    lines.push(format!(
        "Default settings name: {} age: {}",
        settings.string_property(),
        settings.integer_property()
    ));

    lines.push("Creating second set of data".to_string());
    {
        let other = MyAppSettings::with_identifier_in(context, "Morty")?;
        other.set_string_property("Morty")?;
        other.set_integer_property(14)?;
        other.set_double_property(4.6)?;
        other.set_array_property(vec!["Rick".to_string(), "Summer".to_string()])?;
        lines.push("Settings saved".to_string());
    }

    let other = MyAppSettings::with_identifier_in(context, "Morty")?;
    lines.push(format!(
        "Other settings name: {} age: {}",
        other.string_property(),
        other.integer_property()
    ));

    Ok(lines)
}

/// Resolve the instance selected by the global options
pub fn open_settings(
    context: &SettingsContext,
    identifier: Option<&str>,
    suite: Option<&str>,
) -> SettingsResult<Arc<MyAppSettings>> {
    context.instance::<MyAppSettings>(identifier, suite)
}
