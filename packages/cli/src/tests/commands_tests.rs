// ABOUTME: Tests for the CLI command implementations
// ABOUTME: Exercise parsing, formatting, scoping, and the demo against in-memory and file stores

use crate::commands::{
    format_value, get_value, open_settings, reset, run_demo, schema_table, set_value, show_table,
    unset_value,
};
use crate::my_settings::{Color, MyAppSettings};
use app_settings::{AppSettings, Archived, SettingsContext, SettingsError, StoreConfig, StoredValue};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

#[test]
fn test_defaults_are_visible() {
    let context = SettingsContext::in_memory();
    let settings = open_settings(&context, None, None).unwrap();

    assert!(settings.bool_property());
    assert_eq!(settings.integer_property(), 42);
    assert_eq!(
        get_value(settings.as_ref(), "integer_property").unwrap(),
        Some("42".to_string())
    );
    assert_eq!(get_value(settings.as_ref(), "string_property").unwrap(), None);
}

#[rstest]
#[case("bool_property", "false", "false")]
#[case("integer_property", "7", "7")]
#[case("double_property", "6.1", "6.1")]
#[case("string_property", "Wubba lubba dub dub", "Wubba lubba dub dub")]
#[case("date_property", "1962-05-10T07:00:00Z", "1962-05-10T07:00:00Z")]
#[case("url_property", "https://example.com/citadel", "https://example.com/citadel")]
#[case("array_property", r#"["Morty", "Summer"]"#, "[Morty, Summer]")]
#[case("accent_color", r#"{"red":1.0,"green":0.5,"blue":0.0}"#, r#"{"red":1.0,"green":0.5,"blue":0.0}"#)]
fn test_set_then_get(#[case] key: &str, #[case] input: &str, #[case] expected: &str) {
    let context = SettingsContext::in_memory();
    let settings = open_settings(&context, None, None).unwrap();

    set_value(settings.as_ref(), key, input).unwrap();

    assert_eq!(
        get_value(settings.as_ref(), key).unwrap(),
        Some(expected.to_string())
    );
}

#[test]
fn test_set_archived_color_reads_typed() {
    let context = SettingsContext::in_memory();
    let settings = open_settings(&context, None, None).unwrap();

    set_value(
        settings.as_ref(),
        "accent_color",
        r#"{"red":1.0,"green":0.5,"blue":0.0}"#,
    )
    .unwrap();

    assert_eq!(
        settings.accent_color().map(Archived::into_inner),
        Some(Color {
            red: 1.0,
            green: 0.5,
            blue: 0.0,
        })
    );
}

#[rstest]
#[case("integer_property", "forty-two")]
#[case("bool_property", "yes")]
#[case("url_property", "not a url")]
#[case("date_property", "yesterday")]
fn test_set_rejects_invalid_text(#[case] key: &str, #[case] input: &str) {
    let context = SettingsContext::in_memory();
    let settings = open_settings(&context, None, None).unwrap();

    assert!(matches!(
        set_value(settings.as_ref(), key, input),
        Err(SettingsError::Validation(_))
    ));
}

#[test]
fn test_unknown_key() {
    let context = SettingsContext::in_memory();
    let settings = open_settings(&context, None, None).unwrap();

    assert!(matches!(
        get_value(settings.as_ref(), "catchphrase"),
        Err(SettingsError::UnknownProperty(_))
    ));
}

#[test]
fn test_unset_and_reset() {
    let context = SettingsContext::in_memory();
    let settings = open_settings(&context, Some("Morty"), None).unwrap();

    set_value(settings.as_ref(), "string_property", "Morty").unwrap();
    set_value(settings.as_ref(), "integer_property", "14").unwrap();

    unset_value(settings.as_ref(), "string_property").unwrap();
    assert_eq!(get_value(settings.as_ref(), "string_property").unwrap(), None);

    reset(settings.as_ref()).unwrap();
    assert_eq!(settings.integer_property(), 42);
}

#[test]
fn test_read_only_string_is_derived() {
    let context = SettingsContext::in_memory();
    let settings = open_settings(&context, None, None).unwrap();

    set_value(settings.as_ref(), "string_property", "Plumbus").unwrap();

    assert_eq!(settings.read_only_string(), "Plumbus x42");
    assert!(matches!(
        get_value(settings.as_ref(), "read_only_string"),
        Err(SettingsError::UnknownProperty(_))
    ));
}

#[test]
fn test_scratch_note_stays_in_memory() {
    let dir = TempDir::new().unwrap();
    let context = SettingsContext::from_config(StoreConfig::at(dir.path()));
    let settings = open_settings(&context, None, None).unwrap();

    set_value(settings.as_ref(), "scratch_note", "buy plumbus").unwrap();

    let contents = std::fs::read_to_string(dir.path().join("default.json")).unwrap();
    assert!(!contents.contains("plumbus"));
    assert_eq!(settings.scratch_note(), "buy plumbus");
}

#[test]
fn test_tables_list_every_property() {
    let context = SettingsContext::in_memory();
    let settings = open_settings(&context, None, None).unwrap();

    let schema = schema_table::<MyAppSettings>().to_string();
    let shown = show_table(settings.as_ref()).to_string();

    for descriptor in settings.properties() {
        assert!(schema.contains(&descriptor.name));
        assert!(shown.contains(&descriptor.name));
    }
    assert!(schema.contains("object<Color>"));
}

#[test]
fn test_format_archived_as_text() {
    let schema = MyAppSettings::schema();
    let color = schema.property("accent_color").unwrap();
    let text = schema.property("string_property").unwrap();

    assert_eq!(
        format_value(color, &StoredValue::Data(b"{}".to_vec())),
        "{}"
    );
    assert_eq!(format_value(text, &StoredValue::from("Rick")), "Rick");
}

#[test]
fn test_demo_separates_identifiers() {
    let context = SettingsContext::in_memory();

    let lines = run_demo(&context).unwrap();

    assert!(lines.contains(&"Default settings name: Rick age: 70".to_string()));
    assert!(lines.contains(&"Other settings name: Morty age: 14".to_string()));

    let rick = MyAppSettings::default_settings_in(&context).unwrap();
    let morty = MyAppSettings::with_identifier_in(&context, "Morty").unwrap();
    assert_eq!(rick.array_property(), vec!["Morty", "Summer"]);
    assert_eq!(morty.array_property(), vec!["Rick", "Summer"]);
    assert_eq!(
        rick.dictionary_property().get("English").map(String::as_str),
        Some("Justin Roiland")
    );
}
