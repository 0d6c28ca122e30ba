// ABOUTME: Input validation for settings values
// ABOUTME: Type-specific checks for stored values and parsing of textual input per descriptor

use appsettings_storage::{StoredValue, ValueKind};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

use crate::types::{DataType, ObjectClass, PropertyDescriptor};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid boolean value: {0}. Must be 'true' or 'false'")]
    InvalidBoolean(String),

    #[error("Invalid integer value: {0}. {1}")]
    InvalidInteger(String, String),

    #[error("Invalid number value: {0}. {1}")]
    InvalidNumber(String, String),

    #[error("Invalid date value: {0}. Must be an RFC 3339 timestamp")]
    InvalidDate(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid data value: {0}. Must be base64")]
    InvalidData(String),

    #[error("Invalid {0} value: {1}")]
    InvalidJson(String, String),

    #[error("Value cannot be empty")]
    EmptyValue,

    #[error("Type mismatch for '{property}': expected {expected}, found {found}")]
    TypeMismatch {
        property: String,
        expected: String,
        found: ValueKind,
    },

    #[error("Failed to encode {0}: {1}")]
    Encoding(String, String),

    #[error("Array element {0} has no value")]
    MissingElement(usize),
}

/// Check that a stored value can back the described property
pub fn validate_value(
    descriptor: &PropertyDescriptor,
    value: &StoredValue,
) -> Result<(), ValidationError> {
    let matches = match descriptor.data_type {
        DataType::Unknown => true,
        DataType::Int => match value {
            StoredValue::Integer(integer) => {
                validate_integer_range(descriptor, *integer)?;
                true
            }
            _ => false,
        },
        DataType::Float | DataType::Double => match value {
            StoredValue::Integer(_) => true,
            StoredValue::Real(number) => {
                validate_finite(*number)?;
                true
            }
            _ => false,
        },
        DataType::Bool => matches!(value, StoredValue::Bool(_)),
        DataType::String => matches!(value, StoredValue::String(_)),
        DataType::Array => matches!(value, StoredValue::Array(_)),
        DataType::Dictionary => matches!(value, StoredValue::Dictionary(_)),
        DataType::Object => match (descriptor.object_class, value) {
            (None, _) => true,
            (Some(ObjectClass::Date), StoredValue::Date(_)) => true,
            (Some(ObjectClass::Url), StoredValue::String(text)) => {
                validate_url(text)?;
                true
            }
            (Some(ObjectClass::Data | ObjectClass::Archived(_)), StoredValue::Data(_)) => true,
            _ => false,
        },
    };

    if matches {
        Ok(())
    } else {
        Err(ValidationError::TypeMismatch {
            property: descriptor.name.clone(),
            expected: descriptor.type_label(),
            found: value.kind(),
        })
    }
}

/// Parse textual input (e.g. from the command line) for the described property
pub fn parse_value(
    descriptor: &PropertyDescriptor,
    input: &str,
) -> Result<StoredValue, ValidationError> {
    // Strings may legitimately be empty, nothing else may
    if descriptor.data_type == DataType::String {
        return Ok(StoredValue::String(input.to_string()));
    }
    let value = input.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyValue);
    }

    let parsed = match descriptor.data_type {
        DataType::Bool => StoredValue::Bool(parse_boolean(value)?),
        DataType::Int => StoredValue::Integer(parse_integer(value)?),
        DataType::Float | DataType::Double => StoredValue::Real(parse_number(value)?),
        DataType::String => StoredValue::String(input.to_string()),
        DataType::Array => {
            let parsed = parse_json(value, "array")?;
            if !matches!(parsed, StoredValue::Array(_)) {
                return Err(ValidationError::InvalidJson(
                    "array".to_string(),
                    "Must be a JSON array".to_string(),
                ));
            }
            parsed
        }
        DataType::Dictionary => {
            let parsed = parse_json(value, "dictionary")?;
            if !matches!(parsed, StoredValue::Dictionary(_)) {
                return Err(ValidationError::InvalidJson(
                    "dictionary".to_string(),
                    "Must be a JSON object".to_string(),
                ));
            }
            parsed
        }
        DataType::Object => match descriptor.object_class {
            Some(ObjectClass::Date) => StoredValue::Date(parse_date(value)?),
            Some(ObjectClass::Url) => {
                validate_url(value)?;
                StoredValue::String(value.to_string())
            }
            Some(ObjectClass::Data) => StoredValue::Data(parse_data(value)?),
            Some(ObjectClass::Archived(type_name)) => {
                // Archived objects are entered as their JSON encoding
                serde_json::from_str::<serde_json::Value>(value)
                    .map_err(|e| ValidationError::InvalidJson(type_name.to_string(), e.to_string()))?;
                StoredValue::Data(value.as_bytes().to_vec())
            }
            None => parse_untyped(value),
        },
        DataType::Unknown => parse_untyped(value),
    };

    validate_value(descriptor, &parsed)?;
    Ok(parsed)
}

/// Parse boolean value
fn parse_boolean(value: &str) -> Result<bool, ValidationError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValidationError::InvalidBoolean(value.to_string())),
    }
}

/// Parse integer value
fn parse_integer(value: &str) -> Result<i64, ValidationError> {
    value.parse::<i64>().map_err(|_| {
        ValidationError::InvalidInteger(value.to_string(), "Not a valid integer".to_string())
    })
}

/// Parse floating point value, rejecting NaN and infinities
fn parse_number(value: &str) -> Result<f64, ValidationError> {
    let parsed = value.parse::<f64>().map_err(|_| {
        ValidationError::InvalidNumber(value.to_string(), "Not a valid number".to_string())
    })?;
    validate_finite(parsed)?;
    Ok(parsed)
}

fn validate_integer_range(
    descriptor: &PropertyDescriptor,
    value: i64,
) -> Result<(), ValidationError> {
    match descriptor.integer_range {
        Some((min, max)) if value < min || value > max => Err(ValidationError::InvalidInteger(
            value.to_string(),
            format!("Must be between {} and {}", min, max),
        )),
        _ => Ok(()),
    }
}

fn validate_finite(number: f64) -> Result<(), ValidationError> {
    if number.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::InvalidNumber(
            number.to_string(),
            "Must be finite".to_string(),
        ))
    }
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

fn parse_data(value: &str) -> Result<Vec<u8>, ValidationError> {
    STANDARD
        .decode(value.as_bytes())
        .map_err(|_| ValidationError::InvalidData(value.to_string()))
}

/// Validate URL: must be absolute and contain no spaces
fn validate_url(value: &str) -> Result<(), ValidationError> {
    if value.contains(' ') {
        return Err(ValidationError::InvalidUrl(
            "URL cannot contain spaces".to_string(),
        ));
    }

    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", value, e)))
}

fn parse_json(value: &str, expected: &str) -> Result<StoredValue, ValidationError> {
    let json: serde_json::Value = serde_json::from_str(value)
        .map_err(|e| ValidationError::InvalidJson(expected.to_string(), e.to_string()))?;
    json_to_stored(json)
        .ok_or_else(|| ValidationError::InvalidJson(expected.to_string(), "null is not allowed".to_string()))
}

/// JSON when it parses, a plain string otherwise
fn parse_untyped(value: &str) -> StoredValue {
    serde_json::from_str::<serde_json::Value>(value)
        .ok()
        .and_then(json_to_stored)
        .unwrap_or_else(|| StoredValue::String(value.to_string()))
}

fn json_to_stored(json: serde_json::Value) -> Option<StoredValue> {
    use serde_json::Value;

    match json {
        Value::Null => None,
        Value::Bool(b) => Some(StoredValue::Bool(b)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Some(StoredValue::Integer(integer)),
            None => number.as_f64().map(StoredValue::Real),
        },
        Value::String(text) => Some(StoredValue::String(text)),
        Value::Array(items) => items
            .into_iter()
            .map(json_to_stored)
            .collect::<Option<Vec<_>>>()
            .map(StoredValue::Array),
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, item)| json_to_stored(item).map(|v| (key, v)))
            .collect::<Option<BTreeMap<_, _>>>()
            .map(StoredValue::Dictionary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn descriptor(data_type: DataType, object_class: Option<ObjectClass>) -> PropertyDescriptor {
        PropertyDescriptor::new("property", data_type, object_class)
    }

    #[test]
    fn test_parse_boolean_valid() {
        assert_eq!(parse_boolean("true"), Ok(true));
        assert_eq!(parse_boolean("false"), Ok(false));
    }

    #[test]
    fn test_parse_boolean_invalid() {
        assert!(parse_boolean("yes").is_err());
        assert!(parse_boolean("no").is_err());
        assert!(parse_boolean("1").is_err());
        assert!(parse_boolean("0").is_err());
        assert!(parse_boolean("True").is_err());
        assert!(parse_boolean("FALSE").is_err());
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("123"), Ok(123));
        assert_eq!(parse_integer("0"), Ok(0));
        assert_eq!(parse_integer("-1"), Ok(-1));
        assert!(parse_integer("abc").is_err());
        assert!(parse_integer("1.5").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("6.1"), Ok(6.1));
        assert_eq!(parse_number("4"), Ok(4.0));
        assert!(parse_number("NaN").is_err());
        assert!(parse_number("inf").is_err());
        assert!(parse_number("tall").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://localhost:3000").is_ok());
        assert!(validate_url("file:///tmp/portal.txt").is_ok());
        assert!(validate_url("invalid-url").is_err());
        assert!(validate_url("https://example.com/path with spaces").is_err());
    }

    #[test]
    fn test_validate_value_type_mismatch() {
        let result = validate_value(
            &PropertyDescriptor::new("age", DataType::Int, None),
            &StoredValue::from("seventy"),
        );

        assert_eq!(
            result,
            Err(ValidationError::TypeMismatch {
                property: "age".to_string(),
                expected: "int".to_string(),
                found: ValueKind::String,
            })
        );
    }

    #[test]
    fn test_validate_value_integer_range() {
        let hits = PropertyDescriptor::new("hits", DataType::Int, None)
            .with_integer_range(Some((0, i64::from(u32::MAX))));

        assert!(validate_value(&hits, &StoredValue::Integer(12)).is_ok());
        assert!(matches!(
            validate_value(&hits, &StoredValue::Integer(-5)),
            Err(ValidationError::InvalidInteger(_, _))
        ));
        assert!(validate_value(&hits, &StoredValue::Integer(i64::from(u32::MAX) + 1)).is_err());
        assert!(matches!(
            parse_value(&hits, "-5"),
            Err(ValidationError::InvalidInteger(_, _))
        ));
    }

    #[rstest]
    #[case(DataType::Int, None, StoredValue::Integer(1))]
    #[case(DataType::Float, None, StoredValue::Integer(1))]
    #[case(DataType::Double, None, StoredValue::Real(6.1))]
    #[case(DataType::Bool, None, StoredValue::Bool(true))]
    #[case(DataType::String, None, StoredValue::from("Rick"))]
    #[case(DataType::Array, None, StoredValue::Array(Vec::new()))]
    #[case(DataType::Dictionary, None, StoredValue::Dictionary(BTreeMap::new()))]
    #[case(DataType::Object, Some(ObjectClass::Url), StoredValue::from("https://example.com"))]
    #[case(DataType::Object, Some(ObjectClass::Data), StoredValue::Data(vec![1]))]
    #[case(DataType::Object, Some(ObjectClass::Archived("Color")), StoredValue::Data(vec![1]))]
    #[case(DataType::Unknown, None, StoredValue::Bool(false))]
    fn test_validate_value_accepts(
        #[case] data_type: DataType,
        #[case] object_class: Option<ObjectClass>,
        #[case] value: StoredValue,
    ) {
        assert!(validate_value(&descriptor(data_type, object_class), &value).is_ok());
    }

    #[rstest]
    #[case(DataType::Int, None, StoredValue::Real(1.5))]
    #[case(DataType::Double, None, StoredValue::Real(f64::NAN))]
    #[case(DataType::Bool, None, StoredValue::Integer(1))]
    #[case(DataType::String, None, StoredValue::Integer(1))]
    #[case(DataType::Array, None, StoredValue::from("[]"))]
    #[case(DataType::Object, Some(ObjectClass::Date), StoredValue::from("2018-05-28"))]
    #[case(DataType::Object, Some(ObjectClass::Url), StoredValue::from("not a url"))]
    #[case(DataType::Object, Some(ObjectClass::Data), StoredValue::from("AQID"))]
    fn test_validate_value_rejects(
        #[case] data_type: DataType,
        #[case] object_class: Option<ObjectClass>,
        #[case] value: StoredValue,
    ) {
        assert!(validate_value(&descriptor(data_type, object_class), &value).is_err());
    }

    #[test]
    fn test_parse_value_scalars() {
        assert_eq!(
            parse_value(&descriptor(DataType::Bool, None), "true"),
            Ok(StoredValue::Bool(true))
        );
        assert_eq!(
            parse_value(&descriptor(DataType::Int, None), " 70 "),
            Ok(StoredValue::Integer(70))
        );
        assert_eq!(
            parse_value(&descriptor(DataType::Double, None), "6.1"),
            Ok(StoredValue::Real(6.1))
        );
        assert_eq!(
            parse_value(&descriptor(DataType::String, None), ""),
            Ok(StoredValue::from(""))
        );
    }

    #[test]
    fn test_parse_value_empty() {
        assert_eq!(
            parse_value(&descriptor(DataType::Int, None), "  "),
            Err(ValidationError::EmptyValue)
        );
    }

    #[test]
    fn test_parse_value_collections() {
        assert_eq!(
            parse_value(&descriptor(DataType::Array, None), r#"["Morty", "Summer"]"#),
            Ok(StoredValue::Array(vec![
                StoredValue::from("Morty"),
                StoredValue::from("Summer")
            ]))
        );

        let mut expected = BTreeMap::new();
        expected.insert("English".to_string(), StoredValue::from("Justin Roiland"));
        assert_eq!(
            parse_value(
                &descriptor(DataType::Dictionary, None),
                r#"{"English": "Justin Roiland"}"#
            ),
            Ok(StoredValue::Dictionary(expected))
        );

        assert!(parse_value(&descriptor(DataType::Array, None), r#"{"a": 1}"#).is_err());
        assert!(parse_value(&descriptor(DataType::Array, None), "[null]").is_err());
        assert!(parse_value(&descriptor(DataType::Dictionary, None), "[1]").is_err());
    }

    #[test]
    fn test_parse_value_objects() {
        let date = parse_value(
            &descriptor(DataType::Object, Some(ObjectClass::Date)),
            "1962-05-10T07:00:00Z",
        )
        .unwrap();
        assert_eq!(date.as_date().unwrap().timestamp(), -241290000);

        assert_eq!(
            parse_value(
                &descriptor(DataType::Object, Some(ObjectClass::Url)),
                "https://example.com"
            ),
            Ok(StoredValue::from("https://example.com"))
        );
        assert_eq!(
            parse_value(&descriptor(DataType::Object, Some(ObjectClass::Data)), "AQID"),
            Ok(StoredValue::Data(vec![1, 2, 3]))
        );
        assert_eq!(
            parse_value(
                &descriptor(DataType::Object, Some(ObjectClass::Archived("Color"))),
                r#"{"r":1.0}"#
            ),
            Ok(StoredValue::Data(br#"{"r":1.0}"#.to_vec()))
        );

        assert!(parse_value(
            &descriptor(DataType::Object, Some(ObjectClass::Date)),
            "yesterday"
        )
        .is_err());
        assert!(parse_value(
            &descriptor(DataType::Object, Some(ObjectClass::Archived("Color"))),
            "{broken"
        )
        .is_err());
    }

    #[test]
    fn test_parse_value_untyped() {
        assert_eq!(
            parse_value(&descriptor(DataType::Unknown, None), "42"),
            Ok(StoredValue::Integer(42))
        );
        assert_eq!(
            parse_value(&descriptor(DataType::Unknown, None), "hello"),
            Ok(StoredValue::from("hello"))
        );
    }
}
