// ABOUTME: Property-list style value model persisted by every store backend
// ABOUTME: Adjacently tagged JSON representation with base64 data and RFC 3339 dates

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value as the store sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum StoredValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    #[serde(with = "base64_data")]
    Data(Vec<u8>),
    Date(DateTime<Utc>),
    Array(Vec<StoredValue>),
    Dictionary(BTreeMap<String, StoredValue>),
}

/// Discriminant of a [`StoredValue`], used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Integer,
    Real,
    String,
    Data,
    Date,
    Array,
    Dictionary,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
            ValueKind::String => "string",
            ValueKind::Data => "data",
            ValueKind::Date => "date",
            ValueKind::Array => "array",
            ValueKind::Dictionary => "dictionary",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StoredValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            StoredValue::Bool(_) => ValueKind::Bool,
            StoredValue::Integer(_) => ValueKind::Integer,
            StoredValue::Real(_) => ValueKind::Real,
            StoredValue::String(_) => ValueKind::String,
            StoredValue::Data(_) => ValueKind::Data,
            StoredValue::Date(_) => ValueKind::Date,
            StoredValue::Array(_) => ValueKind::Array,
            StoredValue::Dictionary(_) => ValueKind::Dictionary,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoredValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StoredValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Reals and integers both read as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StoredValue::Real(value) => Some(*value),
            StoredValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            StoredValue::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            StoredValue::Date(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[StoredValue]> {
        match self {
            StoredValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, StoredValue>> {
        match self {
            StoredValue::Dictionary(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredValue::Bool(value) => write!(f, "{}", value),
            StoredValue::Integer(value) => write!(f, "{}", value),
            StoredValue::Real(value) => write!(f, "{}", value),
            StoredValue::String(value) => f.write_str(value),
            StoredValue::Data(bytes) => write!(f, "<{} bytes>", bytes.len()),
            StoredValue::Date(date) => {
                f.write_str(&date.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            StoredValue::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
            StoredValue::Dictionary(values) => {
                f.write_str("{")?;
                for (i, (key, value)) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for StoredValue {
    fn from(value: bool) -> Self {
        StoredValue::Bool(value)
    }
}

impl From<i64> for StoredValue {
    fn from(value: i64) -> Self {
        StoredValue::Integer(value)
    }
}

impl From<i32> for StoredValue {
    fn from(value: i32) -> Self {
        StoredValue::Integer(i64::from(value))
    }
}

impl From<f64> for StoredValue {
    fn from(value: f64) -> Self {
        StoredValue::Real(value)
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        StoredValue::String(value)
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for StoredValue {
    fn from(value: DateTime<Utc>) -> Self {
        StoredValue::Date(value)
    }
}

impl From<Vec<StoredValue>> for StoredValue {
    fn from(values: Vec<StoredValue>) -> Self {
        StoredValue::Array(values)
    }
}

impl From<BTreeMap<String, StoredValue>> for StoredValue {
    fn from(values: BTreeMap<String, StoredValue>) -> Self {
        StoredValue::Dictionary(values)
    }
}

mod base64_data {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_json_representation() {
        let date = Utc.timestamp_opt(-241290000, 0).unwrap();
        let mut dictionary = BTreeMap::new();
        dictionary.insert("English".to_string(), StoredValue::from("Justin Roiland"));

        let value = StoredValue::Array(vec![
            StoredValue::Bool(true),
            StoredValue::Integer(70),
            StoredValue::Data(vec![0xde, 0xad]),
            StoredValue::Date(date),
            StoredValue::Dictionary(dictionary),
        ]);

        let encoded = serde_json::to_value(&value).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "array",
                "value": [
                    {"type": "bool", "value": true},
                    {"type": "integer", "value": 70},
                    {"type": "data", "value": "3q0="},
                    {"type": "date", "value": "1962-05-10T07:00:00Z"},
                    {"type": "dictionary", "value": {
                        "English": {"type": "string", "value": "Justin Roiland"}
                    }}
                ]
            })
        );

        let decoded: StoredValue = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let result: Result<StoredValue, _> =
            serde_json::from_value(json!({"type": "data", "value": "not base64!"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_as_f64_accepts_integers() {
        assert_eq!(StoredValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(StoredValue::Real(6.1).as_f64(), Some(6.1));
        assert_eq!(StoredValue::from("6.1").as_f64(), None);
    }

    #[test]
    fn test_display() {
        let mut dictionary = BTreeMap::new();
        dictionary.insert("a".to_string(), StoredValue::Integer(1));
        dictionary.insert("b".to_string(), StoredValue::from("two"));

        assert_eq!(StoredValue::Bool(false).to_string(), "false");
        assert_eq!(StoredValue::Data(vec![1, 2, 3]).to_string(), "<3 bytes>");
        assert_eq!(
            StoredValue::Array(vec![StoredValue::from("Morty"), StoredValue::from("Summer")])
                .to_string(),
            "[Morty, Summer]"
        );
        assert_eq!(StoredValue::Dictionary(dictionary).to_string(), "{a: 1, b: two}");
    }

    #[test]
    fn test_kind() {
        assert_eq!(StoredValue::Real(1.5).kind(), ValueKind::Real);
        assert_eq!(StoredValue::Array(Vec::new()).kind().to_string(), "array");
    }
}
