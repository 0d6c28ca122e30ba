// ABOUTME: Translation between typed property values and stored values
// ABOUTME: One PropertyValue impl per supported Rust type, including optional and archived values

use appsettings_storage::StoredValue;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use url::Url;

use crate::types::{DataType, ObjectClass};
use crate::validation::ValidationError;

/// A Rust type that can back a settings property
///
/// `into_stored` returns `Ok(None)` when the value means "no entry"
/// (an empty `Option`), which clears the stored key.
pub trait PropertyValue: Sized {
    const DATA_TYPE: DataType;

    fn object_class() -> Option<ObjectClass> {
        None
    }

    /// Inclusive bounds for integer types that cannot hold every `i64`
    fn integer_range() -> Option<(i64, i64)> {
        None
    }

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError>;

    /// `None` when the stored value cannot represent `Self`
    fn from_stored(value: &StoredValue) -> Option<Self>;
}

/// Raw bytes stored as a data blob
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Data(pub Vec<u8>);

impl Data {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Data(bytes)
    }
}

/// Any serde type, stored as a JSON-encoded data blob
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Archived<T>(pub T);

impl<T> Archived<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl PropertyValue for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        Ok(Some(StoredValue::Bool(self)))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Bool(b) => Some(*b),
            StoredValue::Integer(0) => Some(false),
            StoredValue::Integer(1) => Some(true),
            _ => None,
        }
    }
}

macro_rules! integer_property {
    ($($ty:ty),*) => {
        $(
            impl PropertyValue for $ty {
                const DATA_TYPE: DataType = DataType::Int;

                fn integer_range() -> Option<(i64, i64)> {
                    let min = i64::try_from(<$ty>::MIN).unwrap_or(i64::MIN);
                    let max = i64::try_from(<$ty>::MAX).unwrap_or(i64::MAX);
                    if (min, max) == (i64::MIN, i64::MAX) {
                        None
                    } else {
                        Some((min, max))
                    }
                }

                fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
                    let value = i64::try_from(self).map_err(|_| {
                        ValidationError::InvalidInteger(
                            self.to_string(),
                            "Does not fit in a 64-bit integer".to_string(),
                        )
                    })?;
                    Ok(Some(StoredValue::Integer(value)))
                }

                fn from_stored(value: &StoredValue) -> Option<Self> {
                    value.as_i64().and_then(|v| <$ty>::try_from(v).ok())
                }
            }
        )*
    };
}

integer_property!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl PropertyValue for f32 {
    const DATA_TYPE: DataType = DataType::Float;

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        Ok(Some(StoredValue::Real(f64::from(self))))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        value.as_f64().map(|v| v as f32)
    }
}

impl PropertyValue for f64 {
    const DATA_TYPE: DataType = DataType::Double;

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        Ok(Some(StoredValue::Real(self)))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        value.as_f64()
    }
}

impl PropertyValue for String {
    const DATA_TYPE: DataType = DataType::String;

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        Ok(Some(StoredValue::String(self)))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl PropertyValue for DateTime<Utc> {
    const DATA_TYPE: DataType = DataType::Object;

    fn object_class() -> Option<ObjectClass> {
        Some(ObjectClass::Date)
    }

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        Ok(Some(StoredValue::Date(self)))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        value.as_date()
    }
}

impl PropertyValue for Url {
    const DATA_TYPE: DataType = DataType::Object;

    fn object_class() -> Option<ObjectClass> {
        Some(ObjectClass::Url)
    }

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        Ok(Some(StoredValue::String(self.into())))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        value.as_str().and_then(|s| Url::parse(s).ok())
    }
}

impl PropertyValue for Data {
    const DATA_TYPE: DataType = DataType::Object;

    fn object_class() -> Option<ObjectClass> {
        Some(ObjectClass::Data)
    }

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        Ok(Some(StoredValue::Data(self.0)))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        value.as_data().map(|bytes| Data(bytes.to_vec()))
    }
}

impl<T> PropertyValue for Archived<T>
where
    T: Serialize + DeserializeOwned,
{
    const DATA_TYPE: DataType = DataType::Object;

    fn object_class() -> Option<ObjectClass> {
        Some(ObjectClass::Archived(short_type_name::<T>()))
    }

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        let bytes = serde_json::to_vec(&self.0).map_err(|e| {
            ValidationError::Encoding(short_type_name::<T>().to_string(), e.to_string())
        })?;
        Ok(Some(StoredValue::Data(bytes)))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        value
            .as_data()
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
            .map(Archived)
    }
}

impl<T: PropertyValue> PropertyValue for Option<T> {
    const DATA_TYPE: DataType = T::DATA_TYPE;

    fn object_class() -> Option<ObjectClass> {
        T::object_class()
    }

    fn integer_range() -> Option<(i64, i64)> {
        T::integer_range()
    }

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        match self {
            Some(value) => value.into_stored(),
            None => Ok(None),
        }
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        T::from_stored(value).map(Some)
    }
}

/// Arrays cannot hold gaps, so an element without a stored form is an error
impl<T: PropertyValue> PropertyValue for Vec<T> {
    const DATA_TYPE: DataType = DataType::Array;

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        let mut values = Vec::with_capacity(self.len());
        for (index, item) in self.into_iter().enumerate() {
            match item.into_stored()? {
                Some(value) => values.push(value),
                None => return Err(ValidationError::MissingElement(index)),
            }
        }
        Ok(Some(StoredValue::Array(values)))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        value
            .as_array()?
            .iter()
            .map(T::from_stored)
            .collect::<Option<Vec<_>>>()
    }
}

/// Entries without a stored form (e.g. `None`) are left out of the dictionary
impl<T: PropertyValue> PropertyValue for BTreeMap<String, T> {
    const DATA_TYPE: DataType = DataType::Dictionary;

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        let mut values = BTreeMap::new();
        for (key, item) in self {
            if let Some(value) = item.into_stored()? {
                values.insert(key, value);
            }
        }
        Ok(Some(StoredValue::Dictionary(values)))
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        value
            .as_dictionary()?
            .iter()
            .map(|(key, item)| T::from_stored(item).map(|v| (key.clone(), v)))
            .collect()
    }
}

impl<T: PropertyValue> PropertyValue for HashMap<String, T> {
    const DATA_TYPE: DataType = DataType::Dictionary;

    fn into_stored(self) -> Result<Option<StoredValue>, ValidationError> {
        self.into_iter()
            .collect::<BTreeMap<String, T>>()
            .into_stored()
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        BTreeMap::<String, T>::from_stored(value).map(|map| map.into_iter().collect())
    }
}

/// Unqualified type name, e.g. `Color` for `my_app::theme::Color`
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Generic arguments may contain `::` themselves, so split before them
    let base = full.split('<').next().unwrap_or(full);
    let start = base.rfind("::").map(|i| i + 2).unwrap_or(0);
    &full[start..]
}
