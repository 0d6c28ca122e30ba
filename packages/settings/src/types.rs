// ABOUTME: Type definitions for settings property descriptors
// ABOUTME: Data type tags and object classes recorded once per declared property

use serde::Serialize;
use std::fmt;

/// Primitive or reference type of a declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Unknown,
    Int,
    Float,
    Double,
    Bool,
    String,
    Array,
    Dictionary,
    Object,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Unknown => "unknown",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Bool => "bool",
            DataType::String => "string",
            DataType::Array => "array",
            DataType::Dictionary => "dictionary",
            DataType::Object => "object",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class of an `Object` property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Date,
    Url,
    Data,
    /// Any serde type stored as an encoded blob, tagged with its type name
    Archived(&'static str),
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectClass::Date => f.write_str("Date"),
            ObjectClass::Url => f.write_str("Url"),
            ObjectClass::Data => f.write_str("Data"),
            ObjectClass::Archived(type_name) => f.write_str(type_name),
        }
    }
}

/// Static metadata about one declared property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    /// The name of this property as declared on the settings type
    pub name: String,
    /// The data type of this property (e.g. float, int)
    pub data_type: DataType,
    /// If the property is an object, the class of that object
    pub object_class: Option<ObjectClass>,
    /// Inclusive bounds of an integer property narrower than 64 bits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer_range: Option<(i64, i64)>,
}

impl PropertyDescriptor {
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        object_class: Option<ObjectClass>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            object_class,
            integer_range: None,
        }
    }

    pub fn with_integer_range(mut self, range: Option<(i64, i64)>) -> Self {
        self.integer_range = range;
        self
    }

    /// Type label used in listings, e.g. `int` or `object<Date>`
    pub fn type_label(&self) -> String {
        match self.object_class {
            Some(class) => format!("{}<{}>", self.data_type, class),
            None => self.data_type.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_label() {
        let plain = PropertyDescriptor::new("age", DataType::Int, None);
        let date = PropertyDescriptor::new("birthdate", DataType::Object, Some(ObjectClass::Date));
        let color = PropertyDescriptor::new(
            "portal_gun_color",
            DataType::Object,
            Some(ObjectClass::Archived("Color")),
        );

        assert_eq!(plain.type_label(), "int");
        assert_eq!(date.type_label(), "object<Date>");
        assert_eq!(color.type_label(), "object<Color>");
    }

    #[test]
    fn test_descriptor_serializes() {
        let descriptor =
            PropertyDescriptor::new("homepage", DataType::Object, Some(ObjectClass::Url));
        let json = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(json["name"], "homepage");
        assert_eq!(json["data_type"], "object");
        assert_eq!(json["object_class"], "url");
    }
}
