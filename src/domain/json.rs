//! JSON documents held as source text.
//!
//! Signing must see every scalar exactly as the issuer wrote it (`1.0E+2`
//! stays `1.0E+2`, `100.50` keeps its trailing zero), so documents are kept as
//! [`RawValue`] slices and only split one level at a time.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::infra::error::{SigningError, SigningResult};

/// Kind of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    /// Kind of a raw value, read from its first byte.
    #[must_use]
    pub fn of(raw: &RawValue) -> Self {
        match raw.get().as_bytes().first() {
            Some(b'{') => Self::Object,
            Some(b'[') => Self::Array,
            Some(b'"') => Self::String,
            Some(b't' | b'f') => Self::Bool,
            Some(b'n') => Self::Null,
            _ => Self::Number,
        }
    }

    #[must_use]
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Bool => "a boolean",
            Self::Number => "a number",
            Self::String => "a string",
            Self::Array => "an array",
            Self::Object => "an object",
        })
    }
}

/// A JSON object whose member values keep their source text.
///
/// Members stay in document order. A repeated key keeps its first position
/// and its last value.
#[derive(Debug, Clone, Default)]
pub struct RawObject {
    fields: Vec<(String, Box<RawValue>)>,
}

impl RawObject {
    /// Parse document text that must hold a JSON object.
    pub fn parse(text: &str) -> SigningResult<Self> {
        let raw: &RawValue = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Split an already delimited value that must be an object.
    pub fn from_raw(raw: &RawValue) -> SigningResult<Self> {
        match JsonKind::of(raw) {
            JsonKind::Object => Ok(serde_json::from_str(raw.get())?),
            other => Err(SigningError::InvalidDocumentFormat(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_ref())
    }

    /// Set `key`, in place when it already exists, otherwise last.
    pub fn insert(&mut self, key: impl Into<String>, value: Box<RawValue>) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn to_json_string(&self) -> SigningResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_raw(&self) -> SigningResult<Box<RawValue>> {
        Ok(serde_json::value::to_raw_value(self)?)
    }
}

impl Serialize for RawObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = RawObject;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawObject, A::Error> {
                let mut object = RawObject::default();
                while let Some((key, value)) = access.next_entry::<String, Box<RawValue>>()? {
                    object.insert(key, value);
                }
                Ok(object)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> Box<RawValue> {
        RawValue::from_string(text.to_string()).unwrap()
    }

    #[test]
    fn kind_from_first_byte() {
        assert_eq!(JsonKind::of(&raw("1.0E+2")), JsonKind::Number);
        assert_eq!(JsonKind::of(&raw("-0")), JsonKind::Number);
        assert_eq!(JsonKind::of(&raw("false")), JsonKind::Bool);
        assert_eq!(JsonKind::of(&raw("null")), JsonKind::Null);
        assert_eq!(JsonKind::of(&raw(r#""x""#)), JsonKind::String);
        assert_eq!(JsonKind::of(&raw("[]")), JsonKind::Array);
        assert_eq!(JsonKind::of(&raw("{}")), JsonKind::Object);
    }

    #[test]
    fn members_keep_order_and_text() {
        let object = RawObject::parse(r#"{ "z" : 1E5, "a": [1.50, "b"] }"#).unwrap();
        let members: Vec<(&str, &str)> = object.iter().map(|(k, v)| (k, v.get())).collect();
        assert_eq!(members, vec![("z", "1E5"), ("a", r#"[1.50, "b"]"#)]);
        assert_eq!(
            object.to_json_string().unwrap(),
            r#"{"z":1E5,"a":[1.50, "b"]}"#
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut object = RawObject::parse(r#"{"a":1,"b":2}"#).unwrap();
        object.insert("a", raw("3"));
        object.insert("c", raw("4"));
        assert_eq!(object.to_json_string().unwrap(), r#"{"a":3,"b":2,"c":4}"#);
        assert_eq!(object.get("b").map(RawValue::get), Some("2"));
        assert!(object.get("d").is_none());
    }

    #[test]
    fn repeated_key_keeps_first_position() {
        let object = RawObject::parse(r#"{"a":1,"b":2,"a":3}"#).unwrap();
        assert_eq!(object.to_json_string().unwrap(), r#"{"a":3,"b":2}"#);
    }

    #[test]
    fn non_objects_are_rejected() {
        for text in ["[1]", "\"text\"", "null", "{broken"] {
            assert!(matches!(
                RawObject::parse(text),
                Err(SigningError::InvalidDocumentFormat(_))
            ));
        }
    }
}
