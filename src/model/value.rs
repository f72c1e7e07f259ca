//! Attribute values, records and composite keys
//!
//! Records are ordered maps of attribute name to a small closed value
//! union. Keys are the ordered list of key attributes of a record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A stored record: attribute name → value, ordered by name
pub type Record = BTreeMap<String, AttributeValue>;

/// Value of a single record attribute
///
/// Numbers are integers; the counter record and any numeric extra
/// attribute share this representation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    String(String),
    Number(i64),
    Bool(bool),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Name of the variant, used in type-mismatch messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Number(_) => "number",
            AttributeValue::Bool(_) => "bool",
        }
    }

    /// Infer a value from command-line text: `true`/`false`, integer, else string
    pub fn infer(text: &str) -> Self {
        match text {
            "true" => AttributeValue::Bool(true),
            "false" => AttributeValue::Bool(false),
            _ => match text.parse::<i64>() {
                Ok(n) => AttributeValue::Number(n),
                Err(_) => AttributeValue::String(text.to_string()),
            },
        }
    }

    /// Convert a JSON value into an attribute value
    ///
    /// Only strings, integers and booleans are representable.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::String(s) => Ok(AttributeValue::String(s.clone())),
            serde_json::Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(AttributeValue::Number)
                .ok_or_else(|| format!("only integer numbers are supported, got {}", n)),
            serde_json::Value::Null => Err("null values are not supported".to_string()),
            serde_json::Value::Array(_) => Err("arrays are not supported".to_string()),
            serde_json::Value::Object(_) => Err("nested objects are not supported".to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::String(s) => serde_json::Value::String(s.clone()),
            AttributeValue::Number(n) => serde_json::Value::from(*n),
            AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// Primary key of a record: ordered (attribute, value) pairs
///
/// Items use the composite key `(ItemId, Course)`; the counter record uses
/// the single attribute `CounterName`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(Vec<(String, String)>);

impl Key {
    /// Single-attribute key
    pub fn single(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Key(vec![(attribute.into(), value.into())])
    }

    /// Two-attribute (composite) key
    pub fn composite(
        first: (impl Into<String>, impl Into<String>),
        second: (impl Into<String>, impl Into<String>),
    ) -> Self {
        Key(vec![
            (first.0.into(), first.1.into()),
            (second.0.into(), second.1.into()),
        ])
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, v)| (a.as_str(), v.as_str()))
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes()
            .find(|(a, _)| *a == attribute)
            .map(|(_, v)| v)
    }

    /// Record holding only the key attributes
    pub fn to_record(&self) -> Record {
        self.attributes()
            .map(|(a, v)| (a.to_string(), AttributeValue::from(v)))
            .collect()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (attribute, value) in self.attributes() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}={}", attribute, value)?;
            first = false;
        }
        Ok(())
    }
}
