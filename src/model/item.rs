//! Catalog items
//!
//! An item is identified by the composite key `(ItemId, Course)` and carries
//! `Name`, `Year` and any extra attributes supplied at creation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use super::{AttributeValue, Key, Record};

/// Caller-supplied fields for item creation
pub type Fields = BTreeMap<String, AttributeValue>;

/// Issued item identifier (decimal string of a counter value)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId(value.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub item_id: ItemId,
    pub course: String,
    pub name: String,
    pub year: String,

    /// Extra attributes, never containing the reserved names
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Item {
    // =========================================================================
    // Stored Attribute Names
    // =========================================================================
    pub const ITEM_ID: &'static str = "ItemId";
    pub const COURSE: &'static str = "Course";
    pub const NAME: &'static str = "Name";
    pub const YEAR: &'static str = "Year";

    /// Attribute names an extra field may never overwrite
    pub const RESERVED: [&'static str; 4] = [Self::ITEM_ID, Self::COURSE, Self::NAME, Self::YEAR];

    pub fn is_reserved(attribute: &str) -> bool {
        Self::RESERVED.contains(&attribute)
    }

    /// Composite key for an (ItemId, Course) pair
    pub fn key_for(item_id: &str, course: &str) -> Key {
        Key::composite((Self::ITEM_ID, item_id), (Self::COURSE, course))
    }

    pub fn key(&self) -> Key {
        Self::key_for(self.item_id.as_str(), &self.course)
    }

    /// Flatten into a store record
    pub fn to_record(&self) -> Record {
        let mut record: Record = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        record.insert(Self::ITEM_ID.to_string(), self.item_id.as_str().into());
        record.insert(Self::COURSE.to_string(), self.course.as_str().into());
        record.insert(Self::NAME.to_string(), self.name.as_str().into());
        record.insert(Self::YEAR.to_string(), self.year.as_str().into());
        record
    }

    /// Rebuild an item from a store record
    pub fn from_record(mut record: Record) -> StoreResult<Self> {
        let item_id = take_string(&mut record, Self::ITEM_ID)?;
        let course = take_string(&mut record, Self::COURSE)?;
        let name = take_string(&mut record, Self::NAME)?;
        let year = take_string(&mut record, Self::YEAR)?;

        Ok(Self {
            item_id: ItemId::new(item_id),
            course,
            name,
            year,
            attributes: record,
        })
    }

    /// JSON object with the stored attribute names
    pub fn to_json(&self) -> serde_json::Value {
        let object: serde_json::Map<String, serde_json::Value> = self
            .to_record()
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(object)
    }
}

fn take_string(record: &mut Record, attribute: &str) -> StoreResult<String> {
    match record.remove(attribute) {
        Some(AttributeValue::String(value)) => Ok(value),
        Some(other) => Err(StoreError::MalformedRecord(format!(
            "attribute {} is a {}, expected string",
            attribute,
            other.type_name()
        ))),
        None => Err(StoreError::MalformedRecord(format!(
            "missing attribute {}",
            attribute
        ))),
    }
}
