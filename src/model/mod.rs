//! Model Module
//!
//! Data types shared by the store, repository and service layers.
//!
//! ## Layout
//! - `value`: attribute values, records, composite keys
//! - `item`: the catalog item and its record mapping

mod item;
mod value;

pub use item::{Fields, Item, ItemId};
pub use value::{AttributeValue, Key, Record};
