//! Store Module
//!
//! The key-value store collaborator the catalog core is written against.
//!
//! ## Responsibilities
//! - Point get/put/delete by composite key
//! - Atomic "initialize if absent, then add" increment on a numeric field
//! - Equality queries through declared secondary indexes
//! - Full scans with an optional attribute-equality filter
//!
//! ## Implementations
//! - [`MemoryStore`]: in-process tables behind a `RwLock`, with fault injection
//! - [`JournaledStore`]: a `MemoryStore` made durable by the WAL

mod journaled;
mod memory;

pub use journaled::JournaledStore;
pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::model::{AttributeValue, Key, Record};

/// Capability set the catalog requires from a store
///
/// Every method is a single round trip and is atomic on its own. None of
/// them retry.
pub trait KeyValueStore: Send + Sync {
    /// Point lookup; `None` when no record has this key
    fn get(&self, table: &str, key: &Key) -> StoreResult<Option<Record>>;

    /// Store a whole record, replacing any previous one
    fn put(&self, table: &str, key: &Key, record: Record) -> StoreResult<()>;

    /// Remove a record, returning its prior attributes if it existed
    fn delete(&self, table: &str, key: &Key) -> StoreResult<Option<Record>>;

    /// `field = if_not_exists(field, initial) + delta`, returning the new value
    ///
    /// Creates the record from its key attributes when absent.
    fn increment(&self, table: &str, key: &Key, field: &str, delta: i64, initial: i64) -> StoreResult<i64>;

    /// Equality lookup through a secondary index
    ///
    /// Fails with `StoreError::Schema` when `index` is not defined on `table`
    /// or is not keyed on `attribute`.
    fn query_index(
        &self,
        table: &str,
        index: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> StoreResult<Vec<Record>>;

    /// Full table read, optionally keeping only records whose attribute equals a value
    fn scan(&self, table: &str, filter: Option<(&str, &AttributeValue)>) -> StoreResult<Vec<Record>>;
}

/// A secondary index declared on a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub table: String,
    pub name: String,

    /// Attribute the index is keyed on
    pub attribute: String,
}

impl IndexDefinition {
    pub fn new(table: impl Into<String>, name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            attribute: attribute.into(),
        }
    }
}

/// Store operations, used to target injected faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Put,
    Delete,
    Increment,
    Query,
    Scan,
}
