//! Counter-based ID allocation
//!
//! IDs come from a single counter record incremented atomically by the
//! store, so concurrent callers never receive the same value.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::model::{ItemId, Key};
use crate::store::KeyValueStore;

/// Issues strictly increasing item IDs
#[derive(Clone)]
pub struct CounterAllocator {
    store: Arc<dyn KeyValueStore>,
    table: String,
    key: Key,
}

impl CounterAllocator {
    /// Key attribute of the counter record
    pub const KEY_ATTRIBUTE: &'static str = "CounterName";

    /// Numeric field holding the last issued value
    pub const VALUE_FIELD: &'static str = "CounterValue";

    pub fn new(store: Arc<dyn KeyValueStore>, table: impl Into<String>, counter_name: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            key: Key::single(Self::KEY_ATTRIBUTE, counter_name),
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self::new(store, config.counter_table.as_str(), config.counter_name.as_str())
    }

    /// Issue the next ID
    ///
    /// The first call against an absent counter yields `1`. A failed
    /// increment issues nothing.
    pub fn next_id(&self) -> Result<ItemId> {
        let value = self
            .store
            .increment(&self.table, &self.key, Self::VALUE_FIELD, 1, 0)?;

        tracing::trace!("Allocated item id {}", value);
        Ok(ItemId::from(value))
    }
}
