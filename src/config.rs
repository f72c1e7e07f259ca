//! Configuration for the item catalog
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::store::IndexDefinition;

/// Main configuration for a catalog instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the journaled store
    /// Internal structure:
    ///   {data_dir}/
    ///     └── catalog.wal      (write-ahead log)
    pub data_dir: PathBuf,

    /// Sync strategy: how often to fsync the WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Table Layout
    // -------------------------------------------------------------------------
    /// Table holding items, keyed by (ItemId, Course)
    pub items_table: String,

    /// Table holding the ID counter record
    pub counter_table: String,

    /// Key value of the singleton counter record
    pub counter_name: String,

    /// Secondary indexes the store maintains
    pub indexes: Vec<IndexDefinition>,

    /// Index used for course lookups
    pub course_index: String,

    // -------------------------------------------------------------------------
    // Presentation Policy
    // -------------------------------------------------------------------------
    /// Report empty list results as not-found instead of an empty success
    pub empty_list_as_not_found: bool,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Config {
    pub const DEFAULT_ITEMS_TABLE: &'static str = "Items";
    pub const DEFAULT_COUNTER_TABLE: &'static str = "Counters";
    pub const DEFAULT_COUNTER_NAME: &'static str = "ItemIdCounter";
    pub const DEFAULT_COURSE_INDEX: &'static str = "Course-index";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./catalog_data"),
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            items_table: Self::DEFAULT_ITEMS_TABLE.to_string(),
            counter_table: Self::DEFAULT_COUNTER_TABLE.to_string(),
            counter_name: Self::DEFAULT_COUNTER_NAME.to_string(),
            indexes: vec![IndexDefinition::new(
                Self::DEFAULT_ITEMS_TABLE,
                Self::DEFAULT_COURSE_INDEX,
                "Course",
            )],
            course_index: Self::DEFAULT_COURSE_INDEX.to_string(),
            empty_list_as_not_found: true,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the items table name
    ///
    /// Index definitions are not rewritten; set them with [`indexes`](Self::indexes).
    pub fn items_table(mut self, name: impl Into<String>) -> Self {
        self.config.items_table = name.into();
        self
    }

    /// Set the counter table name
    pub fn counter_table(mut self, name: impl Into<String>) -> Self {
        self.config.counter_table = name.into();
        self
    }

    /// Set the key of the counter record
    pub fn counter_name(mut self, name: impl Into<String>) -> Self {
        self.config.counter_name = name.into();
        self
    }

    /// Replace the secondary index definitions
    pub fn indexes(mut self, indexes: Vec<IndexDefinition>) -> Self {
        self.config.indexes = indexes;
        self
    }

    /// Set the index name used for course lookups
    pub fn course_index(mut self, name: impl Into<String>) -> Self {
        self.config.course_index = name.into();
        self
    }

    /// Choose whether empty list results surface as not-found
    pub fn empty_list_as_not_found(mut self, enabled: bool) -> Self {
        self.config.empty_list_as_not_found = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
