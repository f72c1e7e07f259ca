//! In-memory store
//!
//! Tables of `BTreeMap<Key, Record>` behind a single `RwLock`, each with
//! its declared secondary indexes maintained on every write.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::{Mutex, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::model::{AttributeValue, Key, Record};
use crate::wal::Operation;

use super::{IndexDefinition, KeyValueStore, StoreOp};

/// In-memory key-value store
///
/// ## Concurrency:
/// - `tables`: one RwLock; reads share it, every mutation (including
///   increment's read-modify-write) holds it exclusively
/// - `faults`: separate Mutex so injecting a fault never waits on data
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    indexes: Vec<IndexDefinition>,

    /// Remaining injected failures per operation
    faults: Mutex<HashMap<StoreOp, usize>>,
}

/// One table and its secondary indexes
#[derive(Default)]
struct Table {
    rows: BTreeMap<Key, Record>,

    /// Index name → index
    indexes: HashMap<String, SecondaryIndex>,
}

/// Sparse equality index: records lacking the attribute are not indexed
struct SecondaryIndex {
    attribute: String,
    entries: BTreeMap<AttributeValue, BTreeSet<Key>>,
}

impl SecondaryIndex {
    fn add(&mut self, key: &Key, record: &Record) {
        if let Some(value) = record.get(&self.attribute) {
            self.entries
                .entry(value.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    fn remove(&mut self, key: &Key, record: &Record) {
        if let Some(value) = record.get(&self.attribute) {
            if let Some(keys) = self.entries.get_mut(value) {
                keys.remove(key);
                if keys.is_empty() {
                    self.entries.remove(value);
                }
            }
        }
    }
}

impl Table {
    fn insert(&mut self, key: Key, record: Record) -> Option<Record> {
        let previous = self.remove(&key);
        for index in self.indexes.values_mut() {
            index.add(&key, &record);
        }
        self.rows.insert(key, record);
        previous
    }

    fn remove(&mut self, key: &Key) -> Option<Record> {
        let previous = self.rows.remove(key)?;
        for index in self.indexes.values_mut() {
            index.remove(key, &previous);
        }
        Some(previous)
    }
}

impl MemoryStore {
    /// Create a store without secondary indexes
    pub fn new() -> Self {
        Self::with_indexes(Vec::new())
    }

    /// Create a store maintaining the given secondary indexes
    pub fn with_indexes(indexes: Vec<IndexDefinition>) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            indexes,
            faults: Mutex::new(HashMap::new()),
        }
    }

    /// Make the next `count` calls of `op` fail with `StoreError::Unavailable`
    pub fn fail_next(&self, op: StoreOp, count: usize) {
        *self.faults.lock().entry(op).or_insert(0) += count;
    }

    /// Drop all pending injected failures
    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    /// Number of records in a table
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.rows.len())
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn check_fault(&self, op: StoreOp) -> StoreResult<()> {
        let mut faults = self.faults.lock();
        if let Some(remaining) = faults.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Unavailable(format!(
                    "injected {:?} failure",
                    op
                )));
            }
        }
        Ok(())
    }

    fn new_table(&self, name: &str) -> Table {
        let indexes = self
            .indexes
            .iter()
            .filter(|def| def.table == name)
            .map(|def| {
                (
                    def.name.clone(),
                    SecondaryIndex {
                        attribute: def.attribute.clone(),
                        entries: BTreeMap::new(),
                    },
                )
            })
            .collect();

        Table {
            rows: BTreeMap::new(),
            indexes,
        }
    }

    // =========================================================================
    // Unchecked operations (no fault injection; used by JournaledStore)
    // =========================================================================

    pub(crate) fn read_record(&self, table: &str, key: &Key) -> Option<Record> {
        self.tables
            .read()
            .get(table)
            .and_then(|t| t.rows.get(key))
            .cloned()
    }

    /// Apply a logged operation, returning the record it replaced or removed
    pub(crate) fn apply(&self, operation: Operation) -> Option<Record> {
        let mut tables = self.tables.write();
        match operation {
            Operation::Put { table, key, record } => tables
                .entry(table)
                .or_insert_with_key(|name| self.new_table(name))
                .insert(key, record),
            Operation::Delete { table, key } => tables.get_mut(&table)?.remove(&key),
        }
    }

    /// Every stored record as (table, key, record), for checkpointing
    pub(crate) fn snapshot(&self) -> Vec<(String, Key, Record)> {
        let tables = self.tables.read();
        let mut names: Vec<&String> = tables.keys().collect();
        names.sort();

        names
            .into_iter()
            .flat_map(|name| {
                tables[name]
                    .rows
                    .iter()
                    .map(move |(key, record)| (name.clone(), key.clone(), record.clone()))
            })
            .collect()
    }

    pub(crate) fn query_unchecked(
        &self,
        table: &str,
        index: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> StoreResult<Vec<Record>> {
        let definition = self
            .indexes
            .iter()
            .find(|def| def.table == table && def.name == index)
            .ok_or_else(|| {
                StoreError::Schema(format!("index {} does not exist on table {}", index, table))
            })?;

        if definition.attribute != attribute {
            return Err(StoreError::Schema(format!(
                "index {} is keyed on {}, not {}",
                index, definition.attribute, attribute
            )));
        }

        let tables = self.tables.read();
        let Some(t) = tables.get(table) else {
            return Ok(Vec::new());
        };
        let Some(keys) = t.indexes.get(index).and_then(|i| i.entries.get(value)) else {
            return Ok(Vec::new());
        };

        Ok(keys.iter().filter_map(|k| t.rows.get(k).cloned()).collect())
    }

    pub(crate) fn scan_unchecked(&self, table: &str, filter: Option<(&str, &AttributeValue)>) -> Vec<Record> {
        let tables = self.tables.read();
        let Some(t) = tables.get(table) else {
            return Vec::new();
        };

        t.rows
            .values()
            .filter(|record| match filter {
                Some((attribute, value)) => record.get(attribute) == Some(value),
                None => true,
            })
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the counter record produced by an increment
///
/// Returns the new value together with the full updated record.
pub(crate) fn incremented(
    existing: Option<Record>,
    key: &Key,
    field: &str,
    delta: i64,
    initial: i64,
) -> StoreResult<(i64, Record)> {
    let mut record = existing.unwrap_or_else(|| key.to_record());

    let current = match record.get(field) {
        None => initial,
        Some(AttributeValue::Number(n)) => *n,
        Some(other) => {
            return Err(StoreError::TypeMismatch {
                attribute: field.to_string(),
                reason: format!("cannot increment a {}", other.type_name()),
            })
        }
    };

    let next = current.checked_add(delta).ok_or_else(|| StoreError::TypeMismatch {
        attribute: field.to_string(),
        reason: format!("{} + {} overflows", current, delta),
    })?;

    record.insert(field.to_string(), AttributeValue::Number(next));
    Ok((next, record))
}

impl KeyValueStore for MemoryStore {
    fn get(&self, table: &str, key: &Key) -> StoreResult<Option<Record>> {
        self.check_fault(StoreOp::Get)?;
        Ok(self.read_record(table, key))
    }

    fn put(&self, table: &str, key: &Key, record: Record) -> StoreResult<()> {
        self.check_fault(StoreOp::Put)?;
        self.apply(Operation::Put {
            table: table.to_string(),
            key: key.clone(),
            record,
        });
        Ok(())
    }

    fn delete(&self, table: &str, key: &Key) -> StoreResult<Option<Record>> {
        self.check_fault(StoreOp::Delete)?;
        Ok(self.apply(Operation::Delete {
            table: table.to_string(),
            key: key.clone(),
        }))
    }

    fn increment(&self, table: &str, key: &Key, field: &str, delta: i64, initial: i64) -> StoreResult<i64> {
        self.check_fault(StoreOp::Increment)?;

        // Held across read-modify-write so concurrent increments never collide
        let mut tables = self.tables.write();
        let t = tables
            .entry(table.to_string())
            .or_insert_with_key(|name| self.new_table(name));

        let (next, record) = incremented(t.rows.get(key).cloned(), key, field, delta, initial)?;
        t.insert(key.clone(), record);
        Ok(next)
    }

    fn query_index(
        &self,
        table: &str,
        index: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> StoreResult<Vec<Record>> {
        self.check_fault(StoreOp::Query)?;
        self.query_unchecked(table, index, attribute, value)
    }

    fn scan(&self, table: &str, filter: Option<(&str, &AttributeValue)>) -> StoreResult<Vec<Record>> {
        self.check_fault(StoreOp::Scan)?;
        Ok(self.scan_unchecked(table, filter))
    }
}
