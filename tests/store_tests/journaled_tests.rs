//! Tests for JournaledStore
//!
//! These tests verify:
//! - Store lifecycle (open creates directories, close syncs)
//! - Replay of puts, deletes and counter increments across reopen
//! - Secondary indexes rebuilt on replay
//! - Torn tail recovery
//! - Memory stays in step with the WAL when a write or fsync fails
//! - Compaction

use std::fs::OpenOptions;
use std::io::Write;

use itemcatalog::config::{Config, WalSyncStrategy};
use itemcatalog::store::{JournaledStore, KeyValueStore};
use itemcatalog::wal::WalRecovery;
use itemcatalog::{AttributeValue, Item, StoreError};
use tempfile::TempDir;

use super::{counter_key, item_record, COUNTERS, COURSE_INDEX, ITEMS};

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryWrite) // Sync every write for test reliability
        .build()
}

fn setup_temp_store() -> (TempDir, JournaledStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = JournaledStore::open(&config_for(&temp_dir)).unwrap();
    (temp_dir, store)
}

fn reopen(temp_dir: &TempDir, store: JournaledStore) -> JournaledStore {
    store.close().unwrap();
    JournaledStore::open(&config_for(temp_dir)).unwrap()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("catalog");

    let config = Config::builder().data_dir(&data_dir).build();
    let store = JournaledStore::open(&config).unwrap();

    assert!(data_dir.exists());
    assert!(store.wal_path().exists());
    assert_eq!(store.data_dir(), data_dir.as_path());
    assert_eq!(store.current_lsn(), 0);
}

#[test]
fn test_open_path_uses_default_layout() {
    let temp_dir = TempDir::new().unwrap();

    let store = JournaledStore::open_path(temp_dir.path()).unwrap();

    assert!(store.wal_path().starts_with(temp_dir.path()));
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_puts_survive_reopen() {
    let (temp, store) = setup_temp_store();
    let (key, record) = item_record("1", "CS101", "2024");
    store.put(ITEMS, &key, record.clone()).unwrap();

    let store = reopen(&temp, store);

    assert_eq!(store.get(ITEMS, &key).unwrap(), Some(record));
    assert_eq!(store.recovery().entries_recovered, 1);
}

#[test]
fn test_deletes_survive_reopen() {
    let (temp, store) = setup_temp_store();
    let (key, record) = item_record("1", "CS101", "2024");
    store.put(ITEMS, &key, record.clone()).unwrap();
    assert_eq!(store.delete(ITEMS, &key).unwrap(), Some(record));

    let store = reopen(&temp, store);

    assert_eq!(store.get(ITEMS, &key).unwrap(), None);
    assert!(store.is_empty(ITEMS));
}

#[test]
fn test_delete_of_absent_key_is_not_journaled() {
    let (_temp, store) = setup_temp_store();
    let (key, _) = item_record("1", "CS101", "2024");

    assert_eq!(store.delete(ITEMS, &key).unwrap(), None);
    assert_eq!(store.current_lsn(), 0);
}

#[test]
fn test_counter_continues_after_reopen() {
    let (temp, store) = setup_temp_store();
    let key = counter_key();
    for expected in 1..=3 {
        assert_eq!(store.increment(COUNTERS, &key, "CounterValue", 1, 0).unwrap(), expected);
    }

    let store = reopen(&temp, store);

    assert_eq!(store.increment(COUNTERS, &key, "CounterValue", 1, 0).unwrap(), 4);
}

#[test]
fn test_index_rebuilt_on_replay() {
    let (temp, store) = setup_temp_store();
    for (id, c) in [("1", "CS101"), ("2", "CS101"), ("3", "MA200")] {
        let (key, record) = item_record(id, c, "2024");
        store.put(ITEMS, &key, record).unwrap();
    }

    let store = reopen(&temp, store);

    let records = store
        .query_index(ITEMS, COURSE_INDEX, Item::COURSE, &AttributeValue::from("CS101"))
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_missing_index_is_schema_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .indexes(Vec::new())
        .build();
    let store = JournaledStore::open(&config).unwrap();

    let result = store.query_index(ITEMS, COURSE_INDEX, Item::COURSE, &AttributeValue::from("CS101"));

    assert!(matches!(result, Err(StoreError::Schema(_))));
}

// =============================================================================
// Crash Recovery Tests
// =============================================================================

#[test]
fn test_torn_tail_is_dropped_on_open() {
    let (temp, store) = setup_temp_store();
    let (key, record) = item_record("1", "CS101", "2024");
    store.put(ITEMS, &key, record.clone()).unwrap();
    let wal_path = store.wal_path().to_path_buf();
    store.close().unwrap();

    {
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(&[0, 0, 0, 0, 0, 0, 0, 2, 1, 2]).unwrap();
    }

    let store = JournaledStore::open(&config_for(&temp)).unwrap();
    assert!(store.recovery().was_truncated);
    assert_eq!(store.get(ITEMS, &key).unwrap(), Some(record));

    // New writes land after the recovered entries
    let (key2, record2) = item_record("2", "CS101", "2024");
    store.put(ITEMS, &key2, record2.clone()).unwrap();
    let store = reopen(&temp, store);
    assert_eq!(store.get(ITEMS, &key2).unwrap(), Some(record2));
    assert!(!store.recovery().was_truncated);
}

// =============================================================================
// WAL Failure Tests
// =============================================================================

/// Store whose WAL is a symlink to a device file
#[cfg(target_os = "linux")]
fn open_on_device(temp_dir: &TempDir, device: &str) -> JournaledStore {
    std::os::unix::fs::symlink(device, temp_dir.path().join("catalog.wal")).unwrap();
    JournaledStore::open(&config_for(temp_dir)).unwrap()
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_sync_still_applies_logged_write() {
    // /dev/null accepts every write but rejects fsync
    let temp = TempDir::new().unwrap();
    let store = open_on_device(&temp, "/dev/null");
    let (key, record) = item_record("1", "CS101", "2024");

    let err = store.put(ITEMS, &key, record.clone()).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
    // The frame is in the log, so memory has to hold it too
    assert_eq!(store.get(ITEMS, &key).unwrap(), Some(record));
    assert_eq!(store.current_lsn(), 1);

    let err = store.delete(ITEMS, &key).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
    assert_eq!(store.get(ITEMS, &key).unwrap(), None);
    assert_eq!(store.current_lsn(), 2);
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_write_is_not_applied() {
    // /dev/full rejects every write
    let temp = TempDir::new().unwrap();
    let store = open_on_device(&temp, "/dev/full");
    let (key, record) = item_record("1", "CS101", "2024");

    assert!(store.put(ITEMS, &key, record).is_err());
    assert!(store.increment(COUNTERS, &counter_key(), "CounterValue", 1, 0).is_err());

    assert_eq!(store.get(ITEMS, &key).unwrap(), None);
    assert!(store.is_empty(COUNTERS));
    assert_eq!(store.current_lsn(), 0);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_keeps_only_live_records() {
    let (temp, store) = setup_temp_store();
    for i in 0..10 {
        let (key, record) = item_record(&i.to_string(), "CS101", "2024");
        store.put(ITEMS, &key, record).unwrap();
    }
    for i in 0..5 {
        let (key, _) = item_record(&i.to_string(), "CS101", "2024");
        store.delete(ITEMS, &key).unwrap();
    }
    store.increment(COUNTERS, &counter_key(), "CounterValue", 1, 0).unwrap();
    assert_eq!(store.current_lsn(), 16);

    let written = store.compact().unwrap();

    assert_eq!(written, 6);
    assert_eq!(store.current_lsn(), 6);
    let stats = WalRecovery::verify(store.wal_path()).unwrap();
    assert_eq!(stats.entries_recovered, 6);

    let store = reopen(&temp, store);
    assert_eq!(store.len(ITEMS), 5);
    assert_eq!(store.increment(COUNTERS, &counter_key(), "CounterValue", 1, 0).unwrap(), 2);
}

#[test]
fn test_writes_after_compact_are_durable() {
    let (temp, store) = setup_temp_store();
    let (key, record) = item_record("1", "CS101", "2024");
    store.put(ITEMS, &key, record).unwrap();
    store.compact().unwrap();

    let (key2, record2) = item_record("2", "MA200", "2023");
    store.put(ITEMS, &key2, record2.clone()).unwrap();

    let store = reopen(&temp, store);
    assert_eq!(store.len(ITEMS), 2);
    assert_eq!(store.get(ITEMS, &key2).unwrap(), Some(record2));
}
