//! Tests for WAL Writer
//!
//! These tests verify:
//! - Writing entries to WAL
//! - LSN generation and sequencing
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Failed writes leave no frame and no LSN behind
//! - Reopening continues after the last valid LSN

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use itemcatalog::config::WalSyncStrategy;
use itemcatalog::wal::{WalReader, WalWriter};
use itemcatalog::StoreError;
use tempfile::TempDir;

use super::{delete_item, put_item};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn read_all(path: &PathBuf) -> Vec<u64> {
    let mut reader = WalReader::open(path).unwrap();
    let mut lsns = Vec::new();
    while let Some(entry) = reader.next_entry().unwrap() {
        lsns.push(entry.lsn);
    }
    lsns
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    assert!(wal_path.exists());
    assert_eq!(writer.current_lsn(), 0);
    assert_eq!(writer.path(), wal_path.as_path());
}

#[test]
fn test_write_single_entry() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    let lsn = writer.append(put_item("1", "CS101")).unwrap();

    assert_eq!(lsn, 1);
    assert_eq!(writer.current_lsn(), 1);
    assert_eq!(read_all(&wal_path), vec![1]);
}

#[test]
fn test_lsn_sequential() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    let lsns: Vec<u64> = (0..5)
        .map(|i| writer.append(put_item(&i.to_string(), "CS101")).unwrap())
        .collect();

    assert_eq!(lsns, vec![1, 2, 3, 4, 5]);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_append_is_readable_before_sync() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 100 }).unwrap();
    writer.append(put_item("1", "CS101")).unwrap();

    assert_eq!(read_all(&wal_path), vec![1]);
}

#[test]
fn test_every_write_sync_is_always_due() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert!(!writer.sync_due().unwrap());

    writer.append(put_item("1", "CS101")).unwrap();
    assert!(writer.sync_due().unwrap());
    assert!(!writer.sync_due().unwrap());
}

#[test]
fn test_every_n_entries_syncs_at_threshold() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 3 }).unwrap();
    writer.append(put_item("1", "CS101")).unwrap();
    assert!(!writer.sync_due().unwrap());
    writer.append(put_item("2", "CS101")).unwrap();
    assert!(!writer.sync_due().unwrap());
    writer.append(put_item("3", "CS101")).unwrap();
    assert!(writer.sync_due().unwrap());

    // Counter restarts after the sync
    writer.append(delete_item("1", "CS101")).unwrap();
    assert!(!writer.sync_due().unwrap());
    writer.sync().unwrap();
    assert_eq!(read_all(&wal_path), vec![1, 2, 3, 4]);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[cfg(target_os = "linux")]
#[test]
fn test_failed_write_consumes_no_lsn_and_poisons() {
    // Every write to /dev/full fails with ENOSPC, and it cannot be truncated
    let mut writer =
        WalWriter::open_after(Path::new("/dev/full"), WalSyncStrategy::EveryWrite, 7).unwrap();

    let err = writer.append(put_item("1", "CS101")).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
    assert_eq!(writer.current_lsn(), 7);

    let err = writer.append(put_item("2", "CS101")).unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert_eq!(writer.current_lsn(), 7);
}

// =============================================================================
// Reopen Tests
// =============================================================================

#[test]
fn test_reopen_continues_lsn() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(put_item("1", "CS101")).unwrap();
        writer.append(put_item("2", "CS101")).unwrap();
    }

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 2);
    assert_eq!(writer.append(put_item("3", "CS101")).unwrap(), 3);
    assert_eq!(read_all(&wal_path), vec![1, 2, 3]);
}

#[test]
fn test_reopen_discards_torn_tail_before_appending() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(put_item("1", "CS101")).unwrap();
    }
    {
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(&[0xAB; 7]).unwrap();
    }

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(put_item("2", "CS101")).unwrap();

    assert_eq!(read_all(&wal_path), vec![1, 2]);
}
