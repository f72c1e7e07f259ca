//! Journaled store
//!
//! A [`MemoryStore`] made durable by the write-ahead log.
//!
//! ## Write path
//! write_lock → compute resulting record → WAL append → apply to memory → fsync
//!
//! An entry that reached the log is always applied, even if the fsync after
//! it fails. The caller then gets the sync error, but memory and the log
//! (and so every later replay) agree.
//!
//! ## Read path
//! Straight to the in-memory tables (shared lock only)

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::{Config, WalSyncStrategy};
use crate::error::StoreResult;
use crate::model::{AttributeValue, Key, Record};
use crate::wal::{Operation, RecoveryResult, WalRecovery, WalWriter};

use super::memory::incremented;
use super::{KeyValueStore, MemoryStore};

/// Durable key-value store backed by a WAL
pub struct JournaledStore {
    /// Directory holding the WAL
    data_dir: PathBuf,

    wal_path: PathBuf,

    /// Current table contents (rebuilt from the WAL on open)
    memory: MemoryStore,

    /// Write-ahead log (exclusive access needed)
    wal: Mutex<WalWriter>,

    sync_strategy: WalSyncStrategy,

    /// Serializes mutations so read-modify-write operations stay atomic
    write_lock: Mutex<()>,

    /// Stats from the recovery performed at open
    recovery: RecoveryResult,
}

impl JournaledStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "catalog.wal";
    const COMPACT_FILENAME: &'static str = "catalog.wal.compact";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Recover the WAL if it exists (torn tail truncated)
    /// 3. Replay recovered entries into memory
    /// 4. Reopen the WAL for appending after the last valid LSN
    pub fn open(config: &Config) -> StoreResult<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let wal_path = config.data_dir.join(Self::WAL_FILENAME);
        let memory = MemoryStore::with_indexes(config.indexes.clone());

        let recovery = if wal_path.exists() {
            let (entries, result) = WalRecovery::recover(&wal_path)?;

            if result.entries_recovered > 0 || result.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}, truncated={}",
                    result.entries_recovered,
                    result.entries_corrupted,
                    result.last_lsn,
                    result.was_truncated
                );
            }

            for entry in entries {
                memory.apply(entry.operation);
            }
            result
        } else {
            RecoveryResult::default()
        };

        let wal = WalWriter::open_after(&wal_path, config.wal_sync_strategy, recovery.last_lsn)?;

        Ok(Self {
            data_dir: config.data_dir.clone(),
            wal_path,
            memory,
            wal: Mutex::new(wal),
            sync_strategy: config.wal_sync_strategy,
            write_lock: Mutex::new(()),
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> StoreResult<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(&config)
    }

    /// Log, apply, then fsync per strategy; caller holds `write_lock`
    fn commit(&self, operation: Operation) -> StoreResult<Option<Record>> {
        let mut wal = self.wal.lock();
        wal.append(operation.clone())?;

        let previous = self.memory.apply(operation);
        if let Err(e) = wal.sync_due() {
            tracing::error!("WAL sync failed after lsn {}: {}", wal.current_lsn(), e);
            return Err(e);
        }
        Ok(previous)
    }

    /// Rewrite the WAL as one `Put` per live record
    ///
    /// The checkpoint is written to a side file, synced, then renamed over
    /// the live log. Returns the number of records written.
    pub fn compact(&self) -> StoreResult<usize> {
        let _write_guard = self.write_lock.lock();
        let mut wal = self.wal.lock();

        let compact_path = self.data_dir.join(Self::COMPACT_FILENAME);
        if compact_path.exists() {
            fs::remove_file(&compact_path)?;
        }

        let snapshot = self.memory.snapshot();
        let count = snapshot.len();

        let mut checkpoint = WalWriter::open_after(
            &compact_path,
            WalSyncStrategy::EveryNEntries { count: usize::MAX },
            0,
        )?;
        for (table, key, record) in snapshot {
            checkpoint.append(Operation::Put { table, key, record })?;
        }
        checkpoint.sync()?;
        let last_lsn = checkpoint.current_lsn();
        drop(checkpoint);

        wal.sync()?;
        fs::rename(&compact_path, &self.wal_path)?;
        *wal = WalWriter::open_after(&self.wal_path, self.sync_strategy, last_lsn)?;

        tracing::info!("WAL compacted to {} records", count);
        Ok(count)
    }

    /// Sync the WAL to disk
    pub fn sync(&self) -> StoreResult<()> {
        self.wal.lock().sync()
    }

    /// Close the store gracefully, syncing any buffered WAL entries
    pub fn close(self) -> StoreResult<()> {
        self.wal.lock().sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// Recovery stats from open
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// LSN of the last appended entry
    pub fn current_lsn(&self) -> u64 {
        self.wal.lock().current_lsn()
    }

    /// Number of records in a table
    pub fn len(&self, table: &str) -> usize {
        self.memory.len(table)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.memory.is_empty(table)
    }
}

impl KeyValueStore for JournaledStore {
    fn get(&self, table: &str, key: &Key) -> StoreResult<Option<Record>> {
        Ok(self.memory.read_record(table, key))
    }

    fn put(&self, table: &str, key: &Key, record: Record) -> StoreResult<()> {
        let _write_guard = self.write_lock.lock();
        self.commit(Operation::Put {
            table: table.to_string(),
            key: key.clone(),
            record,
        })?;
        Ok(())
    }

    fn delete(&self, table: &str, key: &Key) -> StoreResult<Option<Record>> {
        let _write_guard = self.write_lock.lock();

        // Nothing to journal for an absent key
        if self.memory.read_record(table, key).is_none() {
            return Ok(None);
        }

        self.commit(Operation::Delete {
            table: table.to_string(),
            key: key.clone(),
        })
    }

    fn increment(&self, table: &str, key: &Key, field: &str, delta: i64, initial: i64) -> StoreResult<i64> {
        let _write_guard = self.write_lock.lock();

        let existing = self.memory.read_record(table, key);
        let (next, record) = incremented(existing, key, field, delta, initial)?;

        // Journaled as the resulting record so replay is idempotent
        self.commit(Operation::Put {
            table: table.to_string(),
            key: key.clone(),
            record,
        })?;

        Ok(next)
    }

    fn query_index(
        &self,
        table: &str,
        index: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> StoreResult<Vec<Record>> {
        self.memory.query_unchecked(table, index, attribute, value)
    }

    fn scan(&self, table: &str, filter: Option<(&str, &AttributeValue)>) -> StoreResult<Vec<Record>> {
        Ok(self.memory.scan_unchecked(table, filter))
    }
}
