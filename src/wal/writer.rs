//! WAL Writer
//!
//! Handles appending entries to the WAL file.
//!
//! Appending and syncing are separate steps. [`WalWriter::append`] puts a
//! whole frame into the file (visible to readers, not yet fsynced);
//! [`WalWriter::sync_due`] fsyncs when the sync strategy asks for it. A
//! caller that applies an entry elsewhere should do so between the two, so
//! a failed fsync never leaves a logged entry unapplied.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{StoreError, StoreResult};
use super::{Operation, WalEntry, WalRecovery};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    file: File,
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,

    /// End offset of the last complete frame
    len: u64,

    /// Entries appended since the last fsync
    unsynced: usize,

    /// Set when a failed write could not be cut back out of the file
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// An existing file is recovered first (torn tail removed) so that new
    /// entries continue after the last valid LSN.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> StoreResult<Self> {
        let last_lsn = if path.exists() {
            let (_, result) = WalRecovery::recover(path)?;
            result.last_lsn
        } else {
            0
        };

        Self::open_after(path, sync_strategy, last_lsn)
    }

    /// Open for appending, assuming the file is already recovered up to `last_lsn`
    pub fn open_after(path: &Path, sync_strategy: WalSyncStrategy, last_lsn: u64) -> StoreResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            current_lsn: last_lsn,
            sync_strategy,
            len,
            unsynced: 0,
            poisoned: false,
        })
    }

    /// Write an operation as one frame, returning its LSN
    ///
    /// The frame is not fsynced; see [`sync_due`](Self::sync_due). On error
    /// the LSN is not consumed and any partial frame is truncated away. If
    /// truncation fails too, the writer refuses every later append.
    pub fn append(&mut self, operation: Operation) -> StoreResult<u64> {
        if self.poisoned {
            return Err(StoreError::Unavailable(format!(
                "WAL {} has an unremovable partial frame at offset {}",
                self.path.display(),
                self.len
            )));
        }

        let lsn = self.current_lsn + 1;
        let frame = WalEntry::new(lsn, operation).serialize()?;

        if let Err(e) = self.file.write_all(&frame) {
            if let Err(truncate_err) = self.file.set_len(self.len) {
                tracing::error!(
                    "Failed to remove partial WAL frame at offset {}: {}",
                    self.len,
                    truncate_err
                );
                self.poisoned = true;
            }
            return Err(e.into());
        }

        self.len += frame.len() as u64;
        self.current_lsn = lsn;
        self.unsynced += 1;
        Ok(lsn)
    }

    /// fsync if the sync strategy calls for it; returns whether it did
    pub fn sync_due(&mut self) -> StoreResult<bool> {
        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => self.unsynced > 0,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };

        if due {
            self.sync()?;
        }
        Ok(due)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> StoreResult<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// LSN of the last appended entry
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
