//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{StoreError, StoreResult};
use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Offset where a torn tail starts, if one was found
    pub torn_tail_at: Option<u64>,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Detect and skip corrupted entries
    /// 3. Truncate partial writes at end
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> StoreResult<(Vec<WalEntry>, RecoveryResult)> {
        Self::scan(path, true)
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> StoreResult<RecoveryResult> {
        Self::scan(path, false).map(|(_, result)| result)
    }

    fn scan(path: &Path, repair: bool) -> StoreResult<(Vec<WalEntry>, RecoveryResult)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();

        loop {
            match reader.next_entry() {
                Ok(Some(entry)) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    if repair {
                        entries.push(entry);
                    }
                }
                Ok(None) => break,
                Err(StoreError::WalCorruption(reason)) => {
                    tracing::warn!("Skipping corrupted WAL entry in {}: {}", path.display(), reason);
                    result.entries_corrupted += 1;
                }
                Err(StoreError::WalPartialWrite { offset }) => {
                    tracing::warn!("Torn WAL tail in {} at offset {}", path.display(), offset);
                    result.torn_tail_at = Some(offset);
                    if repair {
                        let file = OpenOptions::new().write(true).open(path)?;
                        file.set_len(offset)?;
                        file.sync_all()?;
                        result.was_truncated = true;
                    }
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((entries, result))
    }
}
