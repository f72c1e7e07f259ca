//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{StoreError, StoreResult};
use super::entry::{checksum, FrameHeader, HEADER_SIZE, MAX_ENTRY_SIZE};
use super::WalEntry;

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Offset of the next unread frame
    position: u64,

    /// File length at open time
    len: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            len,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns:
    /// - `Ok(None)` at a clean end of file
    /// - `Err(WalCorruption)` on a checksum mismatch; the frame is skipped
    ///   and the next call continues after it
    /// - `Err(WalPartialWrite)` when the file ends mid-frame (torn tail)
    pub fn next_entry(&mut self) -> StoreResult<Option<WalEntry>> {
        let start = self.position;
        let remaining = self.len - start;

        if remaining == 0 {
            return Ok(None);
        }
        if remaining < HEADER_SIZE as u64 {
            return Err(StoreError::WalPartialWrite { offset: start });
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header_bytes)?;
        let header = FrameHeader::parse(&header_bytes);

        if header.len > MAX_ENTRY_SIZE || remaining - (HEADER_SIZE as u64) < header.len as u64 {
            return Err(StoreError::WalPartialWrite { offset: start });
        }

        let mut data = vec![0u8; header.len as usize];
        self.reader.read_exact(&mut data)?;
        self.position = start + HEADER_SIZE as u64 + header.len as u64;

        if checksum(&data) != header.crc {
            return Err(StoreError::WalCorruption(format!(
                "CRC mismatch for lsn {} at offset {}",
                header.lsn, start
            )));
        }

        WalEntry::from_payload(header.lsn, &data).map(Some)
    }

    /// Iterate over entries until end of file or a torn tail
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
///
/// Corrupted frames are yielded as errors and skipped; a torn tail is
/// yielded once and ends iteration.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = StoreResult<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e @ StoreError::WalCorruption(_)) => Some(Err(e)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
