//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their frame
//! encoding.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::model::{Key, Record};

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Largest payload a frame may declare (16 MB); larger lengths mean a torn header
pub const MAX_ENTRY_SIZE: u32 = 16 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Store a whole record under a key
    Put { table: String, key: Key, record: Record },

    /// Remove a key
    Delete { table: String, key: Key },
}

impl Operation {
    pub fn table(&self) -> &str {
        match self {
            Operation::Put { table, .. } | Operation::Delete { table, .. } => table,
        }
    }
}

/// Parsed frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

impl FrameHeader {
    pub(crate) fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut cursor = &bytes[..];
        Self {
            lsn: cursor.get_u64(),
            crc: cursor.get_u32(),
            len: cursor.get_u32(),
        }
    }
}

pub(crate) fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode as a full frame: header + bincode payload
    pub fn serialize(&self) -> StoreResult<Vec<u8>> {
        let data = bincode::serialize(&(&self.operation, self.timestamp))?;
        if data.len() > MAX_ENTRY_SIZE as usize {
            return Err(StoreError::Serialization(format!(
                "WAL entry too large: {} bytes (max {})",
                data.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut frame = BytesMut::with_capacity(HEADER_SIZE + data.len());
        frame.put_u64(self.lsn);
        frame.put_u32(checksum(&data));
        frame.put_u32(data.len() as u32);
        frame.put_slice(&data);

        Ok(frame.to_vec())
    }

    /// Decode a single frame from the start of `bytes`
    pub fn deserialize(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::WalCorruption(format!(
                "incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        header_bytes.copy_from_slice(&bytes[..HEADER_SIZE]);
        let header = FrameHeader::parse(&header_bytes);

        let end = HEADER_SIZE + header.len as usize;
        if bytes.len() < end {
            return Err(StoreError::WalCorruption(format!(
                "incomplete payload: expected {} bytes, got {}",
                header.len,
                bytes.len() - HEADER_SIZE
            )));
        }

        let data = &bytes[HEADER_SIZE..end];
        if checksum(data) != header.crc {
            return Err(StoreError::WalCorruption(format!(
                "CRC mismatch for lsn {}",
                header.lsn
            )));
        }

        Self::from_payload(header.lsn, data)
    }

    /// Rebuild an entry from a checksummed payload
    pub(crate) fn from_payload(lsn: u64, data: &[u8]) -> StoreResult<Self> {
        let (operation, timestamp): (Operation, u64) = bincode::deserialize(data)
            .map_err(|e| StoreError::WalCorruption(format!("undecodable payload for lsn {}: {}", lsn, e)))?;

        Ok(Self {
            lsn,
            operation,
            timestamp,
        })
    }
}
