//! Record types exchanged with log store callers

use super::offset::StorageOffset;

/// A record returned by a read, with the position to resume from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedRecord {
    /// Stream the record was written to
    pub key: String,
    /// Raw payload bytes
    pub data: Vec<u8>,
    /// Offset immediately after this record
    pub next_offset: StorageOffset,
}

impl RetrievedRecord {
    /// Creates a retrieved record.
    pub fn new(key: impl Into<String>, data: Vec<u8>, next_offset: StorageOffset) -> Self {
        Self {
            key: key.into(),
            data,
            next_offset,
        }
    }
}

/// One payload of a batch write. The stream key is supplied per batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordForStaging {
    /// Raw payload bytes
    pub data: Vec<u8>,
}

impl RecordForStaging {
    /// Wraps a payload for staging.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl AsRef<[u8]> for RecordForStaging {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
