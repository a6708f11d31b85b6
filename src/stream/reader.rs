//! Bounded, lazy record reader
//!
//! A read captures the committed length once, when it starts, and never
//! reads past it. Records appended after that point, or bytes of an append
//! still in flight, are invisible to this read; a later read picks them up.
//!
//! Inside the committed region there is zero tolerance: a frame that cannot
//! be decoded, or that would end past the bound, fails the read with
//! `STREAM_CORRUPT_FRAME`. Nothing is skipped and nothing is repaired.

use std::fs::File;
use std::io::{self, BufReader, Seek, SeekFrom};
use std::path::Path;

use super::codec::{decode_frame, CodecError};
use super::errors::{StreamError, StreamResult};
use super::offset::StorageOffset;
use super::record::RetrievedRecord;

/// Lazy sequence of records between a start offset and a checkpoint.
///
/// Each call to `next` decodes exactly one record. After the first error
/// the iterator is exhausted.
pub struct RecordIter {
    reader: Option<BufReader<File>>,
    position: u64,
    limit: u64,
    remaining: usize,
    failed: bool,
}

impl RecordIter {
    /// An iterator that yields nothing.
    pub fn empty(at: StorageOffset) -> Self {
        Self {
            reader: None,
            position: at.bytes(),
            limit: at.bytes(),
            remaining: 0,
            failed: false,
        }
    }

    /// Opens `data_path` positioned at `start`, bounded by `limit`.
    ///
    /// # Errors
    ///
    /// - `InvalidRange` if `start` is past `limit` or past the end of the
    ///   data file, or if the seek lands anywhere else
    /// - `CorruptStore` if the data file is missing while `limit > 0`
    /// - `IoFailure` on any other open/seek failure
    pub fn open(
        data_path: &Path,
        start: StorageOffset,
        limit: StorageOffset,
        max_record_count: usize,
    ) -> StreamResult<Self> {
        if start > limit {
            return Err(StreamError::invalid_range(
                start.bytes(),
                format!("Start offset is past the committed length {}", limit.bytes()),
            ));
        }

        if start == limit || max_record_count == 0 {
            return Ok(Self::empty(start));
        }

        let mut file = File::open(data_path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StreamError::corrupt_store(format!(
                    "Checkpoint found but data file does not exist: {}",
                    data_path.display()
                ))
            } else {
                StreamError::io_failure(
                    format!("Failed to open data file: {}", data_path.display()),
                    e,
                )
            }
        })?;

        let physical_len = file
            .metadata()
            .map_err(|e| StreamError::io_failure("Failed to read data file metadata", e))?
            .len();
        if start.bytes() > physical_len {
            return Err(StreamError::invalid_range(
                start.bytes(),
                format!("Start offset is past the end of the data file ({} bytes)", physical_len),
            ));
        }

        let reached = file
            .seek(SeekFrom::Start(start.bytes()))
            .map_err(|e| StreamError::io_failure("Failed to seek data file", e))?;
        if reached != start.bytes() {
            return Err(StreamError::invalid_range(
                start.bytes(),
                format!("Seek reached {} instead", reached),
            ));
        }

        Ok(Self {
            reader: Some(BufReader::new(file)),
            position: start.bytes(),
            limit: limit.bytes(),
            remaining: max_record_count,
            failed: false,
        })
    }

    /// Offset the next record would be read from.
    pub fn position(&self) -> StorageOffset {
        StorageOffset::new(self.position)
    }

    /// Committed length this read is bounded by.
    pub fn limit(&self) -> StorageOffset {
        StorageOffset::new(self.limit)
    }

    fn read_one(&mut self) -> StreamResult<RetrievedRecord> {
        let at = self.position;
        let reader = match self.reader.as_mut() {
            Some(r) => r,
            None => return Err(StreamError::corrupt_frame(at, "Reader is not open")),
        };

        let frame = decode_frame(reader).map_err(|e| match e {
            CodecError::Io(io_err) => StreamError::io_failure(
                format!("Failed to read frame at byte {}", at),
                io_err,
            ),
            other => StreamError::corrupt_frame(at, other.to_string()),
        })?;

        let next = at + frame.encoded_len;
        if next > self.limit {
            return Err(StreamError::corrupt_frame(
                at,
                format!(
                    "Frame ends at {} past the committed length {}",
                    next, self.limit
                ),
            ));
        }

        self.position = next;
        Ok(RetrievedRecord::new(frame.key, frame.payload, StorageOffset::new(next)))
    }
}

impl Iterator for RecordIter {
    type Item = StreamResult<RetrievedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 || self.position >= self.limit {
            return None;
        }

        match self.read_one() {
            Ok(record) => {
                self.remaining -= 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.failed = true;
                self.reader = None;
                Some(Err(e))
            }
        }
    }
}
