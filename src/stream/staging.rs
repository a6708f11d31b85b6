//! Batch staging files
//!
//! A batch write first copies its payloads into a uniquely named file in
//! the store directory:
//!
//! ```text
//! +------------------+
//! | Payload Length   | (u32 LE)
//! +------------------+
//! | Payload          | (raw bytes)
//! +------------------+
//! | ...              |
//! ```
//!
//! No stream key is staged; it is supplied once when the batch is merged.
//! The `StagingFile` guard deletes the file when dropped, on success and on
//! every failure path.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::errors::{StreamError, StreamResult};
use crate::observability::{log_event_with_fields, Event};

/// Suffix of staging file names
pub const STAGING_SUFFIX: &str = ".stage";

/// A staged batch on disk, removed when the guard is dropped.
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
    record_count: usize,
    payload_bytes: u64,
}

impl StagingFile {
    /// Stages `payloads` into a new file under `dir`.
    ///
    /// The guard exists before the first byte is written, so a failure
    /// part-way through still removes the partial file.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if a payload is longer than `u32::MAX` bytes
    /// - `IoFailure` if the file cannot be created or written
    pub fn create<I>(dir: &Path, payloads: I) -> StreamResult<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        Self::try_create(dir, payloads.into_iter().map(Ok))
    }

    /// Stages payloads produced by a fallible source, such as lines read
    /// from a file.
    ///
    /// # Errors
    ///
    /// As `create`, plus `IoFailure` for the first source error. The
    /// partial staging file is removed.
    pub fn try_create<I, T>(dir: &Path, payloads: I) -> StreamResult<Self>
    where
        I: IntoIterator<Item = io::Result<T>>,
        T: AsRef<[u8]>,
    {
        let mut staging = Self {
            path: dir.join(format!("{}{}", Uuid::new_v4(), STAGING_SUFFIX)),
            record_count: 0,
            payload_bytes: 0,
        };

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staging.path)
            .map_err(|e| {
                StreamError::io_failure(
                    format!("Failed to create staging file: {}", staging.path.display()),
                    e,
                )
            })?;
        let mut writer = BufWriter::new(file);

        for payload in payloads {
            let payload = payload.map_err(|e| {
                StreamError::io_failure(
                    format!("Failed to read batch payload {}", staging.record_count),
                    e,
                )
            })?;
            let payload = payload.as_ref();
            let len = u32::try_from(payload.len()).map_err(|_| {
                StreamError::invalid_argument(format!(
                    "Batch payload {} is {} bytes, limit is {}",
                    staging.record_count,
                    payload.len(),
                    u32::MAX
                ))
            })?;

            writer
                .write_all(&len.to_le_bytes())
                .and_then(|_| writer.write_all(payload))
                .map_err(|e| StreamError::io_failure("Failed to write staging file", e))?;

            staging.record_count += 1;
            staging.payload_bytes += payload.len() as u64;
        }

        writer
            .flush()
            .map_err(|e| StreamError::io_failure("Failed to flush staging file", e))?;

        Ok(staging)
    }

    /// Returns the staging file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of staged payloads.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Total payload bytes, excluding length prefixes.
    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }

    /// Reads the staged payloads back in order.
    pub fn records(&self) -> StreamResult<StagedRecords> {
        let file = File::open(&self.path).map_err(|e| {
            StreamError::io_failure(
                format!("Failed to open staging file: {}", self.path.display()),
                e,
            )
        })?;

        Ok(StagedRecords {
            reader: BufReader::new(file),
            remaining: self.record_count,
        })
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                log_event_with_fields(
                    Event::StagingCleanupFailed,
                    &[
                        ("path", &self.path.display().to_string()),
                        ("error", &e.to_string()),
                    ],
                );
            }
        }
    }
}

/// Iterator over the payloads of a staging file.
pub struct StagedRecords {
    reader: BufReader<File>,
    remaining: usize,
}

impl Iterator for StagedRecords {
    type Item = StreamResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let mut len_buf = [0u8; 4];
        let result = self
            .reader
            .read_exact(&mut len_buf)
            .and_then(|_| {
                let mut payload = vec![0u8; u32::from_le_bytes(len_buf) as usize];
                self.reader.read_exact(&mut payload).map(|_| payload)
            })
            .map_err(|e| StreamError::io_failure("Failed to read staging file", e));

        if result.is_err() {
            self.remaining = 0;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_stage_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let staging =
            StagingFile::create(temp_dir.path(), vec![b"one".to_vec(), b"".to_vec(), b"three".to_vec()])
                .unwrap();

        assert_eq!(staging.record_count(), 3);
        assert_eq!(staging.payload_bytes(), 8);
        assert!(staging.path().exists());

        let payloads: Vec<_> = staging.records().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(payloads, vec![b"one".to_vec(), Vec::new(), b"three".to_vec()]);
    }

    #[test]
    fn test_staged_framing_is_u32_le_length() {
        let temp_dir = TempDir::new().unwrap();
        let staging = StagingFile::create(temp_dir.path(), [b"ab"]).unwrap();

        let bytes = std::fs::read(staging.path()).unwrap();
        assert_eq!(bytes, vec![2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_drop_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = {
            let staging = StagingFile::create(temp_dir.path(), [b"x"]).unwrap();
            staging.path().to_path_buf()
        };

        assert!(!path.exists());
        assert_eq!(dir_entries(temp_dir.path()), 0);
    }

    #[test]
    fn test_unique_names() {
        let temp_dir = TempDir::new().unwrap();
        let a = StagingFile::create(temp_dir.path(), [b"x"]).unwrap();
        let b = StagingFile::create(temp_dir.path(), [b"y"]).unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(dir_entries(temp_dir.path()), 2);
    }

    #[test]
    fn test_create_fails_in_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(StagingFile::create(&missing, [b"x"]).is_err());
    }

    #[test]
    fn test_source_error_removes_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = vec![
            Ok(b"ok".to_vec()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad line")),
            Ok(b"never".to_vec()),
        ];

        let err = StagingFile::try_create(temp_dir.path(), source).unwrap_err();
        assert_eq!(err.code(), crate::stream::StreamErrorCode::IoFailure);
        assert_eq!(dir_entries(temp_dir.path()), 0);
    }
}
