//! Checkpoint file handling
//!
//! `stream.chk` holds exactly 8 bytes: the committed length of
//! `stream.dat` as a little-endian u64. It is the visibility boundary for
//! readers; bytes past it may exist physically but are never read.
//!
//! Every commit rewrites the whole file through a temp file and a rename,
//! so a concurrent reader sees either the previous or the new value.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::errors::{StreamError, StreamResult};
use super::offset::StorageOffset;

/// Checkpoint file name within a store directory
pub const CHECKPOINT_FILE_NAME: &str = "stream.chk";

/// Size of the checkpoint file in bytes
pub const CHECKPOINT_LEN: usize = 8;

/// Handle to a store's checkpoint file.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    /// Creates a handle for the checkpoint inside `store_dir`.
    pub fn new(store_dir: &Path) -> Self {
        Self {
            path: store_dir.join(CHECKPOINT_FILE_NAME),
        }
    }

    /// Returns the checkpoint file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the committed length.
    ///
    /// Returns `None` when the file does not exist, which means the log is
    /// new regardless of what else is in the directory.
    ///
    /// # Errors
    ///
    /// - `CorruptStore` if the file is not exactly 8 bytes
    /// - `IoFailure` on any other read error
    pub fn read(&self) -> StreamResult<Option<StorageOffset>> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StreamError::io_failure(
                    format!("Failed to open checkpoint: {}", self.path.display()),
                    e,
                ))
            }
        };

        let mut buf = Vec::with_capacity(CHECKPOINT_LEN);
        file.read_to_end(&mut buf).map_err(|e| {
            StreamError::io_failure(
                format!("Failed to read checkpoint: {}", self.path.display()),
                e,
            )
        })?;

        let bytes: [u8; CHECKPOINT_LEN] = buf.as_slice().try_into().map_err(|_| {
            StreamError::corrupt_store(format!(
                "Checkpoint {} has {} bytes, expected {}",
                self.path.display(),
                buf.len(),
                CHECKPOINT_LEN
            ))
        })?;

        Ok(Some(StorageOffset::new(u64::from_le_bytes(bytes))))
    }

    /// Durably replaces the committed length.
    ///
    /// 1. Write the new value to a uniquely named temp file
    /// 2. fsync the temp file
    /// 3. Rename over `stream.chk`
    /// 4. fsync the directory
    pub fn commit(&self, committed: StorageOffset) -> StreamResult<()> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let temp_path = dir.join(format!("{}.{}.tmp", CHECKPOINT_FILE_NAME, Uuid::new_v4()));

        let result = self.write_via(&temp_path, committed);
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn write_via(&self, temp_path: &Path, committed: StorageOffset) -> StreamResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp_path)
            .map_err(|e| {
                StreamError::io_failure(
                    format!("Failed to create checkpoint temp file: {}", temp_path.display()),
                    e,
                )
            })?;

        file.write_all(&committed.bytes().to_le_bytes()).map_err(|e| {
            StreamError::io_failure("Failed to write checkpoint", e)
        })?;

        file.sync_all().map_err(|e| {
            StreamError::io_failure("Failed to fsync checkpoint", e)
        })?;

        fs::rename(temp_path, &self.path).map_err(|e| {
            StreamError::io_failure(
                format!("Failed to replace checkpoint: {}", self.path.display()),
                e,
            )
        })?;

        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}
