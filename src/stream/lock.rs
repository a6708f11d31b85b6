//! Cross-process writer lock
//!
//! Every writer, in any process, takes an exclusive lock on `stream.lock`
//! before reading the committed length and holds it until the checkpoint
//! has been advanced. The in-process `Mutex` in `store` only orders threads
//! sharing one `FileStreamStore`; this lock orders separate instances.
//!
//! The lock is advisory and released when the guard drops or the process
//! exits, so a crashed writer never leaves the store locked.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;

use super::errors::{StreamError, StreamResult};

/// Lock file name within a store directory
pub const LOCK_FILE_NAME: &str = "stream.lock";

/// Held exclusive lock on a store directory.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Blocks until the exclusive lock on `store_dir` is acquired.
    ///
    /// # Errors
    ///
    /// Returns `IoFailure` if the lock file cannot be opened or locked.
    pub fn acquire(store_dir: &Path) -> StreamResult<Self> {
        let path = store_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                StreamError::io_failure(format!("Failed to open lock file: {}", path.display()), e)
            })?;

        FileExt::lock_exclusive(&file).map_err(|e| {
            StreamError::io_failure(format!("Failed to lock {}", path.display()), e)
        })?;

        Ok(Self { file, path })
    }

    /// Returns the lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Closing the file releases the lock anyway.
        let _ = FileExt::unlock(&self.file);
    }
}
