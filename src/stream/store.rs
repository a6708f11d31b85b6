//! File-backed log store
//!
//! A store directory contains two files:
//! - `stream.dat`: concatenated encoded records
//! - `stream.chk`: committed length of `stream.dat` (see `checkpoint`)
//!
//! Writers append bytes at the committed length, fsync, then advance the
//! checkpoint. Both steps run under the instance `Mutex` and the
//! directory's `stream.lock`, so frames from concurrent writers, in this
//! process or another, never interleave and the checkpoint only ever moves
//! to the end of a complete frame. Readers take no lock.
//!
//! Appends go to the committed length, not to the physical end of the
//! file. Bytes left past the checkpoint by a failed or interrupted write
//! are never visible and are overwritten by the next commit.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::checkpoint::Checkpoint;
use super::codec::encode_frame;
use super::errors::{StreamError, StreamResult};
use super::lock::StoreLock;
use super::offset::StorageOffset;
use super::reader::RecordIter;
use super::staging::StagingFile;
use crate::crash_point::{maybe_crash, points};
use crate::observability::{log_event_with_fields, Event, Logger};

/// Data file name within a store directory
pub const DATA_FILE_NAME: &str = "stream.dat";

/// Record count meaning "no limit" for `read_all`
pub const UNBOUNDED: usize = usize::MAX;

/// Append-only log over a directory.
///
/// Share one instance between threads (e.g. in an `Arc`). Separate
/// instances, in one process or many, serialize on `stream.lock`.
#[derive(Debug)]
pub struct FileStreamStore {
    dir: PathBuf,
    data_path: PathBuf,
    checkpoint: Checkpoint,
    write_lock: Mutex<()>,
    read_only: bool,
}

impl FileStreamStore {
    /// Opens a store for reading and writing, creating the directory if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns `IoFailure` if the directory cannot be created.
    pub fn open(dir: &Path) -> StreamResult<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                StreamError::io_failure(
                    format!("Failed to create store directory: {}", dir.display()),
                    e,
                )
            })?;
        }

        let store = Self::with_mode(dir, false);
        log_event_with_fields(
            Event::StoreOpened,
            &[("dir", &dir.display().to_string()), ("mode", "read_write")],
        );
        Ok(store)
    }

    /// Opens a store for reading only. The directory need not exist yet; a
    /// missing store reads as empty.
    pub fn open_read_only(dir: &Path) -> Self {
        let store = Self::with_mode(dir, true);
        log_event_with_fields(
            Event::StoreOpened,
            &[("dir", &dir.display().to_string()), ("mode", "read_only")],
        );
        store
    }

    fn with_mode(dir: &Path, read_only: bool) -> Self {
        Self {
            dir: dir.to_path_buf(),
            data_path: dir.join(DATA_FILE_NAME),
            checkpoint: Checkpoint::new(dir),
            write_lock: Mutex::new(()),
            read_only,
        }
    }

    /// Returns the store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the data file path.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Returns whether writes are refused.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Committed length of the log.
    ///
    /// # Errors
    ///
    /// - `CorruptStore` if the checkpoint exists but the data file does not
    /// - `IoFailure` if the checkpoint cannot be read
    pub fn max_offset(&self) -> StreamResult<StorageOffset> {
        let committed = match self.checkpoint.read()? {
            Some(offset) => offset,
            None => return Ok(StorageOffset::ZERO),
        };

        if !self.data_path.exists() {
            return Err(StreamError::corrupt_store(format!(
                "{} found but {} does not exist",
                self.checkpoint.path().display(),
                self.data_path.display()
            )));
        }

        Ok(committed)
    }

    /// Lazily reads up to `max_record_count` records starting at `start`.
    ///
    /// The read is bounded by the committed length observed now. Pass
    /// `StorageOffset::ZERO` and `UNBOUNDED` to read the whole log.
    ///
    /// # Errors
    ///
    /// Fails immediately with `InvalidRange` if `start` cannot be reached.
    /// Individual items fail with `CorruptFrame` if a committed record
    /// cannot be decoded.
    pub fn read_all(&self, start: StorageOffset, max_record_count: usize) -> StreamResult<RecordIter> {
        let limit = self.max_offset()?;
        RecordIter::open(&self.data_path, start, limit, max_record_count)
    }

    /// Appends one record and commits it.
    ///
    /// Returns the new committed length.
    pub fn write_event(&self, stream_key: &str, data: &[u8]) -> StreamResult<StorageOffset> {
        self.ensure_writable()?;

        let mut frame = Vec::new();
        encode_frame(stream_key, data, &mut frame);

        let committed = self.append_committed(|writer| {
            writer
                .write_all(&frame)
                .map_err(|e| StreamError::io_failure("Failed to append record", e))?;
            Ok(frame.len() as u64)
        })?;

        Logger::trace(
            Event::EventWritten.as_str(),
            &[
                ("stream", stream_key),
                ("next_offset", &committed.bytes().to_string()),
            ],
        );
        Ok(committed)
    }

    /// Stages `payloads`, then appends them all under `stream_key` and
    /// commits them with a single checkpoint update.
    ///
    /// Either the whole batch becomes visible or none of it does. The
    /// staging file is removed whether the commit succeeds or fails.
    ///
    /// Returns the new committed length.
    pub fn write_events_in_large_batch<I>(&self, stream_key: &str, payloads: I) -> StreamResult<StorageOffset>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.try_write_events_in_large_batch(stream_key, payloads.into_iter().map(Ok))
    }

    /// Like `write_events_in_large_batch`, for payloads produced by a
    /// fallible source that is consumed lazily while staging.
    ///
    /// A source error fails the batch before anything is appended.
    pub fn try_write_events_in_large_batch<I, T>(
        &self,
        stream_key: &str,
        payloads: I,
    ) -> StreamResult<StorageOffset>
    where
        I: IntoIterator<Item = io::Result<T>>,
        T: AsRef<[u8]>,
    {
        self.ensure_writable()?;

        let staging = StagingFile::try_create(&self.dir, payloads)?;
        log_event_with_fields(
            Event::BatchStaged,
            &[
                ("stream", stream_key),
                ("records", &staging.record_count().to_string()),
                ("bytes", &staging.payload_bytes().to_string()),
            ],
        );

        maybe_crash(points::BATCH_AFTER_STAGING);

        if staging.record_count() == 0 {
            return self.max_offset();
        }

        let result = self.append_committed(|writer| {
            let mut written = 0u64;
            let mut frame = Vec::new();
            for payload in staging.records()? {
                frame.clear();
                encode_frame(stream_key, &payload?, &mut frame);
                writer
                    .write_all(&frame)
                    .map_err(|e| StreamError::io_failure("Failed to append batch record", e))?;
                written += frame.len() as u64;
            }
            Ok(written)
        });

        match &result {
            Ok(committed) => log_event_with_fields(
                Event::BatchCommitted,
                &[
                    ("stream", stream_key),
                    ("records", &staging.record_count().to_string()),
                    ("next_offset", &committed.bytes().to_string()),
                ],
            ),
            Err(e) => log_event_with_fields(
                Event::BatchFailed,
                &[("stream", stream_key), ("error", &e.to_string())],
            ),
        }

        result
    }

    fn ensure_writable(&self) -> StreamResult<()> {
        if self.read_only {
            return Err(StreamError::invalid_argument(format!(
                "Store {} is opened read-only",
                self.dir.display()
            )));
        }
        Ok(())
    }

    /// Runs `write` against the data file positioned at the committed
    /// length, fsyncs, then advances the checkpoint by the bytes written.
    ///
    /// Holds the instance lock and the directory lock for the whole
    /// sequence.
    fn append_committed<F>(&self, write: F) -> StreamResult<StorageOffset>
    where
        F: FnOnce(&mut BufWriter<&fs::File>) -> StreamResult<u64>,
    {
        let _guard = self.write_lock.lock().map_err(|_| {
            StreamError::io_failure(
                "Writer lock poisoned by a panicked writer",
                io::Error::new(io::ErrorKind::Other, "poisoned lock"),
            )
        })?;
        let _dir_lock = StoreLock::acquire(&self.dir)?;

        let committed = self.max_offset()?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.data_path)
            .map_err(|e| {
                StreamError::io_failure(
                    format!("Failed to open data file: {}", self.data_path.display()),
                    e,
                )
            })?;

        file.seek(SeekFrom::Start(committed.bytes()))
            .map_err(|e| StreamError::io_failure("Failed to seek to committed length", e))?;

        let written = {
            let mut writer = BufWriter::new(&file);
            let written = write(&mut writer)?;
            writer
                .flush()
                .map_err(|e| StreamError::io_failure("Failed to flush data file", e))?;
            written
        };

        file.sync_all()
            .map_err(|e| StreamError::io_failure("fsync failed on data file", e))?;

        maybe_crash(points::APPEND_BEFORE_CHECKPOINT);

        let next = StorageOffset::new(committed.bytes() + written);
        self.checkpoint.commit(next)?;
        Ok(next)
    }
}
