//! Append-only log store
//!
//! The log is the single source of truth. Projections read it; nothing
//! ever rewrites it.
//!
//! # Guarantees
//!
//! - A record is visible to readers only once the checkpoint covers it
//! - Readers never observe a partially written frame
//! - A batch becomes visible all at once or not at all
//! - Offsets observed by any reader increase monotonically
//! - A frame inside the committed region that cannot be decoded halts the
//!   read; there is no skipping and no repair
//!
//! # Files
//!
//! - `stream.dat`: records framed by `codec`
//! - `stream.chk`: committed length, 8 bytes little-endian
//! - `stream.lock`: exclusive writer lock shared by every process
//! - `<uuid>.stage`: transient batch staging, removed after each batch

mod checkpoint;
mod codec;
mod errors;
mod lock;
mod offset;
mod reader;
mod record;
mod staging;
mod store;
mod varint;

pub use checkpoint::{Checkpoint, CHECKPOINT_FILE_NAME, CHECKPOINT_LEN};
pub use codec::{decode, decode_frame, encode, encode_frame, frame_len, CodecError, CodecResult, Frame};
pub use errors::{Severity, StreamError, StreamErrorCode, StreamResult};
pub use lock::{StoreLock, LOCK_FILE_NAME};
pub use offset::StorageOffset;
pub use reader::RecordIter;
pub use record::{RecordForStaging, RetrievedRecord};
pub use staging::{StagedRecords, StagingFile, STAGING_SUFFIX};
pub use store::{FileStreamStore, DATA_FILE_NAME, UNBOUNDED};
pub use varint::{read_varint, varint_len, write_varint, MAX_VARINT_LEN};
