//! Record framing for `stream.dat`
//!
//! Each record is stored as:
//!
//! ```text
//! +---------------------+
//! | Key Length          | (varint)
//! +---------------------+
//! | Key                 | (UTF-8 bytes)
//! +---------------------+
//! | Payload Length      | (varint)
//! +---------------------+
//! | Payload             | (raw bytes)
//! +---------------------+
//! ```
//!
//! There is no record marker and no checksum; the length prefixes are the
//! only framing, so decoding must consume exactly what encoding produced.

use std::io::{self, Read};

use thiserror::Error;

use super::varint::{read_varint, varint_len, write_varint};

/// Frame decoding errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// Fewer bytes remain than the frame declares
    #[error("truncated frame: {0}")]
    Truncated(&'static str),

    /// A length prefix does not fit in a u64
    #[error("varint exceeds 64 bits")]
    VarintOverflow,

    /// A length prefix carries padding bytes
    #[error("varint is not minimally encoded")]
    NonCanonicalVarint,

    /// Declared length does not fit in memory on this platform
    #[error("declared length {0} is too large")]
    LengthTooLarge(u64),

    /// Stream key is not valid UTF-8
    #[error("stream key is not valid UTF-8: {0}")]
    InvalidKey(#[from] std::string::FromUtf8Error),

    /// Underlying read failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// A decoded record plus the number of bytes it occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Stream key
    pub key: String,
    /// Raw payload
    pub payload: Vec<u8>,
    /// Encoded size in bytes
    pub encoded_len: u64,
}

/// Encoded size of a record without encoding it.
pub fn frame_len(key: &str, payload_len: usize) -> u64 {
    let key_len = key.len();
    (varint_len(key_len as u64) + key_len + varint_len(payload_len as u64) + payload_len) as u64
}

/// Appends the encoding of one record to `buf`.
pub fn encode_frame(key: &str, payload: &[u8], buf: &mut Vec<u8>) {
    buf.reserve(frame_len(key, payload.len()) as usize);
    write_varint(key.len() as u64, buf);
    buf.extend_from_slice(key.as_bytes());
    write_varint(payload.len() as u64, buf);
    buf.extend_from_slice(payload);
}

/// Encodes one record into a fresh buffer.
pub fn encode(key: &str, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_frame(key, payload, &mut buf);
    buf
}

/// Decodes one record, consuming exactly its bytes.
///
/// # Errors
///
/// Returns `Truncated` if the input ends inside the frame. Declared lengths
/// are never trusted for allocation: bytes are read incrementally, so a
/// corrupted length prefix fails as truncation instead of exhausting memory.
pub fn decode_frame<R: Read>(reader: &mut R) -> CodecResult<Frame> {
    let key_len = read_varint(reader)?;
    let key_bytes = read_exact_len(reader, key_len, "key shorter than declared")?;
    let payload_len = read_varint(reader)?;
    let payload = read_exact_len(reader, payload_len, "payload shorter than declared")?;

    Ok(Frame {
        encoded_len: (varint_len(key_len) + varint_len(payload_len)) as u64 + key_len + payload_len,
        key: String::from_utf8(key_bytes)?,
        payload,
    })
}

/// Decodes one record into its `(key, payload)` pair.
pub fn decode<R: Read>(reader: &mut R) -> CodecResult<(String, Vec<u8>)> {
    let frame = decode_frame(reader)?;
    Ok((frame.key, frame.payload))
}

fn read_exact_len<R: Read>(reader: &mut R, len: u64, what: &'static str) -> CodecResult<Vec<u8>> {
    if usize::try_from(len).is_err() {
        return Err(CodecError::LengthTooLarge(len));
    }

    let mut buf = Vec::new();
    reader.take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(CodecError::Truncated(what));
    }
    Ok(buf)
}
