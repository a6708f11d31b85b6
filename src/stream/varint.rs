//! Variable-length unsigned integers
//!
//! Seven data bits per byte, least significant group first. The high bit
//! of each byte is the continuation flag: set means another byte follows.
//!
//! | Value range        | Bytes |
//! |--------------------|-------|
//! | 0 – 127            | 1     |
//! | 128 – 16,383       | 2     |
//! | 16,384 – 2,097,151 | 3     |
//! | ...                | ...   |
//! | up to 2⁶⁴-1        | 10    |

use std::io::{self, Read};

use super::codec::{CodecError, CodecResult};

/// Longest encoding of a u64.
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const DATA_MASK: u8 = 0x7F;

/// Appends the encoding of `value` to `buf`.
pub fn write_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= CONTINUATION as u64 {
        buf.push((value as u8 & DATA_MASK) | CONTINUATION);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Number of bytes `write_varint` produces for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Reads one varint, consuming exactly its bytes.
///
/// # Errors
///
/// - `Truncated` if the input ends before the final byte
/// - `VarintOverflow` if the encoding does not fit in a u64
/// - `NonCanonicalVarint` if the encoding is longer than `write_varint`
///   would produce, since frame sizes are derived from `varint_len`
pub fn read_varint<R: Read>(reader: &mut R) -> CodecResult<u64> {
    let mut value = 0u64;
    let mut byte = [0u8; 1];

    for i in 0..MAX_VARINT_LEN {
        reader.read_exact(&mut byte).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => CodecError::Truncated("varint ended early"),
            _ => CodecError::Io(e),
        })?;

        let data = (byte[0] & DATA_MASK) as u64;
        let shift = 7 * i as u32;
        // The tenth byte may only carry the single remaining bit.
        if i == MAX_VARINT_LEN - 1 && data > 1 {
            return Err(CodecError::VarintOverflow);
        }
        value |= data << shift;

        if byte[0] & CONTINUATION == 0 {
            // A zero final group after the first byte is padding.
            if i > 0 && byte[0] == 0 {
                return Err(CodecError::NonCanonicalVarint);
            }
            return Ok(value);
        }
    }

    Err(CodecError::VarintOverflow)
}
