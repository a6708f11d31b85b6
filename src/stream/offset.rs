//! Byte offsets into the log
//!
//! An offset is both a read position ("start here") and a committed
//! length ("the log ends here"). Zero is the start of a fresh log.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::StreamError;

/// Non-negative byte position in `stream.dat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageOffset(u64);

impl StorageOffset {
    /// Start of the log.
    pub const ZERO: StorageOffset = StorageOffset(0);

    /// Creates an offset from a byte count.
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Returns the start-of-log offset.
    pub const fn zero() -> Self {
        Self::ZERO
    }

    /// Returns the offset in bytes.
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Returns whether this is the start of the log.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for StorageOffset {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl TryFrom<i64> for StorageOffset {
    type Error = StreamError;

    fn try_from(bytes: i64) -> Result<Self, Self::Error> {
        u64::try_from(bytes)
            .map(Self)
            .map_err(|_| StreamError::invalid_argument(format!("offset must be non-negative, got {}", bytes)))
    }
}

impl FromStr for StorageOffset {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|e| StreamError::invalid_argument(format!("malformed offset '{}': {}", trimmed, e)))?;
        Self::try_from(value)
    }
}

impl fmt::Display for StorageOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset {}b", self.0)
    }
}
