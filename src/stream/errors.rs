//! Log store error types
//!
//! Error codes:
//! - STREAM_INVALID_ARGUMENT (ERROR severity)
//! - STREAM_INVALID_RANGE (ERROR severity)
//! - STREAM_IO_FAILURE (ERROR severity)
//! - STREAM_CORRUPT_STORE (FATAL severity)
//! - STREAM_CORRUPT_FRAME (FATAL severity)
//!
//! A payload that matches no known event shape is not an error at this
//! layer; the projection decoder simply yields nothing for it.

use std::fmt;
use std::io;

/// Severity levels for log store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the store stays usable
    Error,
    /// The store's integrity is in question; readers must stop
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Log store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorCode {
    /// Caller passed a malformed value (negative offset, unparsable number, ...)
    InvalidArgument,
    /// Read start offset cannot be reached in the data file
    InvalidRange,
    /// Checkpoint present without a data file
    CorruptStore,
    /// A record inside the committed region cannot be fully decoded
    CorruptFrame,
    /// Underlying read, write or seek failure
    IoFailure,
}

impl StreamErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StreamErrorCode::InvalidArgument => "STREAM_INVALID_ARGUMENT",
            StreamErrorCode::InvalidRange => "STREAM_INVALID_RANGE",
            StreamErrorCode::CorruptStore => "STREAM_CORRUPT_STORE",
            StreamErrorCode::CorruptFrame => "STREAM_CORRUPT_FRAME",
            StreamErrorCode::IoFailure => "STREAM_IO_FAILURE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StreamErrorCode::InvalidArgument => Severity::Error,
            StreamErrorCode::InvalidRange => Severity::Error,
            StreamErrorCode::IoFailure => Severity::Error,
            StreamErrorCode::CorruptStore => Severity::Fatal,
            StreamErrorCode::CorruptFrame => Severity::Fatal,
        }
    }
}

impl fmt::Display for StreamErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Log store error with context
#[derive(Debug)]
pub struct StreamError {
    code: StreamErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StreamError {
    fn new(code: StreamErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StreamErrorCode::InvalidArgument, message)
    }

    /// Create an invalid range error for an unreachable start offset
    pub fn invalid_range(offset: u64, message: impl Into<String>) -> Self {
        Self::new(StreamErrorCode::InvalidRange, message).with_offset(offset)
    }

    /// Create a corrupt store error
    pub fn corrupt_store(message: impl Into<String>) -> Self {
        Self::new(StreamErrorCode::CorruptStore, message)
    }

    /// Create a corrupt frame error at the given byte offset
    pub fn corrupt_frame(offset: u64, message: impl Into<String>) -> Self {
        Self::new(StreamErrorCode::CorruptFrame, message).with_offset(offset)
    }

    /// Create an I/O failure error
    pub fn io_failure(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StreamErrorCode::IoFailure,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    fn with_offset(mut self, offset: u64) -> Self {
        self.details = Some(format!("byte_offset: {}", offset));
        self
    }

    /// Returns the error code
    pub fn code(&self) -> StreamErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error means the store can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for log store operations
pub type StreamResult<T> = Result<T, StreamError>;
