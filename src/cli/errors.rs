//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::projection::ProjectionError;
use crate::stream::StreamError;
use crate::views::ViewError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration could not be resolved
    ConfigError,
    /// I/O error (input file, stdout)
    IoError,
    /// Log store operation failed
    StreamError,
    /// View directory unusable
    ViewError,
    /// A projection stopped
    ProjectionFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "STREAMFOLD_CLI_CONFIG_ERROR",
            Self::IoError => "STREAMFOLD_CLI_IO_ERROR",
            Self::StreamError => "STREAMFOLD_CLI_STREAM_ERROR",
            Self::ViewError => "STREAMFOLD_CLI_VIEW_ERROR",
            Self::ProjectionFailed => "STREAMFOLD_CLI_PROJECTION_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Projection failure
    pub fn projection_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ProjectionFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StreamError> for CliError {
    fn from(e: StreamError) -> Self {
        Self::new(CliErrorCode::StreamError, e.to_string())
    }
}

impl From<ViewError> for CliError {
    fn from(e: ViewError) -> Self {
        Self::new(CliErrorCode::ViewError, e.to_string())
    }
}

impl From<ProjectionError> for CliError {
    fn from(e: ProjectionError) -> Self {
        Self::projection_failed(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
