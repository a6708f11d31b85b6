//! View store errors

use std::io;

use thiserror::Error;

/// Result type for view store operations
pub type ViewResult<T> = Result<T, ViewError>;

/// View store errors
#[derive(Debug, Error)]
pub enum ViewError {
    /// Name is empty or would escape the view directory
    #[error("Invalid view name: {0:?}")]
    InvalidName(String),

    /// Reading or writing the blob failed
    #[error("I/O error on view '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Value could not be serialized
    #[error("Failed to serialize view '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Persisted blob does not match the requested type
    #[error("Failed to parse view '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ViewError {
    pub(crate) fn io(name: &str, source: io::Error) -> Self {
        ViewError::Io {
            name: name.to_string(),
            source,
        }
    }

    /// Returns the view name the error refers to.
    pub fn name(&self) -> &str {
        match self {
            ViewError::InvalidName(name) => name,
            ViewError::Io { name, .. }
            | ViewError::Serialize { name, .. }
            | ViewError::Parse { name, .. } => name,
        }
    }
}
