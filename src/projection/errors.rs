//! Projection errors

use thiserror::Error;

use crate::stream::StreamError;
use crate::views::ViewError;

/// Result type for projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors that stop a projection.
///
/// Persist failures during the loop are logged and never surface here.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Reading the log failed; the view's loop cannot continue
    #[error("Failed to read log for view '{view}': {source}")]
    Read {
        view: String,
        #[source]
        source: StreamError,
    },

    /// The persisted aggregate or cursor could not be loaded
    #[error("Failed to load view '{view}': {source}")]
    Load {
        view: String,
        #[source]
        source: ViewError,
    },
}

impl ProjectionError {
    /// Returns the name of the view that failed.
    pub fn view(&self) -> &str {
        match self {
            ProjectionError::Read { view, .. } | ProjectionError::Load { view, .. } => view,
        }
    }
}
