//! Materialized view persistence
//!
//! Projections persist two blobs per view through a `ViewStore`: the
//! aggregate under `<ViewName>` and the cursor under `<ViewName>.info`.

mod errors;
mod store;

pub use errors::{ViewError, ViewResult};
pub use store::{FileViewStore, ViewStore, VIEW_FILE_EXTENSION};
