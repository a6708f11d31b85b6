//! Projections
//!
//! A projection folds the log into a materialized view and remembers how
//! far it got. Each view has its own driver, cursor and aggregate; drivers
//! share nothing but read access to the log.
//!
//! # Persisted state per view
//!
//! - `<ViewName>`: the aggregate
//! - `<ViewName>.info`: the `ProcessingInfo` cursor

mod cursor;
mod decoder;
mod driver;
mod errors;
pub mod sample;

pub use cursor::{cursor_name, ProcessingInfo, CURSOR_SUFFIX};
pub use decoder::{DecodeFn, EventDecoder};
pub use driver::{
    CycleOutcome, DriverOptions, Projection, ProjectionDriver, DEFAULT_BATCH_SIZE,
    DEFAULT_POLL_INTERVAL,
};
pub use errors::{ProjectionError, ProjectionResult};
