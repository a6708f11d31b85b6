//! streamfold - an append-only event log with resumable projections
//!
//! - `stream`: the log store, its record codec and checkpoint
//! - `projection`: polling drivers that fold the log into views
//! - `views`: durable named blobs for aggregates and cursors

pub mod cli;
pub mod config;
pub mod crash_point;
pub mod observability;
pub mod projection;
pub mod stream;
pub mod views;
