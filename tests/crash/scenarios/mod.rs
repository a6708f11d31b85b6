//! Crash scenarios, one file per write path

mod append;
mod batch;
