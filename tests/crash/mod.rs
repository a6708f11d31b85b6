//! Crash testing framework
//!
//! - Subprocess management with crash injection
//! - Post-crash store inspection

pub mod harness;
pub mod scenarios;
