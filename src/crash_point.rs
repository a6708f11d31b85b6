//! Crash point injection for testing durability
//!
//! Crash points are enabled through the `STREAMFOLD_CRASH_POINT`
//! environment variable. When the named point is reached the process
//! terminates via `std::process::abort()`: no cleanup, no unwinding, no
//! destructors.
//!
//! # Usage
//!
//! ```ignore
//! use streamfold::crash_point::{maybe_crash, points};
//!
//! maybe_crash(points::APPEND_BEFORE_CHECKPOINT);
//! ```
//!
//! # Testing
//!
//! ```bash
//! STREAMFOLD_CRASH_POINT=append_before_checkpoint streamfold write --stream s payload
//! ```

use std::sync::OnceLock;

/// Environment variable naming the active crash point
pub const CRASH_POINT_ENV: &str = "STREAMFOLD_CRASH_POINT";

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if `STREAMFOLD_CRASH_POINT` equals `name`.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Aborts the process if the named crash point is enabled.
///
/// No-op when `STREAMFOLD_CRASH_POINT` is unset or names another point.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    /// Data bytes are fsynced but the checkpoint has not moved
    pub const APPEND_BEFORE_CHECKPOINT: &str = "append_before_checkpoint";

    /// Batch payloads are staged but nothing has been appended
    pub const BATCH_AFTER_STAGING: &str = "batch_after_staging";

    /// Get all crash point names
    pub fn all() -> &'static [&'static str] {
        &[APPEND_BEFORE_CHECKPOINT, BATCH_AFTER_STAGING]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crash_point_disabled_by_default() {
        assert!(!crash_point_enabled("test_point"));
    }

    #[test]
    fn test_all_crash_points_defined() {
        let all = points::all();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&"append_before_checkpoint"));
        assert!(all.contains(&"batch_after_staging"));
    }

    #[test]
    fn test_crash_point_names_are_lowercase_with_underscores() {
        for point in points::all() {
            assert!(
                point.chars().all(|c| c.is_lowercase() || c == '_'),
                "Crash point '{}' should be lowercase with underscores",
                point
            );
        }
    }
}
