//! Per-view consumption cursor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stream::StorageOffset;

/// Suffix appended to a view name to name its cursor blob
pub const CURSOR_SUFFIX: &str = ".info";

/// Returns the blob name under which `view_name`'s cursor is stored.
pub fn cursor_name(view_name: &str) -> String {
    format!("{}{}", view_name, CURSOR_SUFFIX)
}

/// How far a projection has consumed the log.
///
/// Owned by exactly one driver per view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingInfo {
    /// Where the next drain starts reading
    pub next_offset: StorageOffset,
    /// Where the most recent drain started reading
    pub last_offset: StorageOffset,
    /// Start time of the most recent drain
    pub last_run: Option<DateTime<Utc>>,
    /// Decoded events folded so far
    pub events_processed: u64,
}

impl ProcessingInfo {
    /// Marks the start of a drain at `now`.
    pub fn begin_cycle(&mut self, now: DateTime<Utc>) {
        self.last_offset = self.next_offset;
        self.last_run = Some(now);
    }

    /// Moves past a consumed record.
    pub fn advance(&mut self, next_offset: StorageOffset) {
        self.next_offset = next_offset;
    }

    /// Counts one folded event.
    pub fn record_event(&mut self) {
        self.events_processed += 1;
    }
}
