//! Observable events
//!
//! Every line the crate logs is named by one of these.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration resolved
    ConfigLoaded,
    /// Process is shutting down
    ShutdownStart,

    // Log store
    /// Store handle opened
    StoreOpened,
    /// Single record committed
    EventWritten,
    /// Batch payloads staged to a temp file
    BatchStaged,
    /// Batch appended and committed
    BatchCommitted,
    /// Batch failed; checkpoint unchanged
    BatchFailed,
    /// Staging file could not be removed
    StagingCleanupFailed,

    // Projections
    /// Projection loaded its state and entered the loop
    ProjectionStart,
    /// A drain consumed one or more records
    ProjectionDrained,
    /// A drain found nothing new
    ProjectionIdle,
    /// Aggregate or cursor could not be persisted
    ViewPersistFailed,
    /// Projection stopped on request
    ProjectionStopped,
    /// Projection stopped on a read failure (FATAL)
    ProjectionFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::StoreOpened => "STORE_OPENED",
            Event::EventWritten => "EVENT_WRITTEN",
            Event::BatchStaged => "BATCH_STAGED",
            Event::BatchCommitted => "BATCH_COMMITTED",
            Event::BatchFailed => "BATCH_FAILED",
            Event::StagingCleanupFailed => "STAGING_CLEANUP_FAILED",
            Event::ProjectionStart => "PROJECTION_START",
            Event::ProjectionDrained => "PROJECTION_DRAINED",
            Event::ProjectionIdle => "PROJECTION_IDLE",
            Event::ViewPersistFailed => "VIEW_PERSIST_FAILED",
            Event::ProjectionStopped => "PROJECTION_STOPPED",
            Event::ProjectionFailed => "PROJECTION_FAILED",
        }
    }

    /// Returns whether this event stops the component that emits it
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ProjectionFailed)
    }

    /// Returns whether this event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::BatchFailed | Event::StagingCleanupFailed | Event::ViewPersistFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
