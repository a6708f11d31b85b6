//! Observability for streamfold
//!
//! Structured JSON-lines logging of typed lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution; a failed log write is ignored
//! 3. No background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use streamfold::observability::{log_event_with_fields, Event, Logger};
//!
//! log_event_with_fields(Event::BatchCommitted, &[("records", "42")]);
//! Logger::warn("SOMETHING_ODD", &[]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}
