//! Projection driver
//!
//! One driver folds the log into one named view. Each cycle:
//!
//! 1. Stamp the cursor (`last_offset`, `last_run`)
//! 2. Drain up to `batch_size` records from `cursor.next_offset`
//! 3. For each record advance the cursor; fold it if it decodes
//! 4. Nothing drained: persist the cursor only and back off
//!    Something drained: persist the aggregate, then the cursor, and drain
//!    again without pausing
//!
//! Persist failures are logged and the loop carries on with the in-memory
//! state. Read failures end the loop.
//!
//! Because the aggregate is written before the cursor, a failure between
//! the two leaves a cursor that lags the aggregate; on restart those
//! records are folded again. A failed aggregate write followed by a
//! successful cursor write (next cycle) leaves the aggregate short of the
//! unsaved increment instead. Delivery is at-least-once, not exactly-once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::cursor::{cursor_name, ProcessingInfo};
use super::decoder::EventDecoder;
use super::errors::{ProjectionError, ProjectionResult};
use crate::config::Config;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::stream::FileStreamStore;
use crate::views::{ViewError, ViewStore};

/// Records requested per drain unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Backoff after an empty drain unless configured otherwise
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// A named materialized view over the log.
pub trait Projection {
    /// Decoded domain event
    type Event;

    /// Aggregate folded from events and persisted under `name()`
    type View: Serialize + DeserializeOwned + Default;

    /// View name; also the aggregate's blob name.
    fn name(&self) -> &str;

    /// Event shapes this view understands, in priority order.
    fn decoder(&self) -> EventDecoder<Self::Event>;

    /// Folds one event into the aggregate.
    fn apply(&self, view: &mut Self::View, event: Self::Event);
}

/// Loop tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    /// Most records drained per cycle
    pub batch_size: usize,
    /// Sleep after a cycle that drained nothing
    pub poll_interval: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl From<&Config> for DriverOptions {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// Result of one drain cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No new records; only the cursor was persisted
    Idle,
    /// Records were consumed; `events` of them decoded and were folded
    Drained { records: usize, events: u64 },
}

/// Drives one projection against a log and a view store.
pub struct ProjectionDriver<P: Projection, V: ViewStore> {
    projection: P,
    decoder: EventDecoder<P::Event>,
    store: Arc<FileStreamStore>,
    views: V,
    options: DriverOptions,
    view: P::View,
    cursor: ProcessingInfo,
}

impl<P: Projection, V: ViewStore> ProjectionDriver<P, V> {
    /// Loads the persisted cursor and aggregate, defaulting both when
    /// nothing has been persisted yet.
    ///
    /// # Errors
    ///
    /// `Load` if either blob exists but cannot be read.
    pub fn load(
        projection: P,
        store: Arc<FileStreamStore>,
        views: V,
        options: DriverOptions,
    ) -> ProjectionResult<Self> {
        let name = projection.name().to_string();
        let load_err = |source: ViewError| ProjectionError::Load {
            view: name.clone(),
            source,
        };

        let cursor: ProcessingInfo = views.read_or_default(&cursor_name(&name)).map_err(load_err)?;
        let view: P::View = views.read_or_default(&name).map_err(load_err)?;
        let decoder = projection.decoder();

        log_event_with_fields(
            Event::ProjectionStart,
            &[
                ("view", &name),
                ("next_offset", &cursor.next_offset.bytes().to_string()),
                ("events_processed", &cursor.events_processed.to_string()),
            ],
        );

        Ok(Self {
            projection,
            decoder,
            store,
            views,
            options,
            view,
            cursor,
        })
    }

    /// Name of the projection being driven.
    pub fn name(&self) -> &str {
        self.projection.name()
    }

    /// Current in-memory cursor.
    pub fn cursor(&self) -> &ProcessingInfo {
        &self.cursor
    }

    /// Current in-memory aggregate.
    pub fn view(&self) -> &P::View {
        &self.view
    }

    /// Loop tuning in effect.
    pub fn options(&self) -> DriverOptions {
        self.options
    }

    /// Runs one drain cycle without sleeping.
    ///
    /// # Errors
    ///
    /// `Read` if the log cannot be read. Persist failures are logged, not
    /// returned.
    pub fn run_cycle(&mut self) -> ProjectionResult<CycleOutcome> {
        self.cursor.begin_cycle(Utc::now());

        let records = self
            .store
            .read_all(self.cursor.next_offset, self.options.batch_size)
            .map_err(|source| self.read_error(source))?;

        let mut drained = 0usize;
        let mut folded = 0u64;
        for record in records {
            let record = record.map_err(|source| self.read_error(source))?;
            self.cursor.advance(record.next_offset);
            drained += 1;

            if let Some(event) = self.decoder.decode(&record.data) {
                self.projection.apply(&mut self.view, event);
                self.cursor.record_event();
                folded += 1;
            }
        }

        if drained == 0 {
            if let Err(e) = self.persist_cursor() {
                self.log_persist_failure(&e);
            }
            Logger::trace(
                Event::ProjectionIdle.as_str(),
                &[
                    ("view", self.name()),
                    ("next_offset", &self.cursor.next_offset.bytes().to_string()),
                ],
            );
            return Ok(CycleOutcome::Idle);
        }

        if let Err(e) = self.persist_view().and_then(|_| self.persist_cursor()) {
            self.log_persist_failure(&e);
        }

        log_event_with_fields(
            Event::ProjectionDrained,
            &[
                ("view", self.name()),
                ("records", &drained.to_string()),
                ("events", &folded.to_string()),
                ("next_offset", &self.cursor.next_offset.bytes().to_string()),
            ],
        );

        Ok(CycleOutcome::Drained {
            records: drained,
            events: folded,
        })
    }

    /// Loops until `stop` is set, draining while there is data and
    /// sleeping `poll_interval` after each empty drain.
    ///
    /// `stop` is checked between cycles; a sleep in progress is not
    /// interrupted.
    ///
    /// # Errors
    ///
    /// Returns the first read failure, after logging it as fatal.
    pub fn run_until(&mut self, stop: &AtomicBool) -> ProjectionResult<()> {
        while !stop.load(Ordering::Relaxed) {
            match self.run_cycle() {
                Ok(CycleOutcome::Idle) => thread::sleep(self.options.poll_interval),
                Ok(CycleOutcome::Drained { .. }) => {}
                Err(e) => {
                    log_event_with_fields(
                        Event::ProjectionFailed,
                        &[("view", self.name()), ("error", &e.to_string())],
                    );
                    return Err(e);
                }
            }
        }

        log_event_with_fields(
            Event::ProjectionStopped,
            &[
                ("view", self.name()),
                ("next_offset", &self.cursor.next_offset.bytes().to_string()),
            ],
        );
        Ok(())
    }

    /// Loops until the process ends or the log cannot be read.
    pub fn run(&mut self) -> ProjectionResult<()> {
        let never = AtomicBool::new(false);
        self.run_until(&never)
    }

    fn persist_view(&self) -> Result<(), ViewError> {
        self.views.write(&self.view, self.projection.name())
    }

    fn persist_cursor(&self) -> Result<(), ViewError> {
        self.views
            .write(&self.cursor, &cursor_name(self.projection.name()))
    }

    fn log_persist_failure(&self, error: &ViewError) {
        log_event_with_fields(
            Event::ViewPersistFailed,
            &[
                ("view", self.name()),
                ("blob", error.name()),
                ("error", &error.to_string()),
            ],
        );
    }

    fn read_error(&self, source: crate::stream::StreamError) -> ProjectionError {
        ProjectionError::Read {
            view: self.name().to_string(),
            source,
        }
    }
}
