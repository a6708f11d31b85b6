//! CLI command implementations
//!
//! Writers open the store read-write; `read`, `max-offset` and `project`
//! open it read-only.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use serde_json::json;

use crate::config::Config;
use crate::observability::{log_event_with_fields, Event};
use crate::projection::sample::{CommentDistribution, TagsDistribution, UserCommentsPerDay};
use crate::projection::{DriverOptions, Projection, ProjectionDriver, ProjectionResult};
use crate::stream::{FileStreamStore, StorageOffset, UNBOUNDED};
use crate::views::FileViewStore;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{payload_lines, write_json, RecordLine};

/// Dispatch a parsed command
pub fn run_command(command: Command, config: &Config) -> CliResult<()> {
    match command {
        Command::Write { stream, payload } => write(config, &stream, &payload),
        Command::Import { stream, file } => import(config, &stream, &file),
        Command::Read { from, count } => read(config, from, count.unwrap_or(UNBOUNDED)),
        Command::MaxOffset => max_offset(config),
        Command::Project => project(config),
    }
}

/// Append one record
pub fn write(config: &Config, stream: &str, payload: &str) -> CliResult<()> {
    let store = FileStreamStore::open(&config.store_dir)?;
    let next_offset = store.write_event(stream, payload.as_bytes())?;
    write_json(&json!({ "next_offset": next_offset.bytes() }))
}

/// Append a file's lines as one batch, streaming them into staging
pub fn import(config: &Config, stream: &str, file: &Path) -> CliResult<()> {
    let lines = payload_lines(file)?;
    let store = FileStreamStore::open(&config.store_dir)?;

    let mut records = 0usize;
    let counted = lines.inspect(|line| {
        if line.is_ok() {
            records += 1;
        }
    });
    let next_offset = store.try_write_events_in_large_batch(stream, counted)?;
    write_json(&json!({ "records": records, "next_offset": next_offset.bytes() }))
}

/// Print committed records
pub fn read(config: &Config, from: StorageOffset, count: usize) -> CliResult<()> {
    let store = FileStreamStore::open_read_only(&config.store_dir);
    for record in store.read_all(from, count)? {
        let record = record?;
        write_json(&RecordLine::from(&record))?;
    }
    Ok(())
}

/// Print the committed length
pub fn max_offset(config: &Config) -> CliResult<()> {
    let store = FileStreamStore::open_read_only(&config.store_dir);
    let committed = store.max_offset()?;
    write_json(&json!({ "max_offset": committed.bytes() }))
}

/// Run the three sample projections, one thread each.
///
/// Returns when any of them stops; the others keep running until the
/// process exits.
pub fn project(config: &Config) -> CliResult<()> {
    let store = Arc::new(FileStreamStore::open_read_only(&config.store_dir));
    let views = FileViewStore::open(&config.view_dir)?;
    let options = DriverOptions::from(config);

    let (tx, rx) = std::sync::mpsc::channel();
    spawn_projection(TagsDistribution, &store, &views, options, tx.clone())?;
    spawn_projection(CommentDistribution, &store, &views, options, tx.clone())?;
    spawn_projection(UserCommentsPerDay, &store, &views, options, tx)?;

    let (name, result) = rx
        .recv()
        .map_err(|_| CliError::projection_failed("All projection threads exited"))?;

    log_event_with_fields(Event::ShutdownStart, &[("view", &name)]);
    result.map_err(CliError::from)?;
    Err(CliError::projection_failed(format!(
        "Projection {} stopped",
        name
    )))
}

type Finished = (String, ProjectionResult<()>);

fn spawn_projection<P>(
    projection: P,
    store: &Arc<FileStreamStore>,
    views: &FileViewStore,
    options: DriverOptions,
    done: std::sync::mpsc::Sender<Finished>,
) -> CliResult<()>
where
    P: Projection + Send + 'static,
{
    let name = projection.name().to_string();
    let store = Arc::clone(store);
    let views = views.clone();

    thread::Builder::new()
        .name(format!("projection-{}", name))
        .spawn(move || {
            let result = ProjectionDriver::load(projection, store, views, options)
                .and_then(|mut driver| driver.run());
            let _ = done.send((name, result));
        })
        .map_err(|e| CliError::io_error(format!("Failed to spawn projection thread: {}", e)))?;

    Ok(())
}
