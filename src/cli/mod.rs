//! CLI module for streamfold
//!
//! Provides command-line interface for:
//! - write / import: append to the log
//! - read / max-offset: inspect committed records
//! - project: run the sample projections

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{import, max_offset, project, read, run_command, write};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, RecordLine};

use crate::config::Config;
use crate::observability::{log_event_with_fields, Event, Logger};

/// Parse arguments, resolve configuration once, and run the command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let config = Config::resolve(cli.config.as_deref())?;
    Logger::set_min_severity(config.log_severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("store_dir", &config.store_dir.display().to_string()),
            ("view_dir", &config.view_dir.display().to_string()),
            ("batch_size", &config.batch_size.to_string()),
            ("poll_interval_ms", &config.poll_interval_ms.to_string()),
        ],
    );

    run_command(cli.command, &config)
}
