//! CLI argument definitions using clap
//!
//! Commands:
//! - streamfold write --stream <key> <payload>
//! - streamfold import --stream <key> <file>
//! - streamfold read [--from <offset>] [--count <n>]
//! - streamfold max-offset
//! - streamfold project

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::stream::StorageOffset;

/// streamfold - append-only event log with resumable projections
#[derive(Parser, Debug)]
#[command(name = "streamfold")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Append one record
    Write {
        /// Stream key the record belongs to
        #[arg(long)]
        stream: String,

        /// Record payload (UTF-8)
        payload: String,
    },

    /// Append every non-empty line of a file as one atomic batch
    Import {
        /// Stream key shared by every record in the batch
        #[arg(long)]
        stream: String,

        /// File with one payload per line
        file: PathBuf,
    },

    /// Print committed records as JSON lines
    Read {
        /// Byte offset to start reading at
        #[arg(long, default_value = "0")]
        from: StorageOffset,

        /// Maximum number of records to print
        #[arg(long)]
        count: Option<usize>,
    },

    /// Print the committed length of the log
    MaxOffset,

    /// Run the sample projections until terminated
    Project,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
