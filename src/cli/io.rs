//! Line-oriented I/O for the CLI
//!
//! - Output: one JSON object per line on stdout
//! - Import input: one payload per line, UTF-8

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use serde::Serialize;

use super::errors::{CliError, CliResult};
use crate::stream::RetrievedRecord;

/// One record as printed by `read`
#[derive(Debug, Serialize)]
pub struct RecordLine<'a> {
    pub key: &'a str,
    pub payload: String,
    pub next_offset: u64,
}

impl<'a> From<&'a RetrievedRecord> for RecordLine<'a> {
    fn from(record: &'a RetrievedRecord) -> Self {
        Self {
            key: &record.key,
            payload: String::from_utf8_lossy(&record.data).into_owned(),
            next_offset: record.next_offset.bytes(),
        }
    }
}

/// Write a value as one JSON line to `writer`
pub fn write_json_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Write a value as one JSON line to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_json_line(&mut lock, value)?;
    lock.flush()?;
    Ok(())
}

/// Lazily yield the non-empty lines of a payload file
pub fn payload_lines(path: &Path) -> CliResult<impl Iterator<Item = io::Result<String>>> {
    let file = File::open(path)
        .map_err(|e| CliError::io_error(format!("Failed to open {}: {}", path.display(), e)))?;

    Ok(BufReader::new(file)
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.is_empty())))
}
