//! Crash test harness for subprocess management
//!
//! Runs the `streamfold` binary against a temp directory, optionally with a
//! crash point enabled, and captures how it ended.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use streamfold::stream::{FileStreamStore, RetrievedRecord, StorageOffset, UNBOUNDED};
use tempfile::TempDir;

/// Result of one binary invocation
#[derive(Debug)]
pub struct RunResult {
    /// Whether the process ended abnormally
    pub crashed: bool,
    pub exit_status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Isolated working directory with a store and a view directory
pub struct Workspace {
    root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root.path().join("store")
    }

    pub fn view_dir(&self) -> PathBuf {
        self.root.path().join("views")
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn store(&self) -> FileStreamStore {
        FileStreamStore::open(&self.store_dir()).expect("Failed to open store")
    }

    /// Every committed record
    pub fn committed(&self) -> Vec<RetrievedRecord> {
        self.store()
            .read_all(StorageOffset::ZERO, UNBOUNDED)
            .expect("read_all failed")
            .collect::<Result<Vec<_>, _>>()
            .expect("committed region must decode")
    }

    /// Files left in the store directory with the given suffix
    pub fn files_ending_with(&self, suffix: &str) -> Vec<String> {
        match fs::read_dir(self.store_dir()) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .filter(|name| name.ends_with(suffix))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Runs the binary with `args`, optionally aborting at `crash_point`.
    pub fn run(&self, crash_point: Option<&str>, args: &[&str]) -> RunResult {
        let mut command = Command::new(env!("CARGO_BIN_EXE_streamfold"));
        command
            .args(args)
            .current_dir(self.path())
            .env("STREAMFOLD_STORE_DIR", self.store_dir())
            .env("STREAMFOLD_VIEW_DIR", self.view_dir())
            .env_remove("STREAMFOLD_CRASH_POINT");
        if let Some(point) = crash_point {
            command.env("STREAMFOLD_CRASH_POINT", point);
        }

        let output = command.output().expect("Failed to spawn streamfold");
        RunResult {
            crashed: !output.status.success(),
            exit_status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Report crash test failure
pub fn report_failure(crash_point: &str, operation: &str, result: &RunResult) {
    eprintln!("=== CRASH TEST FAILURE ===");
    eprintln!("Crash point: {}", crash_point);
    eprintln!("Operation: {}", operation);
    eprintln!("Exit status: {:?}", result.exit_status);
    eprintln!("stdout:\n{}", result.stdout);
    eprintln!("stderr:\n{}", result.stderr);
    eprintln!("==========================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_write_then_read() {
        let ws = Workspace::new();

        let write = ws.run(None, &["write", "--stream", "posts", "hello"]);
        assert!(!write.crashed, "{}", write.stderr);
        let written: serde_json::Value = serde_json::from_str(write.stdout.trim()).unwrap();
        assert!(written["next_offset"].as_u64().unwrap() > 0);

        let read = ws.run(None, &["read"]);
        assert!(!read.crashed, "{}", read.stderr);
        let lines: Vec<serde_json::Value> = read
            .stdout
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["key"], "posts");
        assert_eq!(lines[0]["payload"], "hello");
        assert_eq!(lines[0]["next_offset"], written["next_offset"]);
    }

    #[test]
    fn test_binary_max_offset_on_fresh_store() {
        let ws = Workspace::new();
        let result = ws.run(None, &["max-offset"]);
        assert!(!result.crashed, "{}", result.stderr);

        let value: serde_json::Value = serde_json::from_str(result.stdout.trim()).unwrap();
        assert_eq!(value["max_offset"], 0);
    }
}
