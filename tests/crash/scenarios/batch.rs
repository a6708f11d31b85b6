//! Crash during a batch write

use std::fs;

use streamfold::crash_point::points;
use streamfold::stream::STAGING_SUFFIX;

use crate::crash::harness::{report_failure, Workspace};

fn write_lines(ws: &Workspace, name: &str, lines: &[&str]) -> String {
    let path = ws.path().join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path.display().to_string()
}

#[test]
fn test_crash_after_staging_leaves_log_unchanged() {
    let ws = Workspace::new();
    ws.store().write_event("pre", b"existing").unwrap();
    let before = ws.store().max_offset().unwrap();
    let records_before = ws.committed();

    let file = write_lines(&ws, "batch.txt", &["a", "b", "c"]);
    let result = ws.run(
        Some(points::BATCH_AFTER_STAGING),
        &["import", "--stream", "bulk", &file],
    );
    if !result.crashed {
        report_failure(points::BATCH_AFTER_STAGING, "import", &result);
        panic!("process did not crash");
    }

    assert_eq!(ws.store().max_offset().unwrap(), before);
    assert_eq!(ws.committed(), records_before);
    // abort() skips destructors, so the staging file is left behind
    assert_eq!(ws.files_ending_with(STAGING_SUFFIX).len(), 1);
}

#[test]
fn test_crash_before_checkpoint_hides_whole_batch() {
    let ws = Workspace::new();
    ws.store().write_event("pre", b"existing").unwrap();
    let before = ws.store().max_offset().unwrap();

    let file = write_lines(&ws, "batch.txt", &["1", "2", "3", "4"]);
    let result = ws.run(
        Some(points::APPEND_BEFORE_CHECKPOINT),
        &["import", "--stream", "bulk", &file],
    );
    assert!(result.crashed);

    assert_eq!(ws.store().max_offset().unwrap(), before);
    let records = ws.committed();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, "pre");
}

#[test]
fn test_import_commits_all_lines() {
    let ws = Workspace::new();
    let file = write_lines(&ws, "batch.txt", &["x", "", "y", "z"]);

    let result = ws.run(None, &["import", "--stream", "bulk", &file]);
    assert!(!result.crashed, "{}", result.stderr);

    let summary: serde_json::Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(summary["records"], 3);

    let records = ws.committed();
    let payloads: Vec<_> = records.iter().map(|r| r.data.clone()).collect();
    assert_eq!(payloads, vec![b"x".to_vec(), b"y".to_vec(), b"z".to_vec()]);
    assert!(ws.files_ending_with(STAGING_SUFFIX).is_empty());
}

#[test]
fn test_import_with_unreadable_line_commits_nothing() {
    let ws = Workspace::new();
    ws.store().write_event("pre", b"existing").unwrap();
    let before = ws.store().max_offset().unwrap();

    let path = ws.path().join("bad.txt");
    fs::write(&path, b"first\nsecond\n\xFF\xFE\nfourth\n").unwrap();
    let file = path.display().to_string();

    let result = ws.run(None, &["import", "--stream", "bulk", &file]);
    assert!(result.crashed, "import should fail on invalid UTF-8");
    assert!(result.stdout.trim().is_empty());

    assert_eq!(ws.store().max_offset().unwrap(), before);
    assert_eq!(ws.committed().len(), 1);
    assert!(ws.files_ending_with(STAGING_SUFFIX).is_empty());
}
