//! Crash between fsyncing appended bytes and advancing the checkpoint

use std::fs;

use streamfold::crash_point::points;

use crate::crash::harness::{report_failure, Workspace};

#[test]
fn test_crash_before_checkpoint_hides_the_record() {
    let ws = Workspace::new();
    {
        let store = ws.store();
        store.write_event("s", b"one").unwrap();
        store.write_event("s", b"two").unwrap();
    }
    let before = ws.store().max_offset().unwrap();

    let result = ws.run(
        Some(points::APPEND_BEFORE_CHECKPOINT),
        &["write", "--stream", "s", "three"],
    );
    if !result.crashed {
        report_failure(points::APPEND_BEFORE_CHECKPOINT, "write", &result);
        panic!("process did not crash");
    }

    // The bytes reached the data file but are not committed
    let physical = fs::metadata(ws.store().data_path()).unwrap().len();
    assert!(physical > before.bytes());
    assert_eq!(ws.store().max_offset().unwrap(), before);

    let records = ws.committed();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].data, b"two".to_vec());
}

#[test]
fn test_write_after_crash_overwrites_uncommitted_tail() {
    let ws = Workspace::new();
    ws.store().write_event("s", b"kept").unwrap();

    let result = ws.run(
        Some(points::APPEND_BEFORE_CHECKPOINT),
        &["write", "--stream", "s", "a much longer payload that never commits"],
    );
    assert!(result.crashed);

    ws.store().write_event("s", b"next").unwrap();

    let records = ws.committed();
    let payloads: Vec<_> = records.iter().map(|r| r.data.clone()).collect();
    assert_eq!(payloads, vec![b"kept".to_vec(), b"next".to_vec()]);
    assert_eq!(records[1].next_offset, ws.store().max_offset().unwrap());
}

#[test]
fn test_unrelated_crash_point_does_not_fire() {
    let ws = Workspace::new();
    let result = ws.run(
        Some(points::BATCH_AFTER_STAGING),
        &["write", "--stream", "s", "single"],
    );
    assert!(!result.crashed, "{}", result.stderr);
    assert_eq!(ws.committed().len(), 1);
}
