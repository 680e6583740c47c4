// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn lines_round_trip_through_ring_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let logs = LogBuffers::new(dir.path().to_path_buf());

    logs.append("acme", "tokyo", ScriptLogKind::Setup, "installing deps");
    logs.append("acme", "tokyo", ScriptLogKind::Setup, "done");

    assert_eq!(
        logs.lines("acme", "tokyo", ScriptLogKind::Setup),
        vec!["installing deps", "done"]
    );

    let on_disk =
        fs::read_to_string(dir.path().join("acme").join("tokyo-setup.log")).unwrap();
    assert_eq!(on_disk, "installing deps\ndone\n");
}

#[test]
fn setup_and_archive_streams_are_separate() {
    let dir = tempfile::tempdir().unwrap();
    let logs = LogBuffers::new(dir.path().to_path_buf());

    logs.append("acme", "tokyo", ScriptLogKind::Setup, "setup line");
    logs.append("acme", "tokyo", ScriptLogKind::Archive, "archive line");

    assert_eq!(
        logs.lines("acme", "tokyo", ScriptLogKind::Setup),
        vec!["setup line"]
    );
    assert_eq!(
        logs.lines("acme", "tokyo", ScriptLogKind::Archive),
        vec!["archive line"]
    );
    assert!(dir.path().join("acme/tokyo-setup.log").exists());
    assert!(dir.path().join("acme/tokyo-archive.log").exists());
}

#[test]
fn ring_is_bounded_but_file_keeps_everything() {
    let dir = tempfile::tempdir().unwrap();
    let logs = LogBuffers::new(dir.path().to_path_buf());

    for i in 0..2100 {
        logs.append("acme", "tokyo", ScriptLogKind::Setup, &format!("line {i}"));
    }

    let lines = logs.lines("acme", "tokyo", ScriptLogKind::Setup);
    assert_eq!(lines.len(), 2000);
    assert_eq!(lines[0], "line 100", "oldest lines fall off the ring");
    assert_eq!(lines[1999], "line 2099");

    let on_disk =
        fs::read_to_string(dir.path().join("acme").join("tokyo-setup.log")).unwrap();
    assert_eq!(on_disk.lines().count(), 2100);
}

#[test]
fn clear_ring_leaves_the_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let logs = LogBuffers::new(dir.path().to_path_buf());
    logs.append("acme", "tokyo", ScriptLogKind::Setup, "old attempt");

    logs.clear_ring("acme", "tokyo", ScriptLogKind::Setup);

    assert!(logs.lines("acme", "tokyo", ScriptLogKind::Setup).is_empty());
    assert!(dir.path().join("acme/tokyo-setup.log").exists());
}

#[test]
fn unknown_key_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let logs = LogBuffers::new(dir.path().to_path_buf());
    assert!(logs.lines("ghost", "nowhere", ScriptLogKind::Setup).is_empty());
}
