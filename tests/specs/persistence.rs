// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debounced persistence and on-disk schema round trips.

use crate::prelude::*;
use conductor_core::test_support::test_project;
use conductor_core::Document;
use conductor_store::{DocumentWriter, Store, StoreOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
struct CountingWriter {
    writes: Arc<parking_lot::Mutex<Vec<Vec<u8>>>>,
}

impl DocumentWriter for CountingWriter {
    fn write(&self, _path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        self.writes.lock().push(bytes.to_vec());
        Ok(())
    }
}

#[tokio::test]
async fn five_rapid_mutations_one_disk_write() {
    let writer = CountingWriter::default();
    let store = Store::open_with(
        "/nonexistent/conductor.json",
        Box::new(writer.clone()),
        StoreOptions {
            debounce: Duration::from_millis(100),
            ..StoreOptions::default()
        },
    )
    .unwrap();

    store.add_project("p1", test_project("/repo/p1")).unwrap();
    store.add_project("p2", test_project("/repo/p2")).unwrap();
    store.add_project("p3", test_project("/repo/p3")).unwrap();
    store.add_project("p4", test_project("/repo/p4")).unwrap();
    store.remove_project("p4").unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;

    let writes = writer.writes.lock();
    assert_eq!(writes.len(), 1, "burst coalesced into a single write");
    let on_disk: Document = serde_json::from_slice(&writes[0]).unwrap();
    assert_eq!(on_disk.projects.len(), 3, "write reflects the final mutation");
    assert!(!on_disk.projects.contains_key("p4"));
}

#[tokio::test]
async fn full_lifecycle_state_round_trips_from_disk() {
    let rig = spec_rig();
    let name = create_and_wait(&rig, "feat/persisted", 2).await;
    rig.store.force_save().await.unwrap();

    let raw = std::fs::read_to_string(rig.dir.path().join("conductor.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

    // §schema: string port keys, camelCase fields, RFC3339 timestamps
    let wt = &parsed["projects"]["acme"]["worktrees"][&name];
    assert_eq!(wt["setupStatus"], "done");
    assert_eq!(wt["archived"], false);
    assert_eq!(wt["ports"][0], 3100);
    assert_eq!(parsed["portAllocations"]["3100"]["worktree"], name);
    assert_eq!(parsed["portAllocations"]["3101"]["index"], 1);

    // And it loads back as an identical document
    let reopened = Store::open(rig.dir.path().join("conductor.json")).unwrap();
    similar_asserts::assert_eq!(reopened.snapshot(), rig.store.snapshot());
}

#[tokio::test]
async fn close_reports_pending_flush() {
    let writer = CountingWriter::default();
    let store = Store::open_with(
        "/nonexistent/conductor.json",
        Box::new(writer.clone()),
        StoreOptions {
            debounce: Duration::from_secs(3600),
            ..StoreOptions::default()
        },
    )
    .unwrap();
    store.add_project("p1", test_project("/repo/p1")).unwrap();

    let report = store.close().await;
    assert!(report.had_pending_saves);
    assert!(report.last_error.is_none());
    assert_eq!(writer.writes.lock().len(), 1, "close flushed synchronously");

    assert!(store.add_project("p2", test_project("/repo/p2")).is_err());
}
