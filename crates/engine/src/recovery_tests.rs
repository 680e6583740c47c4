// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::rig;
use conductor_core::test_support::{test_project, test_worktree, ts};
use conductor_core::{TunnelMode, TunnelState};

fn seed(store: &conductor_store::Store, worktrees: &[(&str, SetupStatus)]) {
    store.add_project("acme", test_project("/repo/acme")).unwrap();
    store
        .batch_mutate(|doc| {
            for (name, status) in worktrees {
                let mut wt = test_worktree("feat/x");
                wt.branch = format!("feat/{name}");
                wt.setup_status = *status;
                doc.project_mut("acme")?
                    .worktrees
                    .insert(name.to_string(), wt);
            }
            Ok(())
        })
        .unwrap();
}

fn tunnel(pid: u32, active: bool) -> TunnelState {
    TunnelState {
        active,
        mode: TunnelMode::Quick,
        url: "https://t.trycloudflare.com".to_string(),
        port: 3100,
        pid,
        started_at: ts(0),
    }
}

#[tokio::test]
async fn in_flight_setup_states_become_failed() {
    let rig = rig();
    seed(
        &rig.store,
        &[
            ("w1", SetupStatus::Running),
            ("w2", SetupStatus::Creating),
            ("w3", SetupStatus::Done),
        ],
    );

    let report = recover(&rig.store, &HashSet::new()).unwrap();

    assert_eq!(report.worktrees_reset, 2);
    assert_eq!(
        rig.store.worktree("acme", "w1").unwrap().setup_status,
        SetupStatus::Failed
    );
    assert_eq!(
        rig.store.worktree("acme", "w2").unwrap().setup_status,
        SetupStatus::Failed
    );
    assert_eq!(
        rig.store.worktree("acme", "w3").unwrap().setup_status,
        SetupStatus::Done
    );
}

#[tokio::test]
async fn interrupted_archive_drops_back_to_idle() {
    let rig = rig();
    seed(&rig.store, &[("w1", SetupStatus::Done)]);
    rig.store
        .set_archive_status("acme", "w1", ArchiveStatus::Running)
        .unwrap();

    let report = recover(&rig.store, &HashSet::new()).unwrap();

    assert_eq!(report.worktrees_reset, 1);
    assert_eq!(
        rig.store.worktree("acme", "w1").unwrap().archive_status,
        ArchiveStatus::None
    );
    assert!(
        !rig.store.worktree("acme", "w1").unwrap().archived,
        "the archive is not resumed automatically"
    );
}

#[tokio::test]
async fn stale_tunnels_are_cleared_live_ones_kept() {
    let rig = rig();
    seed(
        &rig.store,
        &[("w1", SetupStatus::Done), ("w2", SetupStatus::Done)],
    );
    rig.store.set_tunnel_state("acme", "w1", tunnel(111, true)).unwrap();
    rig.store.set_tunnel_state("acme", "w2", tunnel(222, true)).unwrap();

    let report = recover(&rig.store, &HashSet::from([222])).unwrap();

    assert_eq!(report.tunnels_cleared, 1);
    assert!(rig.store.worktree("acme", "w1").unwrap().tunnel.is_none());
    let kept = rig.store.worktree("acme", "w2").unwrap().tunnel.unwrap();
    assert!(kept.active);
    assert_eq!(kept.pid, 222);
}

#[tokio::test]
async fn inactive_tunnel_records_are_left_alone() {
    let rig = rig();
    seed(&rig.store, &[("w1", SetupStatus::Done)]);
    rig.store
        .set_tunnel_state("acme", "w1", tunnel(111, false))
        .unwrap();

    let report = recover(&rig.store, &HashSet::new()).unwrap();

    assert_eq!(report.tunnels_cleared, 0);
    assert!(rig.store.worktree("acme", "w1").unwrap().tunnel.is_some());
}

#[tokio::test]
async fn clean_document_reports_zero() {
    let rig = rig();
    seed(&rig.store, &[("w1", SetupStatus::Done)]);
    let report = recover(&rig.store, &HashSet::new()).unwrap();
    assert_eq!(report, RecoveryReport::default());
}
