// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery and stale tunnel cleanup.

use crate::prelude::*;
use conductor_core::{SetupStatus, TunnelMode, TunnelState, Worktree};
use conductor_engine::recover;
use std::collections::HashSet;

fn seed_worktree(rig: &SpecRig, name: &str, status: SetupStatus) {
    rig.store
        .batch_mutate(|doc| {
            let mut wt = Worktree::new(
                rig.dir.path().join("acme").join(name),
                format!("feat/{name}"),
                conductor_core::test_support::ts(0),
            );
            wt.setup_status = status;
            doc.project_mut("acme")?.worktrees.insert(name.to_string(), wt);
            Ok(())
        })
        .unwrap();
}

#[tokio::test]
async fn interrupted_states_are_failed_on_startup() {
    let rig = spec_rig();
    seed_worktree(&rig, "w1", SetupStatus::Running);
    seed_worktree(&rig, "w2", SetupStatus::Creating);
    seed_worktree(&rig, "w3", SetupStatus::Done);

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
async fn only_dead_tunnels_are_cleared() {
    let rig = spec_rig();
    seed_worktree(&rig, "w1", SetupStatus::Done);
    seed_worktree(&rig, "w2", SetupStatus::Done);
    let tunnel = |pid: u32| TunnelState {
        active: true,
        mode: TunnelMode::Quick,
        url: "https://t.trycloudflare.com".to_string(),
        port: 3100,
        pid,
        started_at: conductor_core::test_support::ts(0),
    };
    rig.store.set_tunnel_state("acme", "w1", tunnel(111)).unwrap();
    rig.store.set_tunnel_state("acme", "w2", tunnel(222)).unwrap();

    // Only PID 222 is still alive at startup
    recover(&rig.store, &HashSet::from([222])).unwrap();

    assert!(rig.store.worktree("acme", "w1").unwrap().tunnel.is_none());
    let kept = rig.store.worktree("acme", "w2").unwrap().tunnel.unwrap();
    assert!(kept.active);
}

#[tokio::test]
async fn recovered_worktree_can_be_retried() {
    let rig = spec_rig();

    // Simulate a crash mid-create: Prepare ran, materialize never finished
    let name = rig
        .engine
        .create_worktree(
            "acme",
            "feat/crashed",
            conductor_engine::CreateOptions::default(),
            None,
            None,
        )
        .unwrap();
    rig.store
        .batch_mutate(|doc| {
            doc.worktree_mut("acme", &name)?.setup_status = SetupStatus::Running;
            Ok(())
        })
        .unwrap();

    recover(&rig.store, &HashSet::new()).unwrap();
    assert_eq!(
        rig.store.worktree("acme", &name).unwrap().setup_status,
        SetupStatus::Failed
    );

    let (notify, rx) = notify_channel();
    rig.engine
        .retry_setup("acme", &name, None, Some(notify))
        .await
        .unwrap();
    rx.await.unwrap().unwrap();
    assert_eq!(
        rig.store.worktree("acme", &name).unwrap().setup_status,
        SetupStatus::Done
    );
}
