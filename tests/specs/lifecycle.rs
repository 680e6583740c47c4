// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Create, archive, re-create flows.

use crate::prelude::*;
use conductor_core::SetupStatus;
use conductor_store::ports::verify_port_invariants;

#[tokio::test]
async fn archive_then_recreate_on_the_same_branch() {
    let rig = spec_rig();

    let first = create_and_wait(&rig, "feature/x", 2).await;
    assert_eq!(
        rig.store.worktree("acme", &first).unwrap().setup_status,
        SetupStatus::Done
    );

    rig.engine.archive_worktree("acme", &first).await.unwrap();
    rig.engine.delete_worktree("acme", &first).unwrap();

    // A fresh worktree on the same branch: new name, ports from the freed
    // pool, full state machine run
    let second = create_and_wait(&rig, "feature/x", 2).await;
    let wt = rig.store.worktree("acme", &second).unwrap();
    assert_eq!(wt.setup_status, SetupStatus::Done);
    assert_eq!(wt.ports, vec![3100, 3101], "freed ports are reused");
    verify_port_invariants(&rig.store.snapshot()).unwrap();
}

#[tokio::test]
async fn duplicate_branch_is_diagnosed() {
    let rig = spec_rig();
    let name = create_and_wait(&rig, "feature/x", 2).await;

    let err = rig
        .engine
        .create_worktree(
            "acme",
            "feature/x",
            conductor_engine::CreateOptions::default(),
            None,
            None,
        )
        .unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("already used by worktree") && msg.contains(&name),
        "got: {msg}"
    );
}

#[tokio::test]
async fn failed_materialize_surfaces_and_can_retry() {
    let rig = spec_rig();
    rig.git.fail_branch("feature/x");

    let (notify, rx) = notify_channel();
    let name = rig
        .engine
        .create_worktree(
            "acme",
            "feature/x",
            conductor_engine::CreateOptions::default(),
            Some(notify),
            None,
        )
        .unwrap();
    rx.await.unwrap().unwrap_err();
    assert_eq!(
        rig.store.worktree("acme", &name).unwrap().setup_status,
        SetupStatus::Failed
    );

    rig.git.clear_failures();
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
