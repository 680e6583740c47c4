// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port allocation with fragmentation, end to end.

use crate::prelude::*;
use conductor_core::Error;
use conductor_store::ports::verify_port_invariants;

#[tokio::test]
async fn fragmented_pool_is_reused_first_fit() {
    let rig = spec_rig();

    // W1..W3 pack the bottom of the pool
    let w1 = create_and_wait(&rig, "feat/w1", 2).await;
    let w2 = create_and_wait(&rig, "feat/w2", 2).await;
    let w3 = create_and_wait(&rig, "feat/w3", 2).await;
    assert_eq!(rig.store.worktree("acme", &w1).unwrap().ports, vec![3100, 3101]);
    assert_eq!(rig.store.worktree("acme", &w2).unwrap().ports, vec![3102, 3103]);
    assert_eq!(rig.store.worktree("acme", &w3).unwrap().ports, vec![3104, 3105]);

    // Archiving W2 reopens its window
    rig.engine.archive_worktree("acme", &w2).await.unwrap();

    // A two-wide request lands in the reopened gap
    let w4 = create_and_wait(&rig, "feat/w4", 2).await;
    assert_eq!(rig.store.worktree("acme", &w4).unwrap().ports, vec![3102, 3103]);

    // A three-wide request does not fit the gap and goes to the tail
    let w5 = create_and_wait(&rig, "feat/w5", 3).await;
    assert_eq!(
        rig.store.worktree("acme", &w5).unwrap().ports,
        vec![3106, 3107, 3108]
    );

    // Only port 3109 is left: no two-wide window remains
    let err = rig
        .engine
        .create_worktree(
            "acme",
            "feat/w6",
            conductor_engine::CreateOptions {
                name: None,
                ports: 2,
            },
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, Error::NoFreePortWindow { requested: 2 }));

    verify_port_invariants(&rig.store.snapshot()).unwrap();
}

#[tokio::test]
async fn default_port_count_comes_from_project_then_defaults() {
    let rig = spec_rig();
    let name = create_and_wait(&rig, "feat/default", 0).await;
    assert_eq!(rig.store.worktree("acme", &name).unwrap().ports.len(), 2);

    rig.store
        .batch_mutate(|doc| {
            doc.project_mut("acme")?.default_ports_per_worktree = 3;
            Ok(())
        })
        .unwrap();
    let name = create_and_wait(&rig, "feat/override", 0).await;
    assert_eq!(rig.store.worktree("acme", &name).unwrap().ports.len(), 3);
}
