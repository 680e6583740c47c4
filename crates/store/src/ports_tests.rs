// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use conductor_core::test_support::{doc_with_small_pool, done_worktree, test_worktree};
use conductor_core::{Document, SetupStatus};
use proptest::prelude::*;

fn add_wt(doc: &mut Document, name: &str) {
    doc.projects["acme"]
        .worktrees
        .insert(name.to_string(), done_worktree("feat/x"));
}

// ── First fit ────────────────────────────────────────────────────────────────

#[test]
fn allocates_contiguous_from_range_start() {
    let mut doc = doc_with_small_pool();
    add_wt(&mut doc, "tokyo");

    let ports = allocate_ports(&mut doc, "acme", "tokyo", 2).unwrap();
    assert_eq!(ports, vec![3100, 3101]);
    assert_eq!(doc.worktree("acme", "tokyo").unwrap().ports, vec![3100, 3101]);
    assert_eq!(doc.port_allocations[&3100].index, 0);
    assert_eq!(doc.port_allocations[&3101].index, 1);
    verify_port_invariants(&doc).unwrap();
}

#[test]
fn successive_allocations_pack_left_to_right() {
    let mut doc = doc_with_small_pool();
    for name in ["w1", "w2", "w3"] {
        add_wt(&mut doc, name);
        allocate_ports(&mut doc, "acme", name, 2).unwrap();
    }
    assert_eq!(doc.worktree("acme", "w1").unwrap().ports, vec![3100, 3101]);
    assert_eq!(doc.worktree("acme", "w2").unwrap().ports, vec![3102, 3103]);
    assert_eq!(doc.worktree("acme", "w3").unwrap().ports, vec![3104, 3105]);
}

#[test]
fn freed_gap_is_reused_first_fit() {
    let mut doc = doc_with_small_pool();
    for name in ["w1", "w2", "w3"] {
        add_wt(&mut doc, name);
        allocate_ports(&mut doc, "acme", name, 2).unwrap();
    }
    free_worktree_ports(&mut doc, "acme", "w2").unwrap();

    add_wt(&mut doc, "w4");
    let ports = allocate_ports(&mut doc, "acme", "w4", 2).unwrap();
    assert_eq!(ports, vec![3102, 3103], "first fit lands in the reopened gap");

    // A wider request skips the two-wide gap
    add_wt(&mut doc, "w5");
    free_worktree_ports(&mut doc, "acme", "w1").unwrap();
    let ports = allocate_ports(&mut doc, "acme", "w5", 3).unwrap();
    assert_eq!(ports, vec![3106, 3107, 3108]);
    verify_port_invariants(&doc).unwrap();
}

#[test]
fn exhausted_pool_reports_requested_width() {
    let mut doc = doc_with_small_pool();
    for name in ["w1", "w2", "w3", "w4", "w5"] {
        add_wt(&mut doc, name);
        allocate_ports(&mut doc, "acme", name, 2).unwrap();
    }
    add_wt(&mut doc, "w6");
    let err = allocate_ports(&mut doc, "acme", "w6", 2).unwrap_err();
    assert!(matches!(
        err,
        conductor_core::Error::NoFreePortWindow { requested: 2 }
    ));
}

#[test]
fn window_wider_than_pool_fails() {
    let mut doc = doc_with_small_pool();
    add_wt(&mut doc, "tokyo");
    let err = allocate_ports(&mut doc, "acme", "tokyo", 11).unwrap_err();
    assert!(matches!(
        err,
        conductor_core::Error::NoFreePortWindow { requested: 11 }
    ));
}

// ── Default counts ───────────────────────────────────────────────────────────

#[test]
fn zero_count_uses_global_default() {
    let mut doc = doc_with_small_pool();
    add_wt(&mut doc, "tokyo");
    let ports = allocate_ports(&mut doc, "acme", "tokyo", 0).unwrap();
    assert_eq!(ports.len(), 2);
}

#[test]
fn zero_count_prefers_project_override() {
    let mut doc = doc_with_small_pool();
    doc.projects["acme"].default_ports_per_worktree = 3;
    add_wt(&mut doc, "tokyo");
    let ports = allocate_ports(&mut doc, "acme", "tokyo", 0).unwrap();
    assert_eq!(ports, vec![3100, 3101, 3102]);
}

// ── Freeing ──────────────────────────────────────────────────────────────────

#[test]
fn free_is_idempotent() {
    let mut doc = doc_with_small_pool();
    add_wt(&mut doc, "tokyo");
    allocate_ports(&mut doc, "acme", "tokyo", 2).unwrap();

    free_worktree_ports(&mut doc, "acme", "tokyo").unwrap();
    let after_first = doc.clone();
    free_worktree_ports(&mut doc, "acme", "tokyo").unwrap();
    assert_eq!(doc, after_first);
    assert!(doc.port_allocations.is_empty());
}

#[test]
fn project_removal_frees_every_allocation() {
    let mut doc = doc_with_small_pool();
    for name in ["w1", "w2"] {
        add_wt(&mut doc, name);
        allocate_ports(&mut doc, "acme", name, 2).unwrap();
    }
    free_project_ports(&mut doc, "acme");
    assert!(doc.port_allocations.is_empty());
    assert!(doc.worktree("acme", "w1").unwrap().ports.is_empty());
}

// ── Guards ───────────────────────────────────────────────────────────────────

#[test]
fn root_and_archived_worktrees_cannot_allocate() {
    let mut doc = doc_with_small_pool();
    let root = conductor_core::Worktree::new_root(
        "/repo/acme".into(),
        "main",
        conductor_core::test_support::ts(0),
    );
    doc.projects["acme"].worktrees.insert("root".into(), root);
    assert!(allocate_ports(&mut doc, "acme", "root", 2).is_err());

    let mut archived = done_worktree("feat/x");
    archived.archived = true;
    doc.projects["acme"]
        .worktrees
        .insert("tokyo".into(), archived);
    assert!(allocate_ports(&mut doc, "acme", "tokyo", 2).is_err());
}

#[test]
fn double_allocation_is_rejected() {
    let mut doc = doc_with_small_pool();
    add_wt(&mut doc, "tokyo");
    allocate_ports(&mut doc, "acme", "tokyo", 2).unwrap();
    assert!(allocate_ports(&mut doc, "acme", "tokyo", 2).is_err());
}

// ── Property: invariants hold under arbitrary op sequences ───────────────────

#[derive(Debug, Clone)]
enum Op {
    Add(u8),
    Alloc(u8, u16),
    Free(u8),
    Archive(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(Op::Add),
        ((0u8..6), (1u16..4)).prop_map(|(n, c)| Op::Alloc(n, c)),
        (0u8..6).prop_map(Op::Free),
        (0u8..6).prop_map(Op::Archive),
    ]
}

fn wt_name(n: u8) -> String {
    format!("w{n}")
}

proptest! {
    #[test]
    fn invariants_hold_for_any_op_sequence(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let mut doc = doc_with_small_pool();
        for op in ops {
            match op {
                Op::Add(n) => {
                    let name = wt_name(n);
                    if !doc.projects["acme"].worktrees.contains_key(&name) {
                        let mut w = test_worktree("feat/p");
                        w.setup_status = SetupStatus::Done;
                        doc.projects["acme"].worktrees.insert(name, w);
                    }
                }
                Op::Alloc(n, count) => {
                    let _ = allocate_ports(&mut doc, "acme", &wt_name(n), count);
                }
                Op::Free(n) => {
                    let _ = free_worktree_ports(&mut doc, "acme", &wt_name(n));
                }
                Op::Archive(n) => {
                    let name = wt_name(n);
                    if doc.worktree("acme", &name).is_ok() {
                        let _ = free_worktree_ports(&mut doc, "acme", &name);
                        if let Ok(wt) = doc.worktree_mut("acme", &name) {
                            wt.archived = true;
                        }
                    }
                }
            }
            prop_assert!(verify_port_invariants(&doc).is_ok(),
                "invariant violated after {:?}: {:?}", doc, verify_port_invariants(&doc));
        }
    }
}
