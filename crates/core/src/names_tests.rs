// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;

#[test]
fn picks_from_the_city_list_when_free() {
    let name = pick_worktree_name(|_| false);
    assert!(CITY_NAMES.contains(&name.as_str()));
}

#[test]
fn never_returns_a_taken_name() {
    let taken: HashSet<&str> = CITY_NAMES.iter().take(40).copied().collect();
    for _ in 0..50 {
        let name = pick_worktree_name(|n| taken.contains(n));
        assert!(!taken.contains(name.as_str()));
    }
}

#[test]
fn falls_back_to_suffixes_when_pool_is_exhausted() {
    // Everything unsuffixed is taken: only `<city>-N` names remain
    let name = pick_worktree_name(|n| CITY_NAMES.contains(&n));
    assert!(name.contains('-'), "expected suffix fallback, got {name}");
    let (base, n) = name.rsplit_once('-').unwrap();
    assert!(CITY_NAMES.contains(&base));
    assert!(n.parse::<u32>().unwrap() >= 2);
}

#[test]
fn suffix_fallback_skips_taken_suffixes() {
    let name = pick_worktree_name(|n| {
        CITY_NAMES.contains(&n) || n.ends_with("-2") || n.ends_with("-3")
    });
    let (_, n) = name.rsplit_once('-').unwrap();
    assert!(n.parse::<u32>().unwrap() >= 4);
}
