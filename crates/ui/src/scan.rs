// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planning for the Claude-PR auto-scan.
//!
//! Every scan round fetches each project's open PRs; this module decides,
//! purely from a document snapshot and those lists, which `claude/`
//! branches need a worktree materialized. The driver performs the fetches
//! and the creations; nothing here does I/O.

use conductor_core::{Document, PrInfo};

/// Head-branch prefix that marks a PR for auto-materialization.
pub const CLAUDE_BRANCH_PREFIX: &str = "claude/";

/// `(project, branch)` pairs that need a worktree: the PR is open, its
/// head starts with `claude/`, and no non-archived worktree of that
/// project is already on the branch. Duplicate branches within a round are
/// collapsed.
pub fn plan_claude_worktrees(
    doc: &Document,
    prs_by_project: &[(String, Vec<PrInfo>)],
) -> Vec<(String, String)> {
    let mut plan: Vec<(String, String)> = Vec::new();
    for (project_name, prs) in prs_by_project {
        let Some(project) = doc.projects.get(project_name) else {
            continue;
        };
        for pr in prs {
            if !pr.state.is_open() || !pr.head_branch.starts_with(CLAUDE_BRANCH_PREFIX) {
                continue;
            }
            if project.worktree_on_branch(&pr.head_branch).is_some() {
                continue;
            }
            let entry = (project_name.clone(), pr.head_branch.clone());
            if !plan.contains(&entry) {
                plan.push(entry);
            }
        }
    }
    plan
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
