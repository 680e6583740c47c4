// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project record: one registered git repository and its worktrees.

use crate::worktree::Worktree;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A registered git repository.
///
/// Worktree names are unique within a project; across projects they may
/// collide (the port reverse index therefore always carries both names).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Absolute path to the repository's primary working tree
    pub path: PathBuf,
    pub added_at: DateTime<Utc>,
    /// Overrides `defaults.ports_per_worktree` when non-zero
    #[serde(default)]
    pub default_ports_per_worktree: u16,
    /// Auto-detected from the `origin` remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
    #[serde(default)]
    pub worktrees: IndexMap<String, Worktree>,
    /// Unknown keys preserved across load/save round trips
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Project {
    pub fn new(path: PathBuf, added_at: DateTime<Utc>) -> Self {
        Self {
            path,
            added_at,
            default_ports_per_worktree: 0,
            github_owner: None,
            github_repo: None,
            worktrees: IndexMap::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// The branch's non-archived worktree, if any.
    pub fn worktree_on_branch(&self, branch: &str) -> Option<(&str, &Worktree)> {
        self.worktrees
            .iter()
            .find(|(_, w)| !w.archived && w.branch == branch)
            .map(|(name, w)| (name.as_str(), w))
    }

    /// Worktree names currently in use (archived names stay reserved so the
    /// Logs view never shows two histories under one name).
    pub fn taken_names(&self) -> impl Iterator<Item = &str> {
        self.worktrees.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
