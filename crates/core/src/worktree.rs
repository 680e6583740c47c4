// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree record and its side-channel state.
//!
//! A worktree is an additional checkout of a project's repository at
//! `<conductor-dir>/<project>/<name>`, isolated by a contiguous range of
//! TCP ports. Archiving tombstones the record (`archived = true`) but keeps
//! it in the document so logs remain viewable; delete removes it entirely.

use crate::status::{ArchiveStatus, PrState, SetupStatus, TunnelMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An additional checkout of the project's repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worktree {
    /// Absolute path under `<conductor-dir>/<project>/<name>`
    pub path: PathBuf,
    /// Branch this worktree has checked out
    pub branch: String,
    /// The repository's primary working tree; never archived, never ported
    #[serde(default)]
    pub is_root: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub setup_status: SetupStatus,
    #[serde(default)]
    pub archive_status: ArchiveStatus,
    /// Contiguous, strictly increasing port range (empty when archived or root)
    #[serde(default)]
    pub ports: Vec<u16>,
    /// Cached PR metadata for the worktree's branch
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prs: Vec<PrInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<TunnelState>,
    /// Unknown keys preserved across load/save round trips
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Worktree {
    /// New non-root worktree in the Creating state.
    pub fn new(path: PathBuf, branch: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            path,
            branch: branch.into(),
            is_root: false,
            created_at,
            archived: false,
            archived_at: None,
            setup_status: SetupStatus::Creating,
            archive_status: ArchiveStatus::None,
            ports: Vec::new(),
            prs: Vec::new(),
            tunnel: None,
            extra: serde_json::Map::new(),
        }
    }

    /// The project's primary working tree. Cannot be archived or deleted.
    pub fn new_root(path: PathBuf, branch: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            is_root: true,
            setup_status: SetupStatus::None,
            ..Self::new(path, branch, created_at)
        }
    }

    /// First allocated port, the one exported as `$PORT` to scripts.
    pub fn primary_port(&self) -> Option<u16> {
        self.ports.first().copied()
    }

    /// Archive is legal from Done or Failed on a non-root worktree.
    pub fn can_archive(&self) -> bool {
        !self.is_root && !self.archived && self.setup_status.is_terminal()
    }
}

/// Cached pull request metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrInfo {
    pub number: u64,
    pub title: String,
    pub head_branch: String,
    pub state: PrState,
    pub url: String,
    pub updated_at: DateTime<Utc>,
    pub author: String,
}

/// Live tunnel side-channel state, reattached via PID files at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelState {
    pub active: bool,
    pub mode: TunnelMode,
    pub url: String,
    pub port: u16,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
