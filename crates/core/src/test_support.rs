// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::document::Document;
use crate::project::Project;
use crate::status::SetupStatus;
use crate::worktree::Worktree;
use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;

/// Fixed timestamp for deterministic assertions.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap_or_default()
}

pub fn test_project(path: &str) -> Project {
    Project::new(PathBuf::from(path), ts(0))
}

pub fn test_worktree(branch: &str) -> Worktree {
    Worktree::new(PathBuf::from("/tmp/conductor/test"), branch, ts(0))
}

pub fn done_worktree(branch: &str) -> Worktree {
    let mut w = test_worktree(branch);
    w.setup_status = SetupStatus::Done;
    w
}

/// Document with one project `"acme"` at `/repo/acme` and the default
/// 3100..3999 pool.
pub fn doc_with_project() -> Document {
    let mut doc = Document::new();
    doc.projects
        .insert("acme".to_string(), test_project("/repo/acme"));
    doc
}

/// Document with a narrow ten-port pool, handy for exhaustion tests.
pub fn doc_with_small_pool() -> Document {
    let mut doc = doc_with_project();
    doc.defaults.port_range_start = 3100;
    doc.defaults.port_range_end = 3109;
    doc
}
