// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script output capture: in-memory ring for live viewing plus an
//! append-only log file per worktree and script kind.
//!
//! Files land at `<conductor-dir>/logs/<project>/<worktree>-<kind>.log`.
//! Logging must never break the engine: file failures are traced and
//! swallowed, the ring always works.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Which lifecycle script a log line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptLogKind {
    Setup,
    Archive,
}

impl fmt::Display for ScriptLogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptLogKind::Setup => write!(f, "setup"),
            ScriptLogKind::Archive => write!(f, "archive"),
        }
    }
}

type LogKey = (String, String, ScriptLogKind);

/// Lines kept in memory per (project, worktree, kind).
const RING_CAP: usize = 2000;

/// Shared log sink for script output.
#[derive(Clone)]
pub struct LogBuffers {
    rings: Arc<Mutex<HashMap<LogKey, VecDeque<String>>>>,
    log_dir: PathBuf,
}

impl LogBuffers {
    /// `log_dir` is `<conductor-dir>/logs`.
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            rings: Arc::new(Mutex::new(HashMap::new())),
            log_dir,
        }
    }

    /// Path of the on-disk log for a worktree and script kind.
    pub fn log_path(&self, project: &str, worktree: &str, kind: ScriptLogKind) -> PathBuf {
        self.log_dir
            .join(project)
            .join(format!("{worktree}-{kind}.log"))
    }

    /// Append one output line to the ring and the log file.
    pub fn append(&self, project: &str, worktree: &str, kind: ScriptLogKind, line: &str) {
        {
            let mut rings = self.rings.lock();
            let ring = rings
                .entry((project.to_string(), worktree.to_string(), kind))
                .or_default();
            if ring.len() == RING_CAP {
                ring.pop_front();
            }
            ring.push_back(line.to_string());
        }

        let path = self.log_path(project, worktree, kind);
        if let Err(e) = append_line(&path, line) {
            warn!(project, worktree, error = %e, "failed to write script log");
        }
    }

    /// Drop the in-memory ring so a retry starts with a clean view. The
    /// file keeps the full history.
    pub fn clear_ring(&self, project: &str, worktree: &str, kind: ScriptLogKind) {
        self.rings
            .lock()
            .remove(&(project.to_string(), worktree.to_string(), kind));
    }

    /// Copy of the captured lines for the Logs view.
    pub fn lines(&self, project: &str, worktree: &str, kind: ScriptLogKind) -> Vec<String> {
        self.rings
            .lock()
            .get(&(project.to_string(), worktree.to_string(), kind))
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
