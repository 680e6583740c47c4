// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::queue::Notify;
use chrono::Utc;
use conductor_core::{Error, Project, SetupStatus, Worktree};
use conductor_store::Store;
use std::fs;
use std::path::PathBuf;

pub(crate) struct TestRig {
    pub dir: tempfile::TempDir,
    pub store: Store,
}

/// Store in a tempdir. Must run inside a tokio runtime.
pub(crate) fn rig() -> TestRig {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("conductor.json")).unwrap();
    TestRig { dir, store }
}

impl TestRig {
    /// Register a project backed by a real (empty) repo directory.
    pub fn add_project(&self, name: &str) -> PathBuf {
        let repo = self.dir.path().join(format!("repo-{name}"));
        fs::create_dir_all(&repo).unwrap();
        self.store
            .add_project(name, Project::new(repo.clone(), Utc::now()))
            .unwrap();
        repo
    }

    /// Insert a worktree already in `Running` with an existing directory,
    /// as if materialize just succeeded.
    pub fn add_running_worktree(&self, project: &str, name: &str, ports: Vec<u16>) -> PathBuf {
        let wt_path = self.dir.path().join(project).join(name);
        fs::create_dir_all(&wt_path).unwrap();
        let mut wt = Worktree::new(wt_path.clone(), "feat/x", Utc::now());
        wt.setup_status = SetupStatus::Running;
        wt.ports = ports;
        self.store
            .batch_mutate(|doc| {
                doc.project_mut(project)?
                    .worktrees
                    .insert(name.to_string(), wt);
                Ok(())
            })
            .unwrap();
        wt_path
    }

    pub fn logs(&self) -> crate::logs::LogBuffers {
        crate::logs::LogBuffers::new(self.dir.path().join("logs"))
    }
}

/// A completion callback paired with a receiver for its outcome.
pub(crate) fn notify_channel() -> (
    Notify,
    tokio::sync::oneshot::Receiver<Result<(), Error>>,
) {
    let (tx, rx) = tokio::sync::oneshot::channel();
    (
        Box::new(move |res| {
            let _ = tx.send(res);
        }),
        rx,
    )
}
