// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scaffolding for the spec suite.

use conductor_adapters::fake::FakeGit;
use conductor_core::Error;
use conductor_engine::{CreateOptions, LifecycleEngine, LogBuffers, Notify, SetupRunner};
use conductor_store::Store;
use std::fs;
use std::sync::Arc;

pub struct SpecRig {
    pub dir: tempfile::TempDir,
    pub store: Store,
    pub git: FakeGit,
    pub engine: LifecycleEngine<FakeGit>,
}

/// Store + engine against a fake git, with one registered project `acme`
/// and a ten-port pool `[3100, 3109]`.
pub fn spec_rig() -> SpecRig {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("conductor.json")).unwrap();

    let repo = dir.path().join("repo-acme");
    fs::create_dir_all(&repo).unwrap();
    store
        .add_project(
            "acme",
            conductor_core::Project::new(repo, conductor_core::test_support::ts(0)),
        )
        .unwrap();
    store
        .batch_mutate(|doc| {
            doc.defaults.port_range_start = 3100;
            doc.defaults.port_range_end = 3109;
            Ok(())
        })
        .unwrap();

    let git = FakeGit::new();
    let setup = SetupRunner::new(store.clone(), LogBuffers::new(dir.path().join("logs")));
    let engine = LifecycleEngine::new(
        store.clone(),
        Arc::new(git.clone()),
        setup,
        dir.path().to_path_buf(),
    );
    SpecRig {
        dir,
        store,
        git,
        engine,
    }
}

/// Notify callback paired with a oneshot receiver.
pub fn notify_channel() -> (
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

/// Create a worktree and wait until its setup settles.
pub async fn create_and_wait(rig: &SpecRig, branch: &str, count: u16) -> String {
    let (notify, rx) = notify_channel();
    let name = rig
        .engine
        .create_worktree(
            "acme",
            branch,
            CreateOptions {
                name: None,
                ports: count,
            },
            None,
            Some(notify),
        )
        .unwrap();
    rx.await.unwrap().unwrap();
    name
}
