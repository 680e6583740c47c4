// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized worktree materialization.
//!
//! `git worktree add` on the same repository from two concurrent tasks can
//! deadlock on repository locks, so every materialize in the process goes
//! through this single-consumer FIFO — across all projects, at most one
//! runs at a time. Setup scripts are handed off asynchronously and do run
//! in parallel, both with each other and with further queue jobs.

use crate::setup::{ScriptContext, SetupRunner};
use conductor_adapters::{GitAdapter, GitError};
use conductor_core::{Error, SetupStatus, Subsystem};
use conductor_store::Store;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Completion callback: fires exactly once with the outcome.
pub type Notify = Box<dyn FnOnce(Result<(), Error>) + Send + 'static>;

/// A materialize job, enqueued after Prepare succeeds.
pub struct CreateJob {
    pub project: String,
    pub worktree: String,
    pub branch: String,
    pub repo_path: PathBuf,
    pub worktree_path: PathBuf,
    /// Fires when the git phase settles (worktree exists or Failed)
    pub on_created: Option<Notify>,
    /// Fires when the setup script settles (Done or Failed)
    pub on_setup_complete: Option<Notify>,
}

/// Handle to the process-wide create queue.
#[derive(Clone)]
pub struct CreateQueue {
    tx: mpsc::UnboundedSender<CreateJob>,
    queued: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
}

impl CreateQueue {
    /// Spawn the worker task. One queue per process.
    pub fn spawn<G: GitAdapter>(store: Store, git: Arc<G>, setup: SetupRunner) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let queued = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicBool::new(false));
        tokio::spawn(worker(
            store,
            git,
            setup,
            rx,
            Arc::clone(&queued),
            Arc::clone(&running),
        ));
        Self { tx, queued, running }
    }

    pub fn enqueue(&self, job: CreateJob) -> Result<(), Error> {
        self.queued.fetch_add(1, Ordering::SeqCst);
        self.tx.send(job).map_err(|_| {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            Error::Closed
        })
    }

    /// Jobs waiting behind the current one.
    pub fn queue_size(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Whether a materialize is in flight right now.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wait until queued and in-flight jobs have settled. Used at shutdown;
    /// setup scripts are detached and keep running regardless.
    pub async fn drain(&self) {
        while self.is_running() || self.queue_size() > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }
}

/// Single consumer: drains jobs one at a time, sleeps on an empty queue.
async fn worker<G: GitAdapter>(
    store: Store,
    git: Arc<G>,
    setup: SetupRunner,
    mut rx: mpsc::UnboundedReceiver<CreateJob>,
    queued: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
) {
    while let Some(job) = rx.recv().await {
        queued.fetch_sub(1, Ordering::SeqCst);
        running.store(true, Ordering::SeqCst);
        materialize(&store, git.as_ref(), &setup, job).await;
        running.store(false, Ordering::SeqCst);
    }
}

async fn materialize<G: GitAdapter>(store: &Store, git: &G, setup: &SetupRunner, job: CreateJob) {
    info!(
        project = %job.project,
        worktree = %job.worktree,
        branch = %job.branch,
        "materializing worktree"
    );

    if let Some(parent) = job.worktree_path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }

    match git
        .worktree_add(&job.repo_path, &job.worktree_path, &job.branch)
        .await
    {
        Err(e) => {
            let err = map_git_error(e);
            warn!(
                project = %job.project,
                worktree = %job.worktree,
                error = %err,
                "materialize failed"
            );
            if let Err(se) =
                store.set_worktree_status(&job.project, &job.worktree, SetupStatus::Failed)
            {
                warn!(error = %se, "failed to record materialize failure");
            }
            if let Some(cb) = job.on_created {
                cb(Err(err));
            }
        }
        Ok(()) => {
            if let Err(e) =
                store.set_worktree_status(&job.project, &job.worktree, SetupStatus::Running)
            {
                warn!(error = %e, "failed to record materialize success");
            }
            if let Some(cb) = job.on_created {
                cb(Ok(()));
            }
            // Ports were allocated during Prepare; read them back for the env
            let ports = store
                .worktree(&job.project, &job.worktree)
                .map(|w| w.ports)
                .unwrap_or_default();
            setup.start_setup(
                ScriptContext {
                    project: job.project,
                    project_path: job.repo_path,
                    worktree: job.worktree,
                    worktree_path: job.worktree_path,
                    ports,
                },
                job.on_setup_complete,
            );
        }
    }
}

/// Lift a git adapter error into the domain error space.
pub(crate) fn map_git_error(e: GitError) -> Error {
    match e {
        GitError::BranchAlreadyCheckedOut { path } => Error::BranchAlreadyCheckedOut { path },
        other => Error::external(Subsystem::Git, other.to_string()),
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
