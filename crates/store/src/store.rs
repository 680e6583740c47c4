// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store: sole mutation surface over the document.
//!
//! A single reader-writer lock guards the in-memory document. Readers get
//! deep copies; writers are exclusive and every successful mutation marks
//! the document dirty and nudges the autosave worker through a capacity-1
//! channel. The worker debounces bursts, writes the whole document
//! atomically, and retries with linear backoff; the last failure is kept
//! for the UI status bar and reported to an optional callback.

use crate::persist::{encode_document, load_document, DocumentWriter, FsDocumentWriter, PersistError};
use crate::ports;
use chrono::Utc;
use conductor_core::{
    ArchiveStatus, Defaults, Document, EntityKind, Error, PrInfo, Project, SaveError, SetupStatus,
    TunnelState, UpdateSettings, Worktree,
};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// Callback invoked when a save has failed after all retries.
pub type SaveErrorCallback = Arc<dyn Fn(&SaveError) + Send + Sync>;

/// Tunables for the autosave worker.
pub struct StoreOptions {
    /// How long to coalesce mutation bursts before writing
    pub debounce: Duration,
    /// Retries after the initial failed write attempt
    pub max_retries: u32,
    pub on_save_error: Option<SaveErrorCallback>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            max_retries: 3,
            on_save_error: None,
        }
    }
}

/// Outcome of [`Store::close`].
#[derive(Debug, Clone, Default)]
pub struct CloseReport {
    /// Whether dirty state was still waiting to be flushed at close time
    pub had_pending_saves: bool,
    pub last_error: Option<SaveError>,
}

struct Shared {
    doc: RwLock<Document>,
    path: PathBuf,
    writer: Box<dyn DocumentWriter>,
    dirty: AtomicBool,
    closed: AtomicBool,
    last_error: Mutex<Option<SaveError>>,
    on_save_error: Option<SaveErrorCallback>,
    debounce: Duration,
    max_retries: u32,
    nudge_tx: mpsc::Sender<()>,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
    report_rx: Mutex<Option<oneshot::Receiver<CloseReport>>>,
}

/// Handle to the store. Cheap to clone; all clones share the same document
/// and save worker.
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    /// Load (or default-create) the document at `path` and spawn the
    /// autosave worker. Must be called inside a tokio runtime.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        Self::open_with(path, Box::new(FsDocumentWriter), StoreOptions::default())
    }

    /// `open` with an injected writer and tunables (tests).
    pub fn open_with(
        path: impl Into<PathBuf>,
        writer: Box<dyn DocumentWriter>,
        options: StoreOptions,
    ) -> Result<Self, PersistError> {
        let path = path.into();
        let doc = load_document(&path)?;

        let (nudge_tx, nudge_rx) = mpsc::channel(1);
        let (close_tx, close_rx) = oneshot::channel();
        let (report_tx, report_rx) = oneshot::channel();

        let shared = Arc::new(Shared {
            doc: RwLock::new(doc),
            path,
            writer,
            dirty: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            last_error: Mutex::new(None),
            on_save_error: options.on_save_error,
            debounce: options.debounce,
            max_retries: options.max_retries,
            nudge_tx,
            close_tx: Mutex::new(Some(close_tx)),
            report_rx: Mutex::new(Some(report_rx)),
        });

        tokio::spawn(save_worker(Arc::clone(&shared), nudge_rx, close_rx, report_tx));

        Ok(Self { shared })
    }

    /// Where the document lives on disk.
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    // ── Mutation surface ─────────────────────────────────────────────────

    /// Run a multi-step edit under the write lock.
    ///
    /// The dirty flag and the save nudge are applied exactly once, and only
    /// when `f` succeeds. All single-field mutation methods below are
    /// implemented in terms of this.
    pub fn batch_mutate<T>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        let result = {
            let mut doc = self.shared.doc.write();
            f(&mut doc)?
        };
        self.shared.dirty.store(true, Ordering::SeqCst);
        // Capacity-1 channel: a pending nudge already covers this mutation
        let _ = self.shared.nudge_tx.try_send(());
        Ok(result)
    }

    pub fn add_project(&self, name: &str, project: Project) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            if doc.projects.contains_key(name) {
                return Err(Error::duplicate(EntityKind::Project, name));
            }
            doc.projects.insert(name.to_string(), project);
            Ok(())
        })
    }

    /// Remove a project and free every port owned by its worktrees.
    pub fn remove_project(&self, name: &str) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            if !doc.projects.contains_key(name) {
                return Err(Error::not_found(EntityKind::Project, name));
            }
            ports::free_project_ports(doc, name);
            doc.projects.shift_remove(name);
            Ok(())
        })
    }

    pub fn add_worktree(&self, project: &str, name: &str, worktree: Worktree) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            let p = doc.project_mut(project)?;
            if p.worktrees.contains_key(name) {
                return Err(Error::duplicate(
                    EntityKind::Worktree,
                    format!("{project}/{name}"),
                ));
            }
            p.worktrees.insert(name.to_string(), worktree);
            Ok(())
        })
    }

    /// Apply a setup state machine transition. Same-state
    /// writes are accepted as no-ops without dirtying the document.
    pub fn set_worktree_status(
        &self,
        project: &str,
        worktree: &str,
        status: SetupStatus,
    ) -> Result<(), Error> {
        if self.worktree(project, worktree)?.setup_status == status {
            return Ok(());
        }
        self.batch_mutate(|doc| {
            let wt = doc.worktree_mut(project, worktree)?;
            if !setup_transition_ok(wt.setup_status, status) {
                return Err(Error::InvariantViolation(format!(
                    "illegal setup transition {} -> {} for {project}/{worktree}",
                    wt.setup_status, status
                )));
            }
            wt.setup_status = status;
            Ok(())
        })
    }

    pub fn set_archive_status(
        &self,
        project: &str,
        worktree: &str,
        status: ArchiveStatus,
    ) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            doc.worktree_mut(project, worktree)?.archive_status = status;
            Ok(())
        })
    }

    /// Tombstone a worktree: free its ports, mark it archived. The entry
    /// remains so logs can still be viewed.
    pub fn archive_worktree(&self, project: &str, worktree: &str) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            {
                let wt = doc.worktree(project, worktree)?;
                if wt.is_root {
                    return Err(Error::InvariantViolation(format!(
                        "root worktree {project}/{worktree} cannot be archived"
                    )));
                }
                if wt.archived {
                    return Err(Error::InvariantViolation(format!(
                        "worktree {project}/{worktree} is already archived"
                    )));
                }
                if !wt.setup_status.is_terminal() {
                    return Err(Error::InvariantViolation(format!(
                        "worktree {project}/{worktree} is still {}",
                        wt.setup_status
                    )));
                }
            }
            ports::free_worktree_ports(doc, project, worktree)?;
            let wt = doc.worktree_mut(project, worktree)?;
            wt.archived = true;
            wt.archived_at = Some(Utc::now());
            wt.archive_status = ArchiveStatus::None;
            Ok(())
        })
    }

    /// Remove an archived worktree from its project.
    pub fn delete_worktree(&self, project: &str, worktree: &str) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            {
                let wt = doc.worktree(project, worktree)?;
                if wt.is_root {
                    return Err(Error::InvariantViolation(format!(
                        "root worktree {project}/{worktree} cannot be deleted"
                    )));
                }
                if !wt.archived {
                    return Err(Error::InvariantViolation(format!(
                        "worktree {project}/{worktree} must be archived before delete"
                    )));
                }
            }
            doc.project_mut(project)?.worktrees.shift_remove(worktree);
            Ok(())
        })
    }

    /// Atomically allocate a contiguous port window for a worktree.
    pub fn allocate_ports(
        &self,
        project: &str,
        worktree: &str,
        count: u16,
    ) -> Result<Vec<u16>, Error> {
        self.batch_mutate(|doc| ports::allocate_ports(doc, project, worktree, count))
    }

    /// Release a worktree's port window. Idempotent.
    pub fn free_worktree_ports(&self, project: &str, worktree: &str) -> Result<(), Error> {
        self.batch_mutate(|doc| ports::free_worktree_ports(doc, project, worktree))
    }

    pub fn set_tunnel_state(
        &self,
        project: &str,
        worktree: &str,
        tunnel: TunnelState,
    ) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            doc.worktree_mut(project, worktree)?.tunnel = Some(tunnel);
            Ok(())
        })
    }

    pub fn clear_tunnel_state(&self, project: &str, worktree: &str) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            doc.worktree_mut(project, worktree)?.tunnel = None;
            Ok(())
        })
    }

    pub fn set_worktree_prs(
        &self,
        project: &str,
        worktree: &str,
        prs: Vec<PrInfo>,
    ) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            doc.worktree_mut(project, worktree)?.prs = prs;
            Ok(())
        })
    }

    pub fn set_github_config(
        &self,
        project: &str,
        owner: Option<String>,
        repo: Option<String>,
    ) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            let p = doc.project_mut(project)?;
            p.github_owner = owner;
            p.github_repo = repo;
            Ok(())
        })
    }

    pub fn set_defaults(&self, defaults: Defaults) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            doc.defaults = defaults;
            Ok(())
        })
    }

    pub fn set_update_settings(&self, updates: UpdateSettings) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            doc.updates = updates;
            Ok(())
        })
    }

    /// Record the outcome of an update check.
    pub fn record_update_check(&self, latest_version: &str) -> Result<(), Error> {
        self.batch_mutate(|doc| {
            doc.updates.last_check = Some(Utc::now());
            doc.updates.last_version = latest_version.to_string();
            Ok(())
        })
    }

    // ── Read surface (deep copies) ───────────────────────────────────────

    /// Deep copy of the entire document.
    pub fn snapshot(&self) -> Document {
        self.shared.doc.read().clone()
    }

    pub fn project(&self, name: &str) -> Result<Project, Error> {
        self.shared.doc.read().project(name).map(Project::clone)
    }

    pub fn worktree(&self, project: &str, name: &str) -> Result<Worktree, Error> {
        self.shared
            .doc
            .read()
            .worktree(project, name)
            .map(Worktree::clone)
    }

    /// Projects in insertion order.
    pub fn list_projects(&self) -> Vec<(String, Project)> {
        self.shared
            .doc
            .read()
            .projects
            .iter()
            .map(|(name, p)| (name.clone(), p.clone()))
            .collect()
    }

    /// Every worktree across all projects, `(project, name, worktree)`.
    pub fn all_worktrees(&self) -> Vec<(String, String, Worktree)> {
        self.shared
            .doc
            .read()
            .all_worktrees()
            .map(|(p, w, wt)| (p.to_string(), w.to_string(), wt.clone()))
            .collect()
    }

    // ── Persistence control ──────────────────────────────────────────────

    /// True when a mutation has not yet reached disk.
    pub fn dirty(&self) -> bool {
        self.shared.dirty.load(Ordering::SeqCst)
    }

    pub fn last_save_error(&self) -> Option<SaveError> {
        self.shared.last_error.lock().clone()
    }

    /// Synchronous write, bypassing the debounce window.
    pub async fn force_save(&self) -> Result<(), Error> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        save_with_retry(&self.shared).await;
        match self.last_save_error() {
            None => Ok(()),
            Some(e) => Err(Error::Persist { retries: e.retries }),
        }
    }

    /// Discard in-memory state and re-read the document from disk.
    ///
    /// Used when the config watcher detects an external edit. Pending dirty
    /// state is dropped in favor of the on-disk contents.
    pub fn reload(&self) -> Result<(), Error> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        let doc = load_document(&self.shared.path).map_err(|e| Error::Io {
            detail: e.to_string(),
        })?;
        *self.shared.doc.write() = doc;
        self.shared.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Flush pending state and stop the save worker. Mutations after close
    /// are rejected with [`Error::Closed`].
    pub async fn close(&self) -> CloseReport {
        self.shared.closed.store(true, Ordering::SeqCst);
        if let Some(tx) = self.shared.close_tx.lock().take() {
            let _ = tx.send(());
        }
        let rx = self.shared.report_rx.lock().take();
        match rx {
            Some(rx) => rx.await.unwrap_or_default(),
            // A second close observes nothing left to do
            None => CloseReport::default(),
        }
    }
}

/// Legal setup transitions for a non-root worktree.
fn setup_transition_ok(from: SetupStatus, to: SetupStatus) -> bool {
    use SetupStatus::*;
    matches!(
        (from, to),
        (None, Creating)
            | (Creating, Running)
            | (Creating, Failed)
            | (Running, Done)
            | (Running, Failed)
            | (Failed, Creating)
            | (Failed, Running)
    )
}

async fn save_worker(
    shared: Arc<Shared>,
    mut nudge_rx: mpsc::Receiver<()>,
    mut close_rx: oneshot::Receiver<()>,
    report_tx: oneshot::Sender<CloseReport>,
) {
    loop {
        tokio::select! {
            // Close wins over a pending nudge; the final flush below covers it
            biased;
            _ = &mut close_rx => break,
            msg = nudge_rx.recv() => match msg {
                Some(()) => {
                    tokio::time::sleep(shared.debounce).await;
                    // Coalesce a nudge that arrived during the debounce window
                    let _ = nudge_rx.try_recv();
                    save_with_retry(&shared).await;
                }
                None => break,
            },
        }
    }

    let had_pending = shared.dirty.load(Ordering::SeqCst);
    if had_pending {
        save_with_retry(&shared).await;
    }
    let last_error = shared.last_error.lock().clone();
    let _ = report_tx.send(CloseReport {
        had_pending_saves: had_pending,
        last_error,
    });
}

/// One save: snapshot under the read lock, write, retry with linear
/// backoff. On final failure the dirty flag is restored so a later nudge
/// or the close flush tries again.
async fn save_with_retry(shared: &Shared) {
    shared.dirty.store(false, Ordering::SeqCst);

    let bytes = {
        let doc = shared.doc.read();
        match encode_document(&doc) {
            Ok(bytes) => bytes,
            Err(e) => {
                record_save_error(shared, e.to_string(), 0);
                return;
            }
        }
    };

    let mut attempt: u32 = 0;
    loop {
        match shared.writer.write(&shared.path, &bytes) {
            Ok(()) => {
                *shared.last_error.lock() = None;
                return;
            }
            Err(e) if attempt >= shared.max_retries => {
                warn!(
                    path = %shared.path.display(),
                    error = %e,
                    retries = attempt,
                    "document save failed, giving up"
                );
                record_save_error(shared, e.to_string(), attempt);
                shared.dirty.store(true, Ordering::SeqCst);
                return;
            }
            Err(e) => {
                warn!(
                    path = %shared.path.display(),
                    error = %e,
                    attempt,
                    "document save failed, retrying"
                );
                // Linear backoff, as coded in the save path this replaces
                tokio::time::sleep(Duration::from_millis(50 * (u64::from(attempt) + 1))).await;
                attempt += 1;
            }
        }
    }
}

fn record_save_error(shared: &Shared, error: String, retries: u32) {
    let err = SaveError {
        error,
        timestamp: Utc::now(),
        retries,
    };
    *shared.last_error.lock() = Some(err.clone());
    if let Some(cb) = &shared.on_save_error {
        cb(&err);
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
