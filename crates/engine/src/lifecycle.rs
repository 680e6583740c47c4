// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree lifecycle: two-phase create, retry, archive, delete.
//!
//! Prepare runs synchronously under the store lock: pick a city name,
//! allocate the port window, insert the record in `Creating`. Materialize
//! runs later on the create queue. This split lets the UI show the
//! worktree immediately and lets recovery reason about interrupted work.

use crate::queue::{map_git_error, CreateJob, CreateQueue, Notify};
use crate::setup::{ScriptContext, SetupRunner};
use conductor_adapters::GitAdapter;
use conductor_core::{
    pick_worktree_name, EntityKind, Error, Project, SetupStatus, Worktree,
};
use conductor_store::{ports, Store};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Knobs for worktree creation.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Explicit name; a random city name when absent
    pub name: Option<String>,
    /// Port count; 0 means the project/global default
    pub ports: u16,
}

/// Coordinates the store, the git adapter, the create queue, and the setup
/// runner. One per process, built at the composition root.
pub struct LifecycleEngine<G: GitAdapter> {
    store: Store,
    git: Arc<G>,
    queue: CreateQueue,
    setup: SetupRunner,
    conductor_dir: PathBuf,
}

impl<G: GitAdapter> LifecycleEngine<G> {
    pub fn new(store: Store, git: Arc<G>, setup: SetupRunner, conductor_dir: PathBuf) -> Self {
        let queue = CreateQueue::spawn(store.clone(), Arc::clone(&git), setup.clone());
        Self {
            store,
            git,
            queue,
            setup,
            conductor_dir,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn setup_runner(&self) -> &SetupRunner {
        &self.setup
    }

    pub fn queue(&self) -> &CreateQueue {
        &self.queue
    }

    // ── Projects ─────────────────────────────────────────────────────────

    /// Register a repository: detect its GitHub remote and current branch,
    /// record the primary checkout as the root worktree.
    pub async fn add_project(&self, name: &str, path: &Path) -> Result<(), Error> {
        let repo = tokio::fs::canonicalize(path).await?;
        let branch = self
            .git
            .current_branch(&repo)
            .await
            .map_err(map_git_error)?;
        let github = self.git.detect_github_remote(&repo).await.ok().flatten();

        let mut project = Project::new(repo.clone(), Utc::now());
        if let Some((owner, gh_repo)) = github {
            project.github_owner = Some(owner);
            project.github_repo = Some(gh_repo);
        }
        let root_branch = if branch.is_empty() { "HEAD".to_string() } else { branch };
        project
            .worktrees
            .insert("root".to_string(), Worktree::new_root(repo, root_branch, Utc::now()));

        self.store.add_project(name, project)
    }

    pub fn remove_project(&self, name: &str) -> Result<(), Error> {
        self.store.remove_project(name)
    }

    // ── Create ───────────────────────────────────────────────────────────

    /// Phase one (Prepare) plus enqueue of phase two (Materialize).
    ///
    /// Returns the chosen worktree name. Any ports allocated are released
    /// if Prepare fails partway.
    pub fn create_worktree(
        &self,
        project: &str,
        branch: &str,
        opts: CreateOptions,
        on_created: Option<Notify>,
        on_setup_complete: Option<Notify>,
    ) -> Result<String, Error> {
        let conductor_dir = self.conductor_dir.clone();
        let (name, worktree_path, repo_path) = self.store.batch_mutate(|doc| {
            let repo_path;
            let name;
            {
                let proj = doc.project(project)?;
                if let Some((wname, _)) = proj.worktree_on_branch(branch) {
                    return Err(Error::InvariantViolation(format!(
                        "branch {branch} already used by worktree {wname}"
                    )));
                }
                repo_path = proj.path.clone();
                name = match &opts.name {
                    Some(n) => {
                        if proj.worktrees.contains_key(n) {
                            return Err(Error::duplicate(
                                EntityKind::Worktree,
                                format!("{project}/{n}"),
                            ));
                        }
                        n.clone()
                    }
                    None => {
                        pick_worktree_name(|candidate| proj.taken_names().any(|n| n == candidate))
                    }
                };
            }

            let worktree_path = conductor_dir.join(project).join(&name);
            doc.project_mut(project)?
                .worktrees
                .insert(name.clone(), Worktree::new(worktree_path.clone(), branch, Utc::now()));

            if let Err(e) = ports::allocate_ports(doc, project, &name, opts.ports) {
                // Roll back the insert; the failed allocation wrote nothing
                if let Ok(p) = doc.project_mut(project) {
                    p.worktrees.shift_remove(&name);
                }
                return Err(e);
            }

            Ok((name, worktree_path, repo_path))
        })?;

        info!(project, worktree = %name, branch, "prepared worktree");

        self.queue.enqueue(CreateJob {
            project: project.to_string(),
            worktree: name.clone(),
            branch: branch.to_string(),
            repo_path,
            worktree_path,
            on_created,
            on_setup_complete,
        })?;

        Ok(name)
    }

    /// Retry a failed worktree. If git still has the branch checked out at
    /// the worktree path, skip straight to setup; otherwise re-run
    /// materialize through the queue.
    pub async fn retry_setup(
        &self,
        project: &str,
        worktree: &str,
        on_created: Option<Notify>,
        on_setup_complete: Option<Notify>,
    ) -> Result<(), Error> {
        let wt = self.store.worktree(project, worktree)?;
        if wt.setup_status != SetupStatus::Failed {
            return Err(Error::InvariantViolation(format!(
                "worktree {project}/{worktree} is {}, only failed worktrees retry",
                wt.setup_status
            )));
        }
        let proj = self.store.project(project)?;

        self.setup
            .logs()
            .clear_ring(project, worktree, crate::logs::ScriptLogKind::Setup);

        let checked_out = self
            .git
            .checked_out_branches(&proj.path)
            .await
            .map_err(map_git_error)?;
        let materialized = checked_out.get(&wt.branch) == Some(&wt.path);

        if materialized {
            self.store
                .set_worktree_status(project, worktree, SetupStatus::Running)?;
            if let Some(cb) = on_created {
                cb(Ok(()));
            }
            self.setup.start_setup(
                ScriptContext {
                    project: project.to_string(),
                    project_path: proj.path,
                    worktree: worktree.to_string(),
                    worktree_path: wt.path,
                    ports: wt.ports,
                },
                on_setup_complete,
            );
        } else {
            self.store
                .set_worktree_status(project, worktree, SetupStatus::Creating)?;
            self.queue.enqueue(CreateJob {
                project: project.to_string(),
                worktree: worktree.to_string(),
                branch: wt.branch,
                repo_path: proj.path,
                worktree_path: wt.path,
                on_created,
                on_setup_complete,
            })?;
        }
        Ok(())
    }

    // ── Archive and delete ───────────────────────────────────────────────

    /// Archive a worktree: run the archive script (best-effort), remove
    /// the checkout, drop the branch, free the ports, tombstone the entry.
    pub async fn archive_worktree(&self, project: &str, worktree: &str) -> Result<(), Error> {
        let wt = self.store.worktree(project, worktree)?;
        if !wt.can_archive() {
            return Err(Error::InvariantViolation(format!(
                "worktree {project}/{worktree} cannot be archived in its current state"
            )));
        }
        let proj = self.store.project(project)?;

        self.store
            .set_archive_status(project, worktree, conductor_core::ArchiveStatus::Running)?;

        self.setup
            .run_archive(&ScriptContext {
                project: project.to_string(),
                project_path: proj.path.clone(),
                worktree: worktree.to_string(),
                worktree_path: wt.path.clone(),
                ports: wt.ports.clone(),
            })
            .await;

        if let Err(e) = self.git.worktree_remove(&proj.path, &wt.path).await {
            warn!(
                project,
                worktree,
                error = %e,
                "git worktree remove failed, deleting the directory directly"
            );
            let _ = tokio::fs::remove_dir_all(&wt.path).await;
        }

        // The branch may be shared with another checkout or already gone
        let _ = self.git.delete_branch(&proj.path, &wt.branch).await;

        let result = self.store.archive_worktree(project, worktree);
        if result.is_err() {
            let _ = self
                .store
                .set_archive_status(project, worktree, conductor_core::ArchiveStatus::None);
        }
        result
    }

    /// Remove an archived worktree's record entirely.
    pub fn delete_worktree(&self, project: &str, worktree: &str) -> Result<(), Error> {
        self.store.delete_worktree(project, worktree)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
