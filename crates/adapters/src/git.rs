// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git CLI adapter.
//!
//! Materializing a worktree resolves the branch in this order: an existing
//! local branch is checked out as-is; a branch on `origin` is fetched and
//! tracked; anything else is created fresh from the golden branch
//! (`origin/master` if present, else `origin/main`). A branch already
//! checked out in another worktree is a hard error so the UI can offer a
//! rename instead of letting git fail with a lock message.

use crate::subprocess::{
    run_with_timeout, GIT_QUERY_TIMEOUT, GIT_REMOTE_TIMEOUT, GIT_WORKTREE_TIMEOUT,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors from git subprocess calls.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("branch already checked out at {}", path.display())]
    BranchAlreadyCheckedOut { path: PathBuf },
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },
    #[error("{0}")]
    Subprocess(String),
}

/// The git surface the engine needs. Implemented by [`CliGit`] in
/// production and by a recording fake in tests.
#[async_trait]
pub trait GitAdapter: Send + Sync + 'static {
    /// Create a worktree at `path` checked out to `branch`, resolving the
    /// branch per the order documented on this module.
    async fn worktree_add(&self, repo: &Path, path: &Path, branch: &str) -> Result<(), GitError>;

    /// `git worktree remove --force`.
    async fn worktree_remove(&self, repo: &Path, path: &Path) -> Result<(), GitError>;

    /// Branch → checkout path for every worktree of the repository.
    async fn checked_out_branches(&self, repo: &Path)
        -> Result<HashMap<String, PathBuf>, GitError>;

    /// `git branch -D`. Callers typically ignore the result: the branch may
    /// be shared with another checkout or already gone.
    async fn delete_branch(&self, repo: &Path, branch: &str) -> Result<(), GitError>;

    async fn current_branch(&self, repo: &Path) -> Result<String, GitError>;

    /// `(owner, repo)` parsed from the `origin` remote, if it points at GitHub.
    async fn detect_github_remote(&self, repo: &Path) -> Result<Option<(String, String)>, GitError>;
}

/// Production adapter shelling out to `git`.
#[derive(Debug, Clone, Default)]
pub struct CliGit;

impl CliGit {
    async fn run(
        &self,
        repo: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, GitError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(repo).args(args);
        let description = format!("git {}", args.join(" "));
        let output = run_with_timeout(cmd, timeout, &description)
            .await
            .map_err(GitError::Subprocess)?;
        if !output.status.success() {
            return Err(GitError::Command {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn ref_exists(&self, repo: &Path, reference: &str) -> bool {
        self.run(
            repo,
            &["show-ref", "--verify", "--quiet", reference],
            GIT_QUERY_TIMEOUT,
        )
        .await
        .is_ok()
    }

    async fn remote_branch_exists(&self, repo: &Path, branch: &str) -> bool {
        match self
            .run(
                repo,
                &["ls-remote", "--heads", "origin", branch],
                GIT_REMOTE_TIMEOUT,
            )
            .await
        {
            Ok(stdout) => !stdout.trim().is_empty(),
            Err(_) => false,
        }
    }

    /// The project's default branch: `origin/master` when present, else
    /// `origin/main`, else the current HEAD.
    async fn golden_base(&self, repo: &Path) -> String {
        for base in ["origin/master", "origin/main"] {
            if self
                .ref_exists(repo, &format!("refs/remotes/{base}"))
                .await
            {
                return base.to_string();
            }
        }
        "HEAD".to_string()
    }
}

#[async_trait]
impl GitAdapter for CliGit {
    async fn worktree_add(&self, repo: &Path, path: &Path, branch: &str) -> Result<(), GitError> {
        let checked_out = self.checked_out_branches(repo).await?;
        if let Some(existing) = checked_out.get(branch) {
            return Err(GitError::BranchAlreadyCheckedOut {
                path: existing.clone(),
            });
        }

        let path_str = path.to_string_lossy();

        if self
            .ref_exists(repo, &format!("refs/heads/{branch}"))
            .await
        {
            debug!(branch, "existing local branch, plain checkout");
            self.run(repo, &["worktree", "add", &path_str, branch], GIT_WORKTREE_TIMEOUT)
                .await?;
            return Ok(());
        }

        if self.remote_branch_exists(repo, branch).await {
            debug!(branch, "remote branch, fetch and track");
            self.run(repo, &["fetch", "origin", branch], GIT_REMOTE_TIMEOUT)
                .await?;
            let origin_ref = format!("origin/{branch}");
            self.run(
                repo,
                &[
                    "worktree", "add", "--track", "-b", branch, &path_str, &origin_ref,
                ],
                GIT_WORKTREE_TIMEOUT,
            )
            .await?;
            return Ok(());
        }

        let base = self.golden_base(repo).await;
        debug!(branch, base = %base, "new branch from golden base");
        self.run(
            repo,
            &["worktree", "add", "-b", branch, &path_str, &base],
            GIT_WORKTREE_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn worktree_remove(&self, repo: &Path, path: &Path) -> Result<(), GitError> {
        let path_str = path.to_string_lossy();
        self.run(
            repo,
            &["worktree", "remove", "--force", &path_str],
            GIT_WORKTREE_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn checked_out_branches(
        &self,
        repo: &Path,
    ) -> Result<HashMap<String, PathBuf>, GitError> {
        let stdout = self
            .run(repo, &["worktree", "list", "--porcelain"], GIT_QUERY_TIMEOUT)
            .await?;
        Ok(parse_worktree_list(&stdout))
    }

    async fn delete_branch(&self, repo: &Path, branch: &str) -> Result<(), GitError> {
        self.run(repo, &["branch", "-D", branch], GIT_QUERY_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn current_branch(&self, repo: &Path) -> Result<String, GitError> {
        let stdout = self
            .run(repo, &["branch", "--show-current"], GIT_QUERY_TIMEOUT)
            .await?;
        Ok(stdout.trim().to_string())
    }

    async fn detect_github_remote(
        &self,
        repo: &Path,
    ) -> Result<Option<(String, String)>, GitError> {
        let stdout = self
            .run(repo, &["remote", "get-url", "origin"], GIT_QUERY_TIMEOUT)
            .await?;
        Ok(parse_github_remote(stdout.trim()))
    }
}

/// Parse `git worktree list --porcelain` into branch → path.
///
/// Detached or bare entries carry no `branch` line and are skipped.
fn parse_worktree_list(porcelain: &str) -> HashMap<String, PathBuf> {
    let mut map = HashMap::new();
    let mut current_path: Option<PathBuf> = None;
    for line in porcelain.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            current_path = Some(PathBuf::from(path));
        } else if let Some(branch_ref) = line.strip_prefix("branch ") {
            let branch = branch_ref
                .strip_prefix("refs/heads/")
                .unwrap_or(branch_ref);
            if let Some(path) = current_path.clone() {
                map.insert(branch.to_string(), path);
            }
        }
    }
    map
}

/// Parse a GitHub remote URL into `(owner, repo)`.
///
/// Understands `git@github.com:owner/repo.git` and
/// `https://github.com/owner/repo(.git)`.
fn parse_github_remote(url: &str) -> Option<(String, String)> {
    let rest = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))?;
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let (owner, repo) = rest.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
