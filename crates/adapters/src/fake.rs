// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording fakes for the adapter traits.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`. Engine and
//! UI tests drive the full lifecycle against these without touching git,
//! the network, or cloudflared.

use crate::git::{GitAdapter, GitError};
use crate::github::{GithubClient, GithubError};
use crate::tunnel::{TunnelAdapter, TunnelError, TunnelHandle};
use async_trait::async_trait;
use conductor_core::PrInfo;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory git: tracks which branches are checked out where and records
/// every worktree add/remove.
#[derive(Clone, Default)]
pub struct FakeGit {
    inner: Arc<Mutex<FakeGitState>>,
}

#[derive(Default)]
struct FakeGitState {
    checked_out: HashMap<String, PathBuf>,
    /// Branches whose materialize should fail with a generic git error
    fail_branches: HashSet<String>,
    added: Vec<(PathBuf, String)>,
    removed: Vec<PathBuf>,
    deleted_branches: Vec<String>,
    github_remote: Option<(String, String)>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_branch(&self, branch: &str) {
        self.inner.lock().fail_branches.insert(branch.to_string());
    }

    pub fn clear_failures(&self) {
        self.inner.lock().fail_branches.clear();
    }

    pub fn set_github_remote(&self, owner: &str, repo: &str) {
        self.inner.lock().github_remote = Some((owner.to_string(), repo.to_string()));
    }

    pub fn added(&self) -> Vec<(PathBuf, String)> {
        self.inner.lock().added.clone()
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.inner.lock().removed.clone()
    }

    pub fn deleted_branches(&self) -> Vec<String> {
        self.inner.lock().deleted_branches.clone()
    }
}

#[async_trait]
impl GitAdapter for FakeGit {
    async fn worktree_add(&self, _repo: &Path, path: &Path, branch: &str) -> Result<(), GitError> {
        let mut state = self.inner.lock();
        if state.fail_branches.contains(branch) {
            return Err(GitError::Command {
                command: "worktree add".to_string(),
                stderr: format!("fatal: cannot materialize {branch}"),
            });
        }
        if let Some(existing) = state.checked_out.get(branch) {
            return Err(GitError::BranchAlreadyCheckedOut {
                path: existing.clone(),
            });
        }
        state
            .checked_out
            .insert(branch.to_string(), path.to_path_buf());
        state.added.push((path.to_path_buf(), branch.to_string()));
        Ok(())
    }

    async fn worktree_remove(&self, _repo: &Path, path: &Path) -> Result<(), GitError> {
        let mut state = self.inner.lock();
        state.checked_out.retain(|_, p| p != path);
        state.removed.push(path.to_path_buf());
        Ok(())
    }

    async fn checked_out_branches(
        &self,
        _repo: &Path,
    ) -> Result<HashMap<String, PathBuf>, GitError> {
        Ok(self.inner.lock().checked_out.clone())
    }

    async fn delete_branch(&self, _repo: &Path, branch: &str) -> Result<(), GitError> {
        self.inner.lock().deleted_branches.push(branch.to_string());
        Ok(())
    }

    async fn current_branch(&self, _repo: &Path) -> Result<String, GitError> {
        Ok("main".to_string())
    }

    async fn detect_github_remote(
        &self,
        _repo: &Path,
    ) -> Result<Option<(String, String)>, GitError> {
        Ok(self.inner.lock().github_remote.clone())
    }
}

/// Canned-response GitHub client.
#[derive(Clone, Default)]
pub struct FakeGithub {
    prs: Arc<Mutex<Vec<PrInfo>>>,
    opened_urls: Arc<Mutex<Vec<String>>>,
}

impl FakeGithub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_prs(&self, prs: Vec<PrInfo>) {
        *self.prs.lock() = prs;
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened_urls.lock().clone()
    }
}

#[async_trait]
impl GithubClient for FakeGithub {
    async fn prs_for_branch(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
    ) -> Result<Vec<PrInfo>, GithubError> {
        Ok(self
            .prs
            .lock()
            .iter()
            .filter(|pr| pr.head_branch == branch)
            .cloned()
            .collect())
    }

    async fn open_prs(&self, _owner: &str, _repo: &str) -> Result<Vec<PrInfo>, GithubError> {
        Ok(self.prs.lock().clone())
    }

    async fn open_in_browser(&self, url: &str) -> Result<(), GithubError> {
        self.opened_urls.lock().push(url.to_string());
        Ok(())
    }
}

/// Tunnel fake with a configurable set of live PIDs.
#[derive(Clone, Default)]
pub struct FakeTunnel {
    live: Arc<Mutex<HashSet<u32>>>,
    next_pid: Arc<Mutex<u32>>,
}

impl FakeTunnel {
    pub fn new() -> Self {
        Self {
            live: Arc::new(Mutex::new(HashSet::new())),
            next_pid: Arc::new(Mutex::new(1000)),
        }
    }

    pub fn with_live_pids(pids: impl IntoIterator<Item = u32>) -> Self {
        let fake = Self::new();
        *fake.live.lock() = pids.into_iter().collect();
        fake
    }
}

#[async_trait]
impl TunnelAdapter for FakeTunnel {
    async fn start_quick(
        &self,
        _project: &str,
        _worktree: &str,
        port: u16,
    ) -> Result<TunnelHandle, TunnelError> {
        let pid = {
            let mut next = self.next_pid.lock();
            *next += 1;
            *next
        };
        self.live.lock().insert(pid);
        Ok(TunnelHandle {
            pid,
            url: format!("https://fake-{port}.trycloudflare.com"),
        })
    }

    async fn start_named(
        &self,
        project: &str,
        worktree: &str,
        _tunnel_name: &str,
        hostname: &str,
        port: u16,
    ) -> Result<TunnelHandle, TunnelError> {
        let mut handle = self.start_quick(project, worktree, port).await?;
        handle.url = format!("https://{hostname}");
        Ok(handle)
    }

    async fn stop(&self, pid: u32) -> Result<(), TunnelError> {
        self.live.lock().remove(&pid);
        Ok(())
    }

    async fn test_auth(&self) -> Result<(), TunnelError> {
        Ok(())
    }

    fn live_pids(&self) -> HashSet<u32> {
        self.live.lock().clone()
    }
}
