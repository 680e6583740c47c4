// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub client backed by the `gh` CLI.
//!
//! Authentication, pagination, and rate limiting all belong to `gh`; this
//! adapter only shapes its JSON output into [`PrInfo`] records.

use crate::subprocess::{run_with_timeout, GITHUB_TIMEOUT};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conductor_core::{PrInfo, PrState};
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;

/// Errors from GitHub CLI calls.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("gh {command} failed: {stderr}")]
    Command { command: String, stderr: String },
    #[error("unexpected gh output: {0}")]
    Parse(String),
    #[error("{0}")]
    Subprocess(String),
}

/// The GitHub surface the core needs.
#[async_trait]
pub trait GithubClient: Send + Sync + 'static {
    /// Open PRs whose head is `branch`.
    async fn prs_for_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<PrInfo>, GithubError>;

    /// All open PRs of the repository.
    async fn open_prs(&self, owner: &str, repo: &str) -> Result<Vec<PrInfo>, GithubError>;

    /// Open a URL in the user's browser.
    async fn open_in_browser(&self, url: &str) -> Result<(), GithubError>;
}

const PR_JSON_FIELDS: &str = "number,title,headRefName,state,isDraft,url,updatedAt,author";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPr {
    number: u64,
    title: String,
    head_ref_name: String,
    state: String,
    #[serde(default)]
    is_draft: bool,
    url: String,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    author: Option<RawAuthor>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    login: String,
}

impl RawPr {
    fn into_pr_info(self) -> PrInfo {
        let state = if self.is_draft {
            PrState::Draft
        } else {
            match self.state.as_str() {
                "MERGED" | "merged" => PrState::Merged,
                "CLOSED" | "closed" => PrState::Closed,
                _ => PrState::Open,
            }
        };
        PrInfo {
            number: self.number,
            title: self.title,
            head_branch: self.head_ref_name,
            state,
            url: self.url,
            updated_at: self.updated_at,
            author: self.author.map(|a| a.login).unwrap_or_default(),
        }
    }
}

/// Production client shelling out to `gh`.
#[derive(Debug, Clone, Default)]
pub struct GhCli;

impl GhCli {
    async fn pr_list(&self, repo_slug: &str, extra: &[&str]) -> Result<Vec<PrInfo>, GithubError> {
        let mut args = vec![
            "pr",
            "list",
            "--repo",
            repo_slug,
            "--state",
            "open",
            "--json",
            PR_JSON_FIELDS,
        ];
        args.extend_from_slice(extra);

        let mut cmd = Command::new("gh");
        cmd.args(&args);
        let output = run_with_timeout(cmd, GITHUB_TIMEOUT, "gh pr list")
            .await
            .map_err(GithubError::Subprocess)?;
        if !output.status.success() {
            return Err(GithubError::Command {
                command: "pr list".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let raw: Vec<RawPr> = serde_json::from_slice(&output.stdout)
            .map_err(|e| GithubError::Parse(e.to_string()))?;
        Ok(raw.into_iter().map(RawPr::into_pr_info).collect())
    }
}

#[async_trait]
impl GithubClient for GhCli {
    async fn prs_for_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<PrInfo>, GithubError> {
        self.pr_list(&format!("{owner}/{repo}"), &["--head", branch])
            .await
    }

    async fn open_prs(&self, owner: &str, repo: &str) -> Result<Vec<PrInfo>, GithubError> {
        self.pr_list(&format!("{owner}/{repo}"), &[]).await
    }

    async fn open_in_browser(&self, url: &str) -> Result<(), GithubError> {
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(not(target_os = "macos"))]
        let opener = "xdg-open";

        let mut cmd = Command::new(opener);
        cmd.arg(url);
        let output = run_with_timeout(cmd, GITHUB_TIMEOUT, opener)
            .await
            .map_err(GithubError::Subprocess)?;
        if !output.status.success() {
            return Err(GithubError::Command {
                command: opener.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;
