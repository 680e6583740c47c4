// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status enums for the worktree lifecycle.
//!
//! On-disk spellings match the JSON schema: setup status is one of
//! `"" | "creating" | "running" | "done" | "failed"`, archive status is
//! `"" | "running"`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Setup lifecycle state of a worktree.
///
/// `Creating` and `Running` are transient: they are only valid while a task
/// owns the worktree and are reset to `Failed` by the recovery pass after a
/// process crash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SetupStatus {
    /// No setup has been attempted (root worktrees stay here)
    #[default]
    None,
    /// Prepare succeeded; `git worktree add` is pending or in flight
    Creating,
    /// Git worktree exists; the setup script is running
    Running,
    /// Setup completed successfully
    Done,
    /// Git materialize or the setup script failed
    Failed,
}

impl SetupStatus {
    /// True for the transient in-flight states that must not survive a restart.
    pub fn is_in_flight(self) -> bool {
        matches!(self, SetupStatus::Creating | SetupStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SetupStatus::Done | SetupStatus::Failed)
    }

    fn as_str(self) -> &'static str {
        match self {
            SetupStatus::None => "",
            SetupStatus::Creating => "creating",
            SetupStatus::Running => "running",
            SetupStatus::Done => "done",
            SetupStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SetupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for SetupStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SetupStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "" => Ok(SetupStatus::None),
            "creating" => Ok(SetupStatus::Creating),
            "running" => Ok(SetupStatus::Running),
            "done" => Ok(SetupStatus::Done),
            "failed" => Ok(SetupStatus::Failed),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["", "creating", "running", "done", "failed"],
            )),
        }
    }
}

/// Archive sub-state of a worktree.
///
/// Set to `Running` while the archive script and git removal are in
/// progress, cleared when archiving completes (or by recovery).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveStatus {
    #[default]
    None,
    Running,
}

impl ArchiveStatus {
    fn as_str(self) -> &'static str {
        match self {
            ArchiveStatus::None => "",
            ArchiveStatus::Running => "running",
        }
    }
}

impl fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ArchiveStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ArchiveStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "" => Ok(ArchiveStatus::None),
            "running" => Ok(ArchiveStatus::Running),
            other => Err(serde::de::Error::unknown_variant(other, &["", "running"])),
        }
    }
}

/// Tunnel flavor: throwaway quick tunnel or a named tunnel with ingress rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelMode {
    Quick,
    Named,
}

impl fmt::Display for TunnelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelMode::Quick => write!(f, "quick"),
            TunnelMode::Named => write!(f, "named"),
        }
    }
}

/// Pull request state as reported by the GitHub client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
    Merged,
    Draft,
}

impl PrState {
    /// Open and draft PRs count as active for the auto-scanner.
    pub fn is_open(self) -> bool {
        matches!(self, PrState::Open | PrState::Draft)
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Closed => write!(f, "closed"),
            PrState::Merged => write!(f, "merged"),
            PrState::Draft => write!(f, "draft"),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
