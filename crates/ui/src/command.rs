// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands produced by the reducer.
//!
//! A command is a data description of one unit of I/O. The runtime driver
//! executes it and feeds exactly one follow-up [`crate::Message`] back into
//! the loop. Two exceptions: `CreateWorktree` and `RetrySetup` also arm the
//! detached setup task, whose completion arrives later as its own
//! `SetupComplete` message; `Exit` terminates the loop and resolves to
//! nothing.

use conductor_core::TunnelMode;

/// What to do when the user quits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitMode {
    /// Stop tunnels and detached processes conductor started
    KillAll,
    /// Leave everything running and just leave the screen
    Detach,
}

/// I/O requests from the reducer to the runtime driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Read a fresh snapshot from the store → `Snapshot`
    Refresh,
    /// Prepare + enqueue materialize → `WorktreeCreated`, then
    /// `SetupComplete` from the detached setup task
    CreateWorktree { project: String, branch: String },
    /// Re-run a failed worktree → `RetriedSetup`, then `SetupComplete`
    RetrySetup { project: String, worktree: String },
    /// Full archive sequence → `WorktreeArchived`
    ArchiveWorktree { project: String, worktree: String },
    /// Drop an archived worktree's record → `WorktreeDeleted`
    DeleteWorktree { project: String, worktree: String },
    /// Remove a project and its allocations → `Snapshot`
    RemoveProject { project: String },
    /// PRs for one worktree's branch → `PrsFetched`
    FetchPrs {
        project: String,
        worktree: String,
        branch: String,
    },
    /// All open PRs of a project → `AllProjectPrsFetched`
    FetchAllPrs { project: String },
    /// One auto-scan round across all projects → `ClaudePrsScanned`
    ScanClaudePrs { manual: bool },
    /// `git status --porcelain` summary → `GitStatusFetched`
    FetchGitStatus { project: String, worktree: String },
    /// Start a tunnel on the worktree's first port → `TunnelStarted`
    StartTunnel {
        project: String,
        worktree: String,
        mode: TunnelMode,
    },
    /// Stop a running tunnel → `TunnelStopped`
    StopTunnel {
        project: String,
        worktree: String,
        pid: u32,
    },
    /// Query the release feed → `UpdateChecked`
    CheckUpdate,
    /// Stat the config file → `ConfigStat`
    StatConfigFile,
    /// `store.reload()` then read → `Snapshot`
    ReloadConfig,
    /// Open the worktree in the user's editor → `Snapshot` (no visible
    /// outcome beyond a refreshed view)
    OpenEditor { project: String, worktree: String },
    /// Open a PR url in the browser → `Snapshot`
    OpenUrl { url: String },
    /// Sleep, then deliver `Tick(StatusTimeout(epoch))`
    ScheduleStatusTimeout { epoch: u64, after_ms: u64 },
    /// Terminate the loop. Resolves to nothing.
    Exit(ExitMode),
}
