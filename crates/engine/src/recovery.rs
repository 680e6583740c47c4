// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup reconciliation of interrupted state.
//!
//! Runs once before the UI accepts input. In-flight setup states mark a
//! crash mid-create and become `Failed` so the user can retry; interrupted
//! archives drop back to idle (the user re-triggers); tunnel records whose
//! process is gone are cleared.

use conductor_core::{ArchiveStatus, Error, SetupStatus};
use conductor_store::Store;
use std::collections::HashSet;
use tracing::info;

/// What recovery touched, for the startup status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Worktrees whose setup or archive status was reset
    pub worktrees_reset: usize,
    /// Tunnel records cleared because their PID is no longer alive
    pub tunnels_cleared: usize,
}

/// Reconcile the document against reality. `live_tunnel_pids` comes from
/// the tunnel subsystem's PID files.
pub fn recover(store: &Store, live_tunnel_pids: &HashSet<u32>) -> Result<RecoveryReport, Error> {
    let report = store.batch_mutate(|doc| {
        let mut report = RecoveryReport::default();
        for project in doc.projects.values_mut() {
            for wt in project.worktrees.values_mut() {
                let mut touched = false;
                if wt.setup_status.is_in_flight() {
                    wt.setup_status = SetupStatus::Failed;
                    touched = true;
                }
                if wt.archive_status == ArchiveStatus::Running {
                    wt.archive_status = ArchiveStatus::None;
                    touched = true;
                }
                if touched {
                    report.worktrees_reset += 1;
                }

                let stale = wt
                    .tunnel
                    .as_ref()
                    .is_some_and(|t| t.active && !live_tunnel_pids.contains(&t.pid));
                if stale {
                    wt.tunnel = None;
                    report.tunnels_cleared += 1;
                }
            }
        }
        Ok(report)
    })?;

    if report != RecoveryReport::default() {
        info!(
            worktrees_reset = report.worktrees_reset,
            tunnels_cleared = report.tunnels_cleared,
            "recovered interrupted state"
        );
    }
    Ok(report)
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
