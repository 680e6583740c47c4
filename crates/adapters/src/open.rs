// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IDE and terminal openers.
//!
//! Fire-and-forget spawns with the worktree as the working directory. The
//! binaries come from the environment (`CONDUCTOR_EDITOR` / `EDITOR`,
//! `CONDUCTOR_TERMINAL`) so the core never hardcodes a vendor.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::warn;

/// Spawns editor/terminal processes against worktree paths.
#[derive(Debug, Clone, Default)]
pub struct Openers;

impl Openers {
    /// Open the user's editor with the worktree as its project directory.
    pub fn open_editor(&self, worktree_path: &Path) {
        let editor = std::env::var("CONDUCTOR_EDITOR")
            .or_else(|_| std::env::var("EDITOR"))
            .unwrap_or_else(|_| "code".to_string());
        self.spawn_detached(&editor, worktree_path);
    }

    /// Open a terminal window at the worktree.
    pub fn open_terminal(&self, worktree_path: &Path) {
        let terminal =
            std::env::var("CONDUCTOR_TERMINAL").unwrap_or_else(|_| "x-terminal-emulator".to_string());
        self.spawn_detached(&terminal, worktree_path);
    }

    fn spawn_detached(&self, binary: &str, cwd: &Path) {
        let result = Command::new(binary)
            .arg(cwd)
            .current_dir(cwd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match result {
            Ok(mut child) => {
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
            }
            Err(e) => warn!(binary, error = %e, "opener failed to spawn"),
        }
    }
}
