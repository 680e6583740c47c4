// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! conductor-ui: the event-driven core of the terminal interface.
//!
//! A pure reducer over `(Model, Message)` that returns commands — data
//! descriptions of I/O for the runtime driver to execute. The reducer
//! never blocks and never touches the store, the filesystem, or a
//! subprocess; everything it knows arrives as a [`Message`], everything it
//! wants done leaves as a [`Command`]. The terminal renderer is a separate
//! collaborator that only reads [`Model`].

pub mod command;
pub mod model;
pub mod msg;
pub mod nav;
pub mod reducer;
pub mod scan;

pub use command::{Command, ExitMode};
pub use model::{Confirm, ConfirmKind, CursorState, Model, StatusMessage, View};
pub use msg::{Key, Message, TickKind};
pub use reducer::update;
pub use scan::plan_claude_worktrees;

use std::time::Duration;

/// Spinner advance cadence.
pub const SPINNER_INTERVAL: Duration = Duration::from_millis(100);
/// Claude-PR auto-scan cadence.
pub const CLAUDE_PR_SCAN_INTERVAL: Duration = Duration::from_secs(30);
/// Update check cadence (gated on `updates.auto_check`).
pub const UPDATE_CHECK_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
/// Config file mtime poll cadence.
pub const CONFIG_WATCH_INTERVAL: Duration = Duration::from_secs(5);
/// Minimum gap between config reloads.
pub const CONFIG_RELOAD_COOLDOWN_MS: u64 = 500;
/// How long a status message lives.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);
/// Error statuses stay a little longer.
pub const STATUS_TIMEOUT_ERROR: Duration = Duration::from_secs(8);
/// Status history depth.
pub const STATUS_HISTORY_CAP: usize = 50;
