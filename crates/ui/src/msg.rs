// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messages consumed by the reducer.
//!
//! Every message carries an outcome, never a request: by the time the
//! reducer sees one, the I/O already happened (or failed). Store and
//! engine outcomes carry `Result<(), Error>` so the reducer can route
//! success and failure without re-reading anything.

use conductor_core::{Document, Error, PrInfo};

/// Renderer-agnostic key events. The terminal collaborator translates its
/// own key codes into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Esc,
    Backspace,
    Char(char),
}

/// Periodic ticker kinds. The driver owns the timers; the reducer only
/// reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Spinner,
    ClaudePrScan,
    UpdateCheck,
    ConfigWatch,
    /// One-shot scheduled when a status was set; the payload is the status
    /// epoch so a newer message is never clobbered.
    StatusTimeout(u64),
}

/// Everything that can reach the reducer.
#[derive(Debug)]
pub enum Message {
    // ── Input ────────────────────────────────────────────────────────────
    Key(Key),
    /// Scroll delta from the mouse wheel (negative is up)
    MouseScroll(i32),
    Resize { width: u16, height: u16 },
    Tick(TickKind),

    // ── Store outcomes ───────────────────────────────────────────────────
    /// Fresh deep copy of the document after any mutation or reload
    Snapshot(Document),
    WorktreeCreated {
        project: String,
        worktree: String,
        result: Result<(), Error>,
    },
    SetupComplete {
        project: String,
        worktree: String,
        result: Result<(), Error>,
    },
    WorktreeArchived {
        project: String,
        worktree: String,
        result: Result<(), Error>,
    },
    WorktreeDeleted {
        project: String,
        worktree: String,
        result: Result<(), Error>,
    },
    RetriedSetup {
        project: String,
        worktree: String,
        result: Result<(), Error>,
    },

    // ── External outcomes ────────────────────────────────────────────────
    PrsFetched {
        project: String,
        worktree: String,
        result: Result<Vec<PrInfo>, String>,
    },
    AllProjectPrsFetched {
        project: String,
        result: Result<Vec<PrInfo>, String>,
    },
    TunnelStarted {
        project: String,
        worktree: String,
        result: Result<String, String>,
    },
    TunnelStopped {
        project: String,
        worktree: String,
        result: Result<(), String>,
    },
    TunnelsRestored {
        count: usize,
    },
    GitStatusFetched {
        project: String,
        worktree: String,
        summary: String,
    },
    /// Outcome of one Claude-PR auto-scan round
    ClaudePrsScanned {
        new: usize,
        existing: usize,
        errors: usize,
        /// Whether the user asked for this scan (errors surface only then)
        manual: bool,
    },
    UpdateChecked {
        available: bool,
        version: String,
    },
    /// Config file stat result from the watch ticker
    ConfigStat {
        modified_ms: u64,
        now_ms: u64,
    },
    StatesRecovered {
        count: usize,
    },
}
