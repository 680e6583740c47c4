// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain error kinds shared across the workspace.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// What kind of entity a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Worktree,
    Branch,
    Pr,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Project => write!(f, "project"),
            EntityKind::Worktree => write!(f, "worktree"),
            EntityKind::Branch => write!(f, "branch"),
            EntityKind::Pr => write!(f, "pull request"),
        }
    }
}

/// Which external collaborator produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Git,
    Github,
    Tunnel,
    Script,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subsystem::Git => write!(f, "git"),
            Subsystem::Github => write!(f, "github"),
            Subsystem::Tunnel => write!(f, "tunnel"),
            Subsystem::Script => write!(f, "script"),
        }
    }
}

/// Errors surfaced by the store and the lifecycle engine.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },

    #[error("{kind} already exists: {name}")]
    Duplicate { kind: EntityKind, name: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("no free window of {requested} consecutive ports")]
    NoFreePortWindow { requested: u16 },

    #[error("branch already checked out at {}", path.display())]
    BranchAlreadyCheckedOut { path: PathBuf },

    #[error("{subsystem} error: {detail}")]
    External { subsystem: Subsystem, detail: String },

    #[error("io error: {detail}")]
    Io { detail: String },

    #[error("save failed after {retries} retries")]
    Persist { retries: u32 },

    #[error("store is closed")]
    Closed,
}

impl Error {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn duplicate(kind: EntityKind, name: impl Into<String>) -> Self {
        Error::Duplicate {
            kind,
            name: name.into(),
        }
    }

    pub fn external(subsystem: Subsystem, detail: impl Into<String>) -> Self {
        Error::External {
            subsystem,
            detail: detail.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io {
            detail: e.to_string(),
        }
    }
}
