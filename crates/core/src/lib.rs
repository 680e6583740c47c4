// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! conductor-core: data model for the Conductor worktree orchestrator

pub mod document;
pub mod error;
pub mod names;
pub mod project;
pub mod status;
pub mod time_fmt;
pub mod worktree;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use document::{Defaults, Document, PortOwner, SaveError, UpdateSettings, CURRENT_VERSION};
pub use error::{EntityKind, Error, Subsystem};
pub use names::pick_worktree_name;
pub use project::Project;
pub use status::{ArchiveStatus, PrState, SetupStatus, TunnelMode};
pub use time_fmt::{format_elapsed, parse_interval_secs};
pub use worktree::{PrInfo, TunnelState, Worktree};
