// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! conductor-adapters: thin wrappers around external collaborators.
//!
//! Everything here is an I/O shim behind a trait: the git CLI, the GitHub
//! client, the tunnel CLI with its PID files, and the IDE/terminal openers.
//! The interesting design lives in the engine and the store; adapters only
//! run subprocesses and translate their output.

pub mod git;
pub mod github;
pub mod open;
pub mod subprocess;
pub mod tunnel;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use git::{CliGit, GitAdapter, GitError};
pub use github::{GhCli, GithubClient, GithubError};
pub use open::Openers;
pub use subprocess::run_with_timeout;
pub use tunnel::{CloudflaredTunnel, TunnelAdapter, TunnelError, TunnelHandle};
