// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Release update check via the GitHub CLI.
//!
//! Queries the latest release tag, compares it against the running
//! version, and records the outcome on the store. Failures degrade to
//! "no update": the checker must never surface noise from a periodic tick.

use conductor_store::Store;
use std::time::Duration;
use tracing::{debug, warn};

const RELEASE_REPO: &str = "KudcraftsHQ/conductor";

/// Returns `(update_available, latest_version)`.
pub async fn check(store: &Store) -> (bool, String) {
    let latest = match fetch_latest_version().await {
        Some(v) => v,
        None => return (false, String::new()),
    };

    if let Err(e) = store.record_update_check(&latest) {
        warn!(error = %e, "failed to record update check");
    }

    let current = env!("CARGO_PKG_VERSION");
    let available = is_newer(&latest, current);
    debug!(current, latest = %latest, available, "update check");
    (available, latest)
}

async fn fetch_latest_version() -> Option<String> {
    let mut cmd = tokio::process::Command::new("gh");
    cmd.args([
        "release",
        "view",
        "--repo",
        RELEASE_REPO,
        "--json",
        "tagName",
        "--jq",
        ".tagName",
    ]);
    let output = conductor_adapters::run_with_timeout(cmd, Duration::from_secs(30), "gh release")
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if tag.is_empty() {
        None
    } else {
        Some(tag.trim_start_matches('v').to_string())
    }
}

/// Numeric dotted-version comparison; anything unparseable is not newer.
fn is_newer(candidate: &str, current: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    };
    let (c, cur) = (parse(candidate), parse(current));
    c > cur
}
