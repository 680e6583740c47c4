// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment contract for per-worktree scripts.
//!
//! Scripts inherit the OS environment plus the `CONDUCTOR_*` variables
//! documented here. `PORT` mirrors `CONDUCTOR_PORT` because most dev
//! servers already understand it.

use std::collections::BTreeMap;

/// Build the injected environment for a script run.
///
/// - `CONDUCTOR_PROJECT_NAME`, `CONDUCTOR_WORKTREE_PATH`
/// - `CONDUCTOR_PORT` and `PORT`: first allocated port
/// - `CONDUCTOR_PORT_0`, `CONDUCTOR_PORT_1`, …: each port in order
/// - `CONDUCTOR_PORTS`: comma-separated list
/// - `CONDUCTOR_PORT_<LABEL>`: declared labels only; a label whose index
///   is out of range for this worktree produces nothing
pub fn script_env(
    project_name: &str,
    worktree_path: &str,
    ports: &[u16],
    port_labels: &BTreeMap<String, u16>,
) -> Vec<(String, String)> {
    let mut env = vec![
        (
            "CONDUCTOR_PROJECT_NAME".to_string(),
            project_name.to_string(),
        ),
        (
            "CONDUCTOR_WORKTREE_PATH".to_string(),
            worktree_path.to_string(),
        ),
    ];

    if let Some(first) = ports.first() {
        env.push(("CONDUCTOR_PORT".to_string(), first.to_string()));
        env.push(("PORT".to_string(), first.to_string()));
    }

    for (i, port) in ports.iter().enumerate() {
        env.push((format!("CONDUCTOR_PORT_{i}"), port.to_string()));
    }

    if !ports.is_empty() {
        let list = ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");
        env.push(("CONDUCTOR_PORTS".to_string(), list));
    }

    for (label, index) in port_labels {
        if let Some(port) = ports.get(usize::from(*index)) {
            env.push((
                format!("CONDUCTOR_PORT_{}", label.to_uppercase()),
                port.to_string(),
            ));
        }
    }

    env
}

#[cfg(test)]
#[path = "script_env_tests.rs"]
mod tests;
