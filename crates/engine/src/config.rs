// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project configuration file.
//!
//! A project may carry an optional `conductor.json` at its root declaring
//! inline lifecycle scripts and port labels. Script files under
//! `.conductor-scripts/` take precedence over inline definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Optional `<project>/conductor.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    /// Inline scripts by name (`setup`, `run`, `archive`)
    pub scripts: BTreeMap<String, String>,
    /// Label → index into the worktree's port range. Only labels declared
    /// here produce `CONDUCTOR_PORT_<LABEL>` variables.
    pub port_labels: BTreeMap<String, u16>,
}

/// What the setup runner should execute for a lifecycle hook.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedScript {
    /// Executable script file under `.conductor-scripts/`
    File(PathBuf),
    /// Inline command from `conductor.json`
    Inline(String),
}

impl ProjectConfig {
    /// Load the project config, or defaults when the file is absent.
    ///
    /// A malformed file is reported as an error: silently ignoring it would
    /// run worktrees without the setup the user wrote.
    pub fn load(project_path: &Path) -> Result<Self, conductor_core::Error> {
        let path = project_path.join("conductor.json");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| conductor_core::Error::Io {
            detail: format!("{}: {e}", path.display()),
        })
    }

    /// Resolve a lifecycle script: `.conductor-scripts/<name>.sh` wins,
    /// then the inline `scripts` entry. `None` when the project declares
    /// neither.
    pub fn resolve_script(&self, project_path: &Path, name: &str) -> Option<ResolvedScript> {
        let file = project_path
            .join(".conductor-scripts")
            .join(format!("{name}.sh"));
        if file.is_file() {
            return Some(ResolvedScript::File(file));
        }
        self.scripts
            .get(name)
            .map(|cmd| ResolvedScript::Inline(cmd.clone()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
