// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted document: the whole of Conductor's state.
//!
//! Serialized as a single JSON file at `<conductor-dir>/conductor.json`.
//! Writes are whole-document replacements; unknown keys at every level are
//! preserved across load/save round trips via flattened extra maps. Port
//! keys serialize as decimal strings because JSON object keys are strings.

use crate::error::{EntityKind, Error};
use crate::project::Project;
use crate::worktree::Worktree;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current on-disk schema version. Loaders migrate older files by monotonic
/// steps before typed deserialization.
pub const CURRENT_VERSION: u32 = 1;

/// Reverse index entry: which worktree owns a port, and the position of the
/// port within that worktree's range. Names only, never pointers, so the
/// index survives serialization trivially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOwner {
    pub project: String,
    pub worktree: String,
    pub index: u16,
}

/// Global defaults applied when a project does not override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    pub ports_per_worktree: u16,
    pub port_range_start: u16,
    pub port_range_end: u16,
    /// Opaque tunnel defaults and any future keys
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            ports_per_worktree: 2,
            port_range_start: 3100,
            port_range_end: 3999,
            extra: serde_json::Map::new(),
        }
    }
}

/// Update checker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    pub auto_check: bool,
    pub auto_download: bool,
    /// Interval spelled as a short duration string, e.g. `"6h"`
    pub check_interval: String,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_version: String,
    #[serde(rename = "notifyInTUI")]
    pub notify_in_tui: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            auto_check: true,
            auto_download: true,
            check_interval: "6h".to_string(),
            channel: "stable".to_string(),
            last_check: None,
            last_version: String::new(),
            notify_in_tui: true,
            extra: serde_json::Map::new(),
        }
    }
}

/// Last failed save, kept on the store for the UI status bar. Transient,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveError {
    pub error: String,
    pub timestamp: DateTime<Utc>,
    pub retries: u32,
}

/// The entire persistent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: u32,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub updates: UpdateSettings,
    /// Port number → owning worktree. Every entry is reachable from exactly
    /// one non-archived worktree's `ports`.
    #[serde(default)]
    pub port_allocations: BTreeMap<u16, PortOwner>,
    #[serde(default)]
    pub projects: IndexMap<String, Project>,
    /// Unknown top-level keys preserved across load/save round trips
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// First-launch document.
    pub fn new() -> Self {
        Self {
            version: CURRENT_VERSION,
            defaults: Defaults::default(),
            updates: UpdateSettings::default(),
            port_allocations: BTreeMap::new(),
            projects: IndexMap::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn project(&self, name: &str) -> Result<&Project, Error> {
        self.projects
            .get(name)
            .ok_or_else(|| Error::not_found(EntityKind::Project, name))
    }

    pub fn project_mut(&mut self, name: &str) -> Result<&mut Project, Error> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| Error::not_found(EntityKind::Project, name))
    }

    pub fn worktree(&self, project: &str, name: &str) -> Result<&Worktree, Error> {
        self.project(project)?
            .worktrees
            .get(name)
            .ok_or_else(|| Error::not_found(EntityKind::Worktree, format!("{project}/{name}")))
    }

    pub fn worktree_mut(&mut self, project: &str, name: &str) -> Result<&mut Worktree, Error> {
        self.project_mut(project)?
            .worktrees
            .get_mut(name)
            .ok_or_else(|| Error::not_found(EntityKind::Worktree, format!("{project}/{name}")))
    }

    /// Effective port count for new worktrees in a project: the project
    /// override when non-zero, else the global default.
    pub fn ports_per_worktree(&self, project: &str) -> u16 {
        let override_count = self
            .projects
            .get(project)
            .map(|p| p.default_ports_per_worktree)
            .unwrap_or(0);
        if override_count > 0 {
            override_count
        } else {
            self.defaults.ports_per_worktree
        }
    }

    /// All worktrees across all projects, `(project, name, worktree)`.
    pub fn all_worktrees(&self) -> impl Iterator<Item = (&str, &str, &Worktree)> {
        self.projects.iter().flat_map(|(pname, project)| {
            project
                .worktrees
                .iter()
                .map(move |(wname, w)| (pname.as_str(), wname.as_str(), w))
        })
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
