// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document migration system for schema evolution.
//!
//! Migrations transform document JSON from one version to the next.
//! The registry chains migrations by monotonic steps to reach the current
//! version. Unknown keys are left untouched so forward-compatible data
//! survives an upgrade.

use crate::persist::PersistError;
use serde_json::Value;

/// A migration from one document version to the next.
pub trait Migration: Send + Sync {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, doc: &mut Value) -> Result<(), PersistError>;
}

/// Registry of migrations for upgrading documents.
pub struct MigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    /// Create a new registry with all known migrations.
    pub fn new() -> Self {
        Self {
            migrations: vec![Box::new(V0ToV1)],
        }
    }

    /// Migrate a document to the target version.
    pub fn migrate_to(&self, mut doc: Value, target: u32) -> Result<Value, PersistError> {
        let current = doc.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

        if current == target {
            return Ok(doc);
        }
        if current > target {
            return Err(PersistError::BadVersion {
                found: current,
                current: target,
            });
        }

        let mut version = current;
        while version < target {
            let migration = self
                .migrations
                .iter()
                .find(|m| m.source_version() == version)
                .ok_or(PersistError::BadVersion {
                    found: version,
                    current: target,
                })?;

            migration.migrate(&mut doc)?;
            version = migration.target_version();

            if let Some(obj) = doc.as_object_mut() {
                obj.insert("version".into(), version.into());
            }
        }
        Ok(doc)
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-versioned files: inject the sections v1 made mandatory.
struct V0ToV1;

impl Migration for V0ToV1 {
    fn source_version(&self) -> u32 {
        0
    }

    fn target_version(&self) -> u32 {
        1
    }

    fn migrate(&self, doc: &mut Value) -> Result<(), PersistError> {
        let Some(obj) = doc.as_object_mut() else {
            return Ok(());
        };
        obj.entry("defaults").or_insert_with(|| {
            serde_json::json!({
                "portsPerWorktree": 2,
                "portRangeStart": 3100,
                "portRangeEnd": 3999,
            })
        });
        obj.entry("updates").or_insert_with(|| {
            serde_json::json!({
                "autoCheck": true,
                "autoDownload": true,
                "checkInterval": "6h",
                "channel": "stable",
                "lastVersion": "",
                "notifyInTUI": true,
            })
        });
        obj.entry("portAllocations")
            .or_insert_with(|| serde_json::json!({}));
        obj.entry("projects").or_insert_with(|| serde_json::json!({}));
        Ok(())
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
