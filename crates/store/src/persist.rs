// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whole-document JSON persistence.
//!
//! Writes are atomic (write to `.tmp`, fsync, rename) so a crash mid-save
//! never corrupts the document. A corrupt file on load is rotated to a
//! `.bak` so startup can proceed with a fresh document instead of failing.

use crate::migration::MigrationRegistry;
use conductor_core::{Document, CURRENT_VERSION};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors from document load/save.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported document version {found} (current is {current})")]
    BadVersion { found: u32, current: u32 },
}

/// Conductor's state directory: `$CONDUCTOR_HOME`, else `<home>/.conductor`.
pub fn conductor_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CONDUCTOR_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".conductor")
}

/// Path of the persisted document inside a conductor dir.
pub fn config_path(conductor_dir: &Path) -> PathBuf {
    conductor_dir.join("conductor.json")
}

/// Abstracts the final file write for testability.
///
/// The save worker goes through this trait so tests can count writes and
/// inject failures without touching a real filesystem.
pub trait DocumentWriter: Send + Sync + 'static {
    fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;
}

/// Production writer: atomic replace with fsync.
#[derive(Debug, Clone, Default)]
pub struct FsDocumentWriter;

impl DocumentWriter for FsDocumentWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)
    }
}

/// Serialize a document for disk. Pretty-printed: the file doubles as the
/// user-visible record of Conductor's state.
pub fn encode_document(doc: &Document) -> Result<Vec<u8>, PersistError> {
    let mut bytes = serde_json::to_vec_pretty(doc)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Load the document, or a fresh default when no file exists.
///
/// Older versions are migrated by monotonic steps before typed
/// deserialization. A file that cannot be parsed at all is rotated to a
/// `.bak` (up to three kept) and replaced with a default document.
pub fn load_document(path: &Path) -> Result<Document, PersistError> {
    let content = match fs::read(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
        Err(e) => return Err(e.into()),
    };

    let value: serde_json::Value = match serde_json::from_slice(&content) {
        Ok(v) => v,
        Err(e) => {
            let bak = rotate_bak_path(path);
            warn!(
                error = %e,
                path = %path.display(),
                bak = %bak.display(),
                "corrupt document, moving to .bak and starting fresh",
            );
            fs::rename(path, &bak)?;
            return Ok(Document::new());
        }
    };

    let migrated = MigrationRegistry::new().migrate_to(value, CURRENT_VERSION)?;
    Ok(serde_json::from_value(migrated)?)
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
