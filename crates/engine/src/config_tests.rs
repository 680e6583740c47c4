// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ProjectConfig::load(dir.path()).unwrap();
    assert_eq!(config, ProjectConfig::default());
}

#[test]
fn scripts_and_port_labels_parse() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("conductor.json"),
        r#"{
            "scripts": { "setup": "npm install", "archive": "rm -rf node_modules" },
            "portLabels": { "web": 0, "api": 1 }
        }"#,
    )
    .unwrap();

    let config = ProjectConfig::load(dir.path()).unwrap();
    assert_eq!(config.scripts["setup"], "npm install");
    assert_eq!(config.port_labels["web"], 0);
    assert_eq!(config.port_labels["api"], 1);
}

#[test]
fn malformed_file_is_an_error_not_a_silent_default() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("conductor.json"), "{oops").unwrap();
    assert!(ProjectConfig::load(dir.path()).is_err());
}

#[test]
fn script_file_wins_over_inline() {
    let dir = tempfile::tempdir().unwrap();
    let scripts_dir = dir.path().join(".conductor-scripts");
    fs::create_dir_all(&scripts_dir).unwrap();
    fs::write(scripts_dir.join("setup.sh"), "echo from file").unwrap();

    let mut config = ProjectConfig::default();
    config
        .scripts
        .insert("setup".to_string(), "echo inline".to_string());

    match config.resolve_script(dir.path(), "setup") {
        Some(ResolvedScript::File(path)) => assert!(path.ends_with(".conductor-scripts/setup.sh")),
        other => panic!("expected file script, got {other:?}"),
    }
}

#[test]
fn inline_used_when_no_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ProjectConfig::default();
    config
        .scripts
        .insert("archive".to_string(), "make clean".to_string());

    assert_eq!(
        config.resolve_script(dir.path(), "archive"),
        Some(ResolvedScript::Inline("make clean".to_string()))
    );
    assert_eq!(config.resolve_script(dir.path(), "setup"), None);
}
