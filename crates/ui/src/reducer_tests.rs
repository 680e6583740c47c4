// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::command::ExitMode;
use conductor_core::test_support::{doc_with_project, done_worktree, test_worktree};
use conductor_core::SetupStatus;

fn model() -> Model {
    let mut doc = doc_with_project();
    doc.projects["acme"]
        .worktrees
        .insert("tokyo".into(), done_worktree("feat/x"));
    let mut model = Model::new(doc);
    model.selected_project = Some("acme".to_string());
    model
}

fn key(model: &mut Model, c: char) -> Vec<Command> {
    update(model, Message::Key(Key::Char(c)))
}

// ── Navigation contract ──────────────────────────────────────────────────────

#[test]
fn enter_descends_into_worktrees_and_esc_returns_to_same_project() {
    let mut m = model();
    m.doc.projects.insert(
        "beta".into(),
        conductor_core::test_support::test_project("/repo/beta"),
    );
    update(&mut m, Message::Key(Key::Down));
    assert_eq!(m.projects.cursor, 1);

    update(&mut m, Message::Key(Key::Enter));
    assert_eq!(m.view, View::Worktrees);
    assert_eq!(m.selected_project.as_deref(), Some("beta"));

    update(&mut m, Message::Key(Key::Esc));
    assert_eq!(m.view, View::Projects);
    assert_eq!(m.projects.cursor, 1, "cursor restored to the project we came from");
}

#[test]
fn snapshot_swap_reclamps_cursors() {
    let mut m = model();
    for _ in 0..5 {
        update(&mut m, Message::Key(Key::Down));
    }
    // Snapshot with an empty project list
    update(&mut m, Message::Snapshot(conductor_core::Document::new()));
    assert_eq!(m.projects.cursor, 0);
    assert_eq!(m.projects.offset, 0);
}

// ── Status lifecycle ─────────────────────────────────────────────────────────

#[test]
fn store_outcome_sets_status_and_schedules_timeout() {
    let mut m = model();
    let cmds = update(
        &mut m,
        Message::SetupComplete {
            project: "acme".into(),
            worktree: "tokyo".into(),
            result: Ok(()),
        },
    );
    assert_eq!(cmds[0], Command::Refresh);
    let epoch = m.status.as_ref().unwrap().epoch;
    assert!(cmds.contains(&Command::ScheduleStatusTimeout {
        epoch,
        after_ms: crate::STATUS_TIMEOUT.as_millis() as u64,
    }));
    assert!(!m.status.as_ref().unwrap().is_error);
}

#[test]
fn error_status_gets_the_longer_timeout() {
    let mut m = model();
    let cmds = update(
        &mut m,
        Message::SetupComplete {
            project: "acme".into(),
            worktree: "tokyo".into(),
            result: Err(conductor_core::Error::Closed),
        },
    );
    let epoch = m.status.as_ref().unwrap().epoch;
    assert!(cmds.contains(&Command::ScheduleStatusTimeout {
        epoch,
        after_ms: crate::STATUS_TIMEOUT_ERROR.as_millis() as u64,
    }));
}

#[test]
fn stale_timeout_does_not_clobber_newer_status() {
    let mut m = model();
    update(
        &mut m,
        Message::GitStatusFetched {
            project: "acme".into(),
            worktree: "tokyo".into(),
            summary: "clean".into(),
        },
    );
    let first_epoch = m.status.as_ref().unwrap().epoch;
    update(
        &mut m,
        Message::GitStatusFetched {
            project: "acme".into(),
            worktree: "tokyo".into(),
            summary: "2 files changed".into(),
        },
    );

    update(&mut m, Message::Tick(TickKind::StatusTimeout(first_epoch)));
    assert!(
        m.status.is_some(),
        "stale timeout must not clear the newer message"
    );

    let current = m.status.as_ref().unwrap().epoch;
    update(&mut m, Message::Tick(TickKind::StatusTimeout(current)));
    assert!(m.status.is_none());
}

// ── Tickers ──────────────────────────────────────────────────────────────────

#[test]
fn spinner_tick_advances_no_commands() {
    let mut m = model();
    let cmds = update(&mut m, Message::Tick(TickKind::Spinner));
    assert!(cmds.is_empty());
    assert_eq!(m.spinner_frame, 1);
}

#[test]
fn claude_scan_tick_issues_a_silent_scan() {
    let mut m = model();
    let cmds = update(&mut m, Message::Tick(TickKind::ClaudePrScan));
    assert_eq!(cmds, vec![Command::ScanClaudePrs { manual: false }]);
}

#[test]
fn update_tick_respects_auto_check() {
    let mut m = model();
    assert_eq!(
        update(&mut m, Message::Tick(TickKind::UpdateCheck)),
        vec![Command::CheckUpdate]
    );
    m.doc.updates.auto_check = false;
    assert!(update(&mut m, Message::Tick(TickKind::UpdateCheck)).is_empty());
}

#[test]
fn config_watch_reloads_once_per_change_with_cooldown() {
    let mut m = model();
    // First stat just records the baseline
    assert!(update(&mut m, Message::ConfigStat { modified_ms: 1000, now_ms: 10_000 }).is_empty());

    // Newer mtime, cooldown satisfied → reload
    let cmds = update(&mut m, Message::ConfigStat { modified_ms: 2000, now_ms: 20_000 });
    assert_eq!(cmds[0], Command::ReloadConfig);

    // Another change immediately afterwards is inside the cooldown
    let cmds = update(&mut m, Message::ConfigStat { modified_ms: 3000, now_ms: 20_100 });
    assert!(cmds.is_empty());

    // Same change seen again after the cooldown → reload
    let cmds = update(&mut m, Message::ConfigStat { modified_ms: 3000, now_ms: 21_000 });
    assert_eq!(cmds[0], Command::ReloadConfig);

    // Unchanged mtime never reloads
    assert!(update(&mut m, Message::ConfigStat { modified_ms: 3000, now_ms: 30_000 }).is_empty());
}

// ── Worktree actions ─────────────────────────────────────────────────────────

#[test]
fn create_modal_collects_branch_and_emits_create() {
    let mut m = model();
    m.view = View::Worktrees;
    key(&mut m, 'c');
    assert_eq!(m.view, View::CreateWorktree);

    for c in "feat/y".chars() {
        update(&mut m, Message::Key(Key::Char(c)));
    }
    update(&mut m, Message::Key(Key::Backspace));
    update(&mut m, Message::Key(Key::Char('y')));
    let cmds = update(&mut m, Message::Key(Key::Enter));

    assert_eq!(m.view, View::Worktrees);
    assert!(cmds.contains(&Command::CreateWorktree {
        project: "acme".into(),
        branch: "feat/y".into(),
    }));
}

#[test]
fn archive_requires_literal_y() {
    let mut m = model();
    m.view = View::Worktrees;
    key(&mut m, 'a');
    assert_eq!(m.view, View::ConfirmDelete);

    // 'n' cancels
    let cmds = key(&mut m, 'n');
    assert!(cmds.is_empty());
    assert_eq!(m.view, View::Worktrees);
    assert!(m.confirm.is_none());

    // 'y' confirms
    key(&mut m, 'a');
    let cmds = key(&mut m, 'y');
    assert!(cmds.contains(&Command::ArchiveWorktree {
        project: "acme".into(),
        worktree: "tokyo".into(),
    }));
}

#[test]
fn archive_of_in_flight_worktree_is_refused() {
    let mut m = model();
    m.doc.projects["acme"]
        .worktrees
        .insert("paris".into(), test_worktree("feat/wip"));
    m.view = View::Worktrees;
    update(&mut m, Message::Key(Key::Down));
    let cmds = key(&mut m, 'a');
    assert_eq!(m.view, View::Worktrees, "no modal for an unarchivable worktree");
    assert!(m.status.as_ref().unwrap().is_error);
    assert!(!cmds.iter().any(|c| matches!(c, Command::ArchiveWorktree { .. })));
}

#[test]
fn retry_only_offered_for_failed_worktrees() {
    let mut m = model();
    m.view = View::Worktrees;
    assert!(key(&mut m, 'R').is_empty(), "Done worktree has nothing to retry");

    m.doc.projects["acme"]
        .worktrees
        .get_mut("tokyo")
        .unwrap()
        .setup_status = SetupStatus::Failed;
    let cmds = key(&mut m, 'R');
    assert_eq!(
        cmds,
        vec![Command::RetrySetup {
            project: "acme".into(),
            worktree: "tokyo".into(),
        }]
    );
}

#[test]
fn branch_collision_opens_rename_modal() {
    let mut m = model();
    let cmds = update(
        &mut m,
        Message::WorktreeCreated {
            project: "acme".into(),
            worktree: "paris".into(),
            result: Err(conductor_core::Error::BranchAlreadyCheckedOut {
                path: "/elsewhere/checkout".into(),
            }),
        },
    );
    assert_eq!(m.view, View::BranchRename);
    assert!(m.status.as_ref().unwrap().is_error);
    assert!(!cmds.is_empty());

    for c in "feat/renamed".chars() {
        update(&mut m, Message::Key(Key::Char(c)));
    }
    let cmds = update(&mut m, Message::Key(Key::Enter));
    assert!(cmds.contains(&Command::CreateWorktree {
        project: "acme".into(),
        branch: "feat/renamed".into(),
    }));
}

// ── Quit dialog ──────────────────────────────────────────────────────────────

#[test]
fn quit_dialog_offers_kill_all_and_detach() {
    let mut m = model();
    key(&mut m, 'q');
    assert_eq!(m.view, View::QuitDialog);

    let mut m2 = m.clone();
    assert_eq!(key(&mut m, 'k'), vec![Command::Exit(ExitMode::KillAll)]);
    assert!(m.exiting);
    assert_eq!(key(&mut m2, 'd'), vec![Command::Exit(ExitMode::Detach)]);
}

#[test]
fn esc_cancels_quit() {
    let mut m = model();
    key(&mut m, 'q');
    update(&mut m, Message::Key(Key::Esc));
    assert_eq!(m.view, View::Projects);
    assert!(!m.exiting);
}

// ── Scan outcomes ────────────────────────────────────────────────────────────

#[test]
fn silent_scan_round_with_nothing_new_stays_silent() {
    let mut m = model();
    let cmds = update(
        &mut m,
        Message::ClaudePrsScanned {
            new: 0,
            existing: 3,
            errors: 2,
            manual: false,
        },
    );
    assert!(cmds.is_empty());
    assert!(m.status.is_none());
}

#[test]
fn manual_scan_surfaces_errors() {
    let mut m = model();
    update(
        &mut m,
        Message::ClaudePrsScanned {
            new: 0,
            existing: 0,
            errors: 2,
            manual: true,
        },
    );
    assert!(m.status.as_ref().unwrap().is_error);
}

#[test]
fn new_worktrees_from_scan_refresh_the_view() {
    let mut m = model();
    let cmds = update(
        &mut m,
        Message::ClaudePrsScanned {
            new: 2,
            existing: 1,
            errors: 0,
            manual: false,
        },
    );
    assert_eq!(cmds[0], Command::Refresh);
}

// ── Recovery and updates ─────────────────────────────────────────────────────

#[test]
fn recovery_outcome_is_surfaced_once() {
    let mut m = model();
    update(&mut m, Message::StatesRecovered { count: 2 });
    assert_eq!(
        m.status.as_ref().unwrap().text,
        "recovered 2 interrupted worktree(s)"
    );
    let cmds = update(&mut m, Message::StatesRecovered { count: 0 });
    assert!(cmds.is_empty());
}

#[test]
fn update_check_records_available_version() {
    let mut m = model();
    update(
        &mut m,
        Message::UpdateChecked {
            available: true,
            version: "1.4.0".into(),
        },
    );
    assert_eq!(m.update_available.as_deref(), Some("1.4.0"));
}
