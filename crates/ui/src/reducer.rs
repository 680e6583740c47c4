// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reducer: pure `(Model, Message) → commands`.
//!
//! Single-threaded, never blocks, performs no I/O. Key handling here is
//! the core navigation contract only; the renderer may layer richer key
//! maps on top by translating into these [`Key`] values.

use crate::command::{Command, ExitMode};
use crate::model::{Confirm, ConfirmKind, Model, View};
use crate::msg::{Key, Message, TickKind};
use crate::{
    CONFIG_RELOAD_COOLDOWN_MS, STATUS_TIMEOUT, STATUS_TIMEOUT_ERROR,
};
use conductor_core::{Error, SetupStatus, TunnelMode};

/// Apply one message. Returns the commands the driver must execute.
pub fn update(model: &mut Model, msg: Message) -> Vec<Command> {
    match msg {
        Message::Key(key) => on_key(model, key),
        Message::MouseScroll(delta) => {
            scroll_active_list(model, delta as isize);
            Vec::new()
        }
        Message::Resize { width, height } => {
            model.width = width;
            model.height = height;
            model.clamp_cursors();
            Vec::new()
        }
        Message::Tick(kind) => on_tick(model, kind),
        Message::Snapshot(doc) => {
            model.doc = doc;
            model.clamp_cursors();
            Vec::new()
        }

        // ── Store outcomes ───────────────────────────────────────────────
        Message::WorktreeCreated {
            project,
            worktree,
            result,
        } => match result {
            Ok(()) => with_refresh(status(model, format!("{project}/{worktree}: worktree ready, running setup"), false)),
            Err(Error::BranchAlreadyCheckedOut { path }) => {
                model.selected_project = Some(project);
                model.branch_input.clear();
                model.push_view(View::BranchRename);
                status(
                    model,
                    format!("branch already checked out at {}; pick a new branch name", path.display()),
                    true,
                )
            }
            Err(e) => with_refresh(status(model, format!("{project}/{worktree}: {e}"), true)),
        },
        Message::SetupComplete {
            project,
            worktree,
            result,
        } => match result {
            Ok(()) => with_refresh(status(model, format!("{project}/{worktree}: setup done"), false)),
            Err(e) => with_refresh(status(
                model,
                format!("{project}/{worktree}: setup failed ({e}); press R to retry"),
                true,
            )),
        },
        Message::WorktreeArchived {
            project,
            worktree,
            result,
        } => match result {
            Ok(()) => with_refresh(status(model, format!("{project}/{worktree}: archived"), false)),
            Err(e) => with_refresh(status(model, format!("{project}/{worktree}: archive failed ({e})"), true)),
        },
        Message::WorktreeDeleted {
            project,
            worktree,
            result,
        } => match result {
            Ok(()) => with_refresh(status(model, format!("{project}/{worktree}: deleted"), false)),
            Err(e) => with_refresh(status(model, format!("{project}/{worktree}: delete failed ({e})"), true)),
        },
        Message::RetriedSetup {
            project,
            worktree,
            result,
        } => match result {
            Ok(()) => with_refresh(status(model, format!("{project}/{worktree}: retrying"), false)),
            Err(e) => with_refresh(status(model, format!("{project}/{worktree}: retry failed ({e})"), true)),
        },

        // ── External outcomes ────────────────────────────────────────────
        Message::PrsFetched {
            project,
            worktree,
            result,
        } => match result {
            Ok(prs) => with_refresh(status(
                model,
                format!("{project}/{worktree}: {} PR(s)", prs.len()),
                false,
            )),
            Err(e) => status(model, format!("{project}/{worktree}: PR fetch failed ({e})"), true),
        },
        Message::AllProjectPrsFetched { project, result } => match result {
            Ok(_) => vec![Command::Refresh],
            Err(e) => status(model, format!("{project}: PR fetch failed ({e})"), true),
        },
        Message::TunnelStarted {
            project,
            worktree,
            result,
        } => match result {
            Ok(url) => with_refresh(status(model, format!("{project}/{worktree}: tunnel at {url}"), false)),
            Err(e) => status(model, format!("{project}/{worktree}: tunnel failed ({e})"), true),
        },
        Message::TunnelStopped {
            project,
            worktree,
            result,
        } => match result {
            Ok(()) => with_refresh(status(model, format!("{project}/{worktree}: tunnel stopped"), false)),
            Err(e) => status(model, format!("{project}/{worktree}: tunnel stop failed ({e})"), true),
        },
        Message::TunnelsRestored { count } => {
            if count > 0 {
                with_refresh(status(model, format!("reattached {count} running tunnel(s)"), false))
            } else {
                Vec::new()
            }
        }
        Message::GitStatusFetched {
            project,
            worktree,
            summary,
        } => status(model, format!("{project}/{worktree}: {summary}"), false),
        Message::ClaudePrsScanned {
            new,
            existing: _,
            errors,
            manual,
        } => {
            if new > 0 {
                with_refresh(status(model, format!("materialized {new} claude PR worktree(s)"), false))
            } else if manual && errors > 0 {
                status(model, format!("claude PR scan hit {errors} error(s)"), true)
            } else if manual {
                status(model, "no new claude PRs".to_string(), false)
            } else {
                // Periodic rounds stay silent
                Vec::new()
            }
        }
        Message::UpdateChecked { available, version } => {
            if available {
                model.update_available = Some(version.clone());
                status(model, format!("update {version} available"), false)
            } else {
                model.update_available = None;
                Vec::new()
            }
        }
        Message::ConfigStat {
            modified_ms,
            now_ms,
        } => on_config_stat(model, modified_ms, now_ms),
        Message::StatesRecovered { count } => {
            if count > 0 {
                with_refresh(status(
                    model,
                    format!("recovered {count} interrupted worktree(s)"),
                    false,
                ))
            } else {
                Vec::new()
            }
        }
    }
}

// ── Tickers ──────────────────────────────────────────────────────────────────

fn on_tick(model: &mut Model, kind: TickKind) -> Vec<Command> {
    match kind {
        TickKind::Spinner => {
            model.spinner_frame = model.spinner_frame.wrapping_add(1);
            Vec::new()
        }
        TickKind::ClaudePrScan => vec![Command::ScanClaudePrs { manual: false }],
        TickKind::UpdateCheck => {
            if model.doc.updates.auto_check {
                vec![Command::CheckUpdate]
            } else {
                Vec::new()
            }
        }
        TickKind::ConfigWatch => vec![Command::StatConfigFile],
        TickKind::StatusTimeout(epoch) => {
            // Clear only if no newer status replaced this one
            if model.status.as_ref().map(|s| s.epoch) == Some(epoch) {
                model.status = None;
            }
            Vec::new()
        }
    }
}

fn on_config_stat(model: &mut Model, modified_ms: u64, now_ms: u64) -> Vec<Command> {
    match model.last_config_mtime_ms {
        None => {
            model.last_config_mtime_ms = Some(modified_ms);
            Vec::new()
        }
        Some(last)
            if modified_ms > last
                && now_ms.saturating_sub(model.last_reload_ms) >= CONFIG_RELOAD_COOLDOWN_MS =>
        {
            model.last_config_mtime_ms = Some(modified_ms);
            model.last_reload_ms = now_ms;
            let mut cmds = vec![Command::ReloadConfig];
            cmds.extend(status(model, "config changed on disk, reloading".to_string(), false));
            cmds
        }
        // Changed but inside the cooldown: leave last_mtime alone so the
        // next poll picks it up
        _ => Vec::new(),
    }
}

// ── Keys ─────────────────────────────────────────────────────────────────────

fn on_key(model: &mut Model, key: Key) -> Vec<Command> {
    match model.view {
        View::Projects => on_projects_key(model, key),
        View::Worktrees => on_worktrees_key(model, key),
        View::Ports
        | View::AllPrs
        | View::Logs { .. }
        | View::Help
        | View::StatusHistory => on_browse_key(model, key),
        View::ArchivedList => on_archived_key(model, key),
        View::WorktreePrs => on_worktree_prs_key(model, key),
        View::QuitDialog => on_quit_key(model, key),
        View::CreateWorktree | View::BranchRename => on_branch_input_key(model, key),
        View::ConfirmDelete => on_confirm_key(model, key),
        View::TunnelModal => on_tunnel_key(model, key),
    }
}

fn on_projects_key(model: &mut Model, key: Key) -> Vec<Command> {
    let len = model.doc.projects.len();
    match key {
        Key::Up | Key::Char('k') => move_cursor(model, -1, len),
        Key::Down | Key::Char('j') => move_cursor(model, 1, len),
        Key::PageUp => page(model, -1, len),
        Key::PageDown => page(model, 1, len),
        Key::Home => home(model, len),
        Key::End => end(model, len),
        Key::Enter => {
            if let Some(name) = model.project_under_cursor().map(str::to_string) {
                model.selected_project = Some(name);
                model.push_view(View::Worktrees);
                model.clamp_cursors();
            }
            Vec::new()
        }
        Key::Char('D') => {
            if let Some(name) = model.project_under_cursor().map(str::to_string) {
                model.confirm = Some(Confirm {
                    kind: ConfirmKind::DeleteProject,
                    project: name,
                    worktree: String::new(),
                });
                model.push_view(View::ConfirmDelete);
            }
            Vec::new()
        }
        Key::Char('p') => {
            model.push_view(View::Ports);
            Vec::new()
        }
        Key::Char('P') => {
            model.push_view(View::AllPrs);
            model
                .doc
                .projects
                .keys()
                .map(|name| Command::FetchAllPrs {
                    project: name.clone(),
                })
                .collect()
        }
        Key::Char('s') => vec![Command::ScanClaudePrs { manual: true }],
        Key::Char('u') => vec![Command::CheckUpdate],
        Key::Char('H') => {
            model.push_view(View::StatusHistory);
            Vec::new()
        }
        Key::Char('?') => {
            model.push_view(View::Help);
            Vec::new()
        }
        Key::Char('q') => {
            model.push_view(View::QuitDialog);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn on_worktrees_key(model: &mut Model, key: Key) -> Vec<Command> {
    let len = model.active_worktrees().len();
    match key {
        Key::Up | Key::Char('k') => move_cursor(model, -1, len),
        Key::Down | Key::Char('j') => move_cursor(model, 1, len),
        Key::PageUp => page(model, -1, len),
        Key::PageDown => page(model, 1, len),
        Key::Home => home(model, len),
        Key::End => end(model, len),
        Key::Esc => {
            model.pop_view();
            Vec::new()
        }
        Key::Enter => {
            if let Some((name, _)) = model.worktree_under_cursor() {
                model.selected_worktree = Some(name);
                model.logs = Default::default();
                model.push_view(View::Logs { archive: false });
            }
            Vec::new()
        }
        Key::Char('c') => {
            model.branch_input.clear();
            model.push_view(View::CreateWorktree);
            Vec::new()
        }
        Key::Char('a') => {
            if let Some((name, wt)) = model.worktree_under_cursor() {
                if wt.can_archive() {
                    model.confirm = Some(Confirm {
                        kind: ConfirmKind::ArchiveWorktree,
                        project: model.selected_project.clone().unwrap_or_default(),
                        worktree: name,
                    });
                    model.push_view(View::ConfirmDelete);
                    return Vec::new();
                }
                return status(model, format!("{name} cannot be archived yet"), true);
            }
            Vec::new()
        }
        Key::Char('R') => {
            if let Some((name, wt)) = model.worktree_under_cursor() {
                if wt.setup_status == SetupStatus::Failed {
                    if let Some(project) = model.selected_project.clone() {
                        return vec![Command::RetrySetup {
                            project,
                            worktree: name,
                        }];
                    }
                }
            }
            Vec::new()
        }
        Key::Char('v') => {
            if let Some((name, wt)) = model.worktree_under_cursor() {
                model.selected_worktree = Some(name.clone());
                model.worktree_prs = Default::default();
                model.push_view(View::WorktreePrs);
                if let Some(project) = model.selected_project.clone() {
                    return vec![Command::FetchPrs {
                        project,
                        worktree: name,
                        branch: wt.branch,
                    }];
                }
            }
            Vec::new()
        }
        Key::Char('g') => {
            if let Some((name, _)) = model.worktree_under_cursor() {
                if let Some(project) = model.selected_project.clone() {
                    return vec![Command::FetchGitStatus {
                        project,
                        worktree: name,
                    }];
                }
            }
            Vec::new()
        }
        Key::Char('o') => {
            if let Some((name, _)) = model.worktree_under_cursor() {
                if let Some(project) = model.selected_project.clone() {
                    return vec![Command::OpenEditor {
                        project,
                        worktree: name,
                    }];
                }
            }
            Vec::new()
        }
        Key::Char('t') => {
            if model.worktree_under_cursor().is_some() {
                model.push_view(View::TunnelModal);
            }
            Vec::new()
        }
        Key::Char('A') => {
            model.archived = Default::default();
            model.push_view(View::ArchivedList);
            Vec::new()
        }
        Key::Char('L') => {
            if let Some((name, _)) = model.worktree_under_cursor() {
                model.selected_worktree = Some(name);
                model.logs = Default::default();
                model.push_view(View::Logs { archive: true });
            }
            Vec::new()
        }
        Key::Char('?') => {
            model.push_view(View::Help);
            Vec::new()
        }
        Key::Char('q') => {
            model.push_view(View::QuitDialog);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Read-only list views: navigation and Esc.
fn on_browse_key(model: &mut Model, key: Key) -> Vec<Command> {
    let len = active_list_len(model);
    match key {
        Key::Up | Key::Char('k') => move_cursor(model, -1, len),
        Key::Down | Key::Char('j') => move_cursor(model, 1, len),
        Key::PageUp => page(model, -1, len),
        Key::PageDown => page(model, 1, len),
        Key::Home => home(model, len),
        Key::End => end(model, len),
        Key::Esc | Key::Char('q') => {
            model.pop_view();
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn on_archived_key(model: &mut Model, key: Key) -> Vec<Command> {
    let len = model.archived_worktrees().len();
    match key {
        Key::Char('D') => {
            let name = model
                .archived_worktrees()
                .get(model.archived.cursor)
                .map(|(n, _)| n.to_string());
            if let Some(name) = name {
                model.confirm = Some(Confirm {
                    kind: ConfirmKind::DeleteWorktree,
                    project: model.selected_project.clone().unwrap_or_default(),
                    worktree: name,
                });
                model.push_view(View::ConfirmDelete);
            }
            Vec::new()
        }
        Key::Enter => {
            let name = model
                .archived_worktrees()
                .get(model.archived.cursor)
                .map(|(n, _)| n.to_string());
            if let Some(name) = name {
                model.selected_worktree = Some(name);
                model.logs = Default::default();
                model.push_view(View::Logs { archive: true });
            }
            Vec::new()
        }
        Key::Up | Key::Char('k') => move_cursor(model, -1, len),
        Key::Down | Key::Char('j') => move_cursor(model, 1, len),
        Key::Esc | Key::Char('q') => {
            model.pop_view();
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn on_worktree_prs_key(model: &mut Model, key: Key) -> Vec<Command> {
    let prs = model
        .selected_project
        .as_deref()
        .zip(model.selected_worktree.as_deref())
        .and_then(|(p, w)| model.doc.worktree(p, w).ok())
        .map(|wt| wt.prs.clone())
        .unwrap_or_default();
    match key {
        Key::Enter => prs
            .get(model.worktree_prs.cursor)
            .map(|pr| vec![Command::OpenUrl { url: pr.url.clone() }])
            .unwrap_or_default(),
        Key::Up | Key::Char('k') => move_cursor(model, -1, prs.len()),
        Key::Down | Key::Char('j') => move_cursor(model, 1, prs.len()),
        Key::Esc | Key::Char('q') => {
            model.pop_view();
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn on_quit_key(model: &mut Model, key: Key) -> Vec<Command> {
    match key {
        Key::Char('k') => {
            model.exiting = true;
            vec![Command::Exit(ExitMode::KillAll)]
        }
        Key::Char('d') | Key::Enter => {
            model.exiting = true;
            vec![Command::Exit(ExitMode::Detach)]
        }
        Key::Esc | Key::Char('q') => {
            model.pop_view();
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn on_branch_input_key(model: &mut Model, key: Key) -> Vec<Command> {
    match key {
        Key::Char(c) => {
            model.branch_input.push(c);
            Vec::new()
        }
        Key::Backspace => {
            model.branch_input.pop();
            Vec::new()
        }
        Key::Enter => {
            let branch = model.branch_input.trim().to_string();
            if branch.is_empty() {
                return Vec::new();
            }
            let Some(project) = model.selected_project.clone() else {
                return Vec::new();
            };
            model.branch_input.clear();
            model.pop_view();
            let mut cmds = vec![Command::CreateWorktree { project, branch }];
            cmds.extend(status(model, "creating worktree".to_string(), false));
            cmds
        }
        Key::Esc => {
            model.branch_input.clear();
            model.pop_view();
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn on_confirm_key(model: &mut Model, key: Key) -> Vec<Command> {
    match key {
        // Destructive actions require a literal `y`
        Key::Char('y') => {
            let Some(confirm) = model.confirm.take() else {
                model.pop_view();
                return Vec::new();
            };
            model.pop_view();
            match confirm.kind {
                ConfirmKind::ArchiveWorktree => {
                    let mut cmds = vec![Command::ArchiveWorktree {
                        project: confirm.project.clone(),
                        worktree: confirm.worktree.clone(),
                    }];
                    cmds.extend(status(
                        model,
                        format!("archiving {}/{}", confirm.project, confirm.worktree),
                        false,
                    ));
                    cmds
                }
                ConfirmKind::DeleteWorktree => vec![Command::DeleteWorktree {
                    project: confirm.project,
                    worktree: confirm.worktree,
                }],
                ConfirmKind::DeleteProject => vec![Command::RemoveProject {
                    project: confirm.project,
                }],
            }
        }
        _ => {
            // Anything else cancels
            model.confirm = None;
            model.pop_view();
            Vec::new()
        }
    }
}

fn on_tunnel_key(model: &mut Model, key: Key) -> Vec<Command> {
    let Some((worktree, wt)) = model.worktree_under_cursor() else {
        model.pop_view();
        return Vec::new();
    };
    let Some(project) = model.selected_project.clone() else {
        model.pop_view();
        return Vec::new();
    };
    match key {
        Key::Char('q') => {
            model.pop_view();
            vec![Command::StartTunnel {
                project,
                worktree,
                mode: TunnelMode::Quick,
            }]
        }
        Key::Char('n') => {
            model.pop_view();
            vec![Command::StartTunnel {
                project,
                worktree,
                mode: TunnelMode::Named,
            }]
        }
        Key::Char('x') => {
            model.pop_view();
            match wt.tunnel {
                Some(tunnel) if tunnel.active => vec![Command::StopTunnel {
                    project,
                    worktree,
                    pid: tunnel.pid,
                }],
                _ => status(model, format!("{worktree}: no running tunnel"), true),
            }
        }
        Key::Esc => {
            model.pop_view();
            Vec::new()
        }
        _ => Vec::new(),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Cursor state of the active view.
fn active_cursor(model: &mut Model) -> &mut crate::nav::CursorState {
    match model.view {
        View::Projects => &mut model.projects,
        View::Worktrees => &mut model.worktrees,
        View::Ports => &mut model.ports,
        View::AllPrs => &mut model.all_prs,
        View::WorktreePrs => &mut model.worktree_prs,
        View::ArchivedList => &mut model.archived,
        View::StatusHistory => &mut model.history,
        // Logs scroll; modals and Help fall back to the log cursor which
        // they never render
        _ => &mut model.logs,
    }
}

fn active_list_len(model: &Model) -> usize {
    match model.view {
        View::Projects => model.doc.projects.len(),
        View::Worktrees => model.active_worktrees().len(),
        View::Ports => model.doc.port_allocations.len(),
        View::AllPrs => model
            .doc
            .all_worktrees()
            .map(|(_, _, w)| w.prs.len())
            .sum(),
        View::WorktreePrs => model
            .selected_project
            .as_deref()
            .zip(model.selected_worktree.as_deref())
            .and_then(|(p, w)| model.doc.worktree(p, w).ok())
            .map(|wt| wt.prs.len())
            .unwrap_or(0),
        View::ArchivedList => model.archived_worktrees().len(),
        View::StatusHistory => model.status_history.len(),
        // Logs length is owned by the driver (log ring); scroll freely
        // within the ring's maximum depth
        View::Logs { .. } => 100_000,
        _ => 0,
    }
}

fn move_cursor(model: &mut Model, delta: isize, len: usize) -> Vec<Command> {
    let visible = model.visible_rows();
    active_cursor(model).move_by(delta, len, visible);
    Vec::new()
}

fn page(model: &mut Model, direction: isize, len: usize) -> Vec<Command> {
    let visible = model.visible_rows() as isize;
    move_cursor(model, direction * visible, len)
}

fn home(model: &mut Model, len: usize) -> Vec<Command> {
    let visible = model.visible_rows();
    active_cursor(model).place(0, len, visible);
    Vec::new()
}

fn end(model: &mut Model, len: usize) -> Vec<Command> {
    let visible = model.visible_rows();
    if len > 0 {
        active_cursor(model).place(len - 1, len, visible);
    }
    Vec::new()
}

fn scroll_active_list(model: &mut Model, delta: isize) {
    let len = active_list_len(model);
    let visible = model.visible_rows();
    active_cursor(model).move_by(delta, len, visible);
}

/// Set a status message and schedule its timeout tick.
fn status(model: &mut Model, text: String, is_error: bool) -> Vec<Command> {
    let epoch = model.set_status(text, is_error);
    let after = if is_error {
        STATUS_TIMEOUT_ERROR
    } else {
        STATUS_TIMEOUT
    };
    vec![Command::ScheduleStatusTimeout {
        epoch,
        after_ms: after.as_millis() as u64,
    }]
}

fn with_refresh(mut cmds: Vec<Command>) -> Vec<Command> {
    cmds.insert(0, Command::Refresh);
    cmds
}

#[cfg(test)]
#[path = "reducer_tests.rs"]
mod tests;
