// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain renderer over the UI model.
//!
//! Unstyled beyond a cursor marker and the status line; the model carries
//! all state, so a richer renderer can replace this file without touching
//! the core.

use chrono::{DateTime, Utc};
use conductor_core::format_elapsed;
use conductor_ui::{Model, View};
use crossterm::{cursor::MoveTo, execute, terminal};
use std::io::Write;

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];

pub fn draw(model: &Model) -> std::io::Result<()> {
    let mut out = std::io::stdout();
    execute!(out, terminal::Clear(terminal::ClearType::All), MoveTo(0, 0))?;

    let lines = compose(model);
    for line in lines.iter().take(usize::from(model.height)) {
        write!(out, "{line}\r\n")?;
    }
    out.flush()
}

fn compose(model: &Model) -> Vec<String> {
    let mut lines = vec![title(model), String::new()];
    lines.extend(body(model));
    while lines.len() + 1 < usize::from(model.height) {
        lines.push(String::new());
    }
    lines.push(status_line(model));
    lines
}

fn title(model: &Model) -> String {
    let spinner = SPINNER_FRAMES[model.spinner_frame % SPINNER_FRAMES.len()];
    let view = match model.view {
        View::Projects => "projects".to_string(),
        View::Worktrees => format!(
            "worktrees · {}",
            model.selected_project.as_deref().unwrap_or("?")
        ),
        View::Ports => "ports".to_string(),
        View::AllPrs => "pull requests".to_string(),
        View::WorktreePrs => format!(
            "pull requests · {}",
            model.selected_worktree.as_deref().unwrap_or("?")
        ),
        View::Logs { archive: false } => "setup log".to_string(),
        View::Logs { archive: true } => "archive log".to_string(),
        View::Help => "help".to_string(),
        View::QuitDialog => "quit?".to_string(),
        View::CreateWorktree => "new worktree".to_string(),
        View::ConfirmDelete => "confirm".to_string(),
        View::TunnelModal => "tunnel".to_string(),
        View::BranchRename => "rename branch".to_string(),
        View::ArchivedList => "archived".to_string(),
        View::StatusHistory => "status history".to_string(),
    };
    let update = model
        .update_available
        .as_deref()
        .map(|v| format!("  (update {v} available)"))
        .unwrap_or_default();
    format!("{spinner} conductor · {view}{update}")
}

fn body(model: &Model) -> Vec<String> {
    match model.view {
        View::Projects => {
            let rows: Vec<String> = model
                .doc
                .projects
                .iter()
                .map(|(name, p)| {
                    let active = p.worktrees.values().filter(|w| !w.archived).count();
                    format!("{name}  ({active} worktrees)  {}", p.path.display())
                })
                .collect();
            list(&rows, &model.projects, model.visible_rows())
        }
        View::Worktrees => {
            let rows: Vec<String> = model
                .active_worktrees()
                .iter()
                .map(|(name, wt)| {
                    let ports = wt
                        .ports
                        .iter()
                        .map(u16::to_string)
                        .collect::<Vec<_>>()
                        .join(",");
                    let marker = if wt.is_root {
                        "root".to_string()
                    } else {
                        wt.setup_status.to_string()
                    };
                    let age = elapsed_since(wt.created_at);
                    let tunnel = wt
                        .tunnel
                        .as_ref()
                        .filter(|t| t.active)
                        .map(|t| format!("  ⇄ {} (up {})", t.url, elapsed_since(t.started_at)))
                        .unwrap_or_default();
                    format!("{name}  [{}]  {marker}  ({ports})  {age}{tunnel}", wt.branch)
                })
                .collect();
            list(&rows, &model.worktrees, model.visible_rows())
        }
        View::Ports => {
            let rows: Vec<String> = model
                .doc
                .port_allocations
                .iter()
                .map(|(port, owner)| {
                    format!("{port}  {}/{}  #{}", owner.project, owner.worktree, owner.index)
                })
                .collect();
            list(&rows, &model.ports, model.visible_rows())
        }
        View::AllPrs => {
            let rows: Vec<String> = model
                .doc
                .all_worktrees()
                .flat_map(|(project, _, wt)| {
                    wt.prs.iter().map(move |pr| {
                        format!("#{} [{}] {} ({})", pr.number, pr.state, pr.title, project)
                    })
                })
                .collect();
            list(&rows, &model.all_prs, model.visible_rows())
        }
        View::WorktreePrs => {
            let rows: Vec<String> = model
                .selected_project
                .as_deref()
                .zip(model.selected_worktree.as_deref())
                .and_then(|(p, w)| model.doc.worktree(p, w).ok())
                .map(|wt| {
                    wt.prs
                        .iter()
                        .map(|pr| format!("#{} [{}] {} — {}", pr.number, pr.state, pr.title, pr.author))
                        .collect()
                })
                .unwrap_or_default();
            list(&rows, &model.worktree_prs, model.visible_rows())
        }
        View::ArchivedList => {
            let rows: Vec<String> = model
                .archived_worktrees()
                .iter()
                .map(|(name, wt)| {
                    let when = wt
                        .archived_at
                        .map(|t| format!("{} ago", elapsed_since(t)))
                        .unwrap_or_default();
                    format!("{name}  [{}]  archived {when}", wt.branch)
                })
                .collect();
            list(&rows, &model.archived, model.visible_rows())
        }
        View::StatusHistory => {
            let rows: Vec<String> = model
                .status_history
                .iter()
                .map(|s| {
                    let icon = if s.is_error { "✗" } else { "·" };
                    format!("{icon} {}", s.text)
                })
                .collect();
            list(&rows, &model.history, model.visible_rows())
        }
        View::Logs { .. } => vec!["(log tail follows in the pane below)".to_string()],
        View::Help => vec![
            "enter  open        c  new worktree   a  archive (y to confirm)".to_string(),
            "R  retry setup     v  pull requests  t  tunnel".to_string(),
            "p  ports           A  archived       H  status history".to_string(),
            "s  scan claude PRs o  open editor    q  quit".to_string(),
        ],
        View::QuitDialog => vec![
            "k  quit and kill tunnels".to_string(),
            "d  detach and leave everything running".to_string(),
            "esc  cancel".to_string(),
        ],
        View::CreateWorktree => vec![format!("branch: {}_", model.branch_input)],
        View::BranchRename => vec![
            "that branch is already checked out elsewhere".to_string(),
            format!("new branch: {}_", model.branch_input),
        ],
        View::ConfirmDelete => match &model.confirm {
            Some(confirm) => vec![format!(
                "really {:?} {}/{}? press y to confirm",
                confirm.kind, confirm.project, confirm.worktree
            )],
            None => vec![],
        },
        View::TunnelModal => vec![
            "q  quick tunnel".to_string(),
            "n  named tunnel".to_string(),
            "x  stop tunnel".to_string(),
        ],
    }
}

fn elapsed_since(t: DateTime<Utc>) -> String {
    let secs = (Utc::now() - t).num_seconds().max(0) as u64;
    format_elapsed(secs)
}

/// Render the visible window of a list with a cursor marker.
fn list(rows: &[String], cursor: &conductor_ui::CursorState, visible: usize) -> Vec<String> {
    rows.iter()
        .enumerate()
        .skip(cursor.offset)
        .take(visible)
        .map(|(i, row)| {
            if i == cursor.cursor {
                format!("> {row}")
            } else {
                format!("  {row}")
            }
        })
        .collect()
}

fn status_line(model: &Model) -> String {
    match &model.status {
        Some(status) if status.is_error => format!("✗ {}", status.text),
        Some(status) => status.text.clone(),
        None => String::new(),
    }
}
