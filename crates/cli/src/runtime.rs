// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command executor for the interactive loop.
//!
//! The reducer emits [`Command`] values; this module performs the I/O each
//! one describes and feeds the single follow-up [`Message`] back through
//! the channel. Long-running work is spawned so the loop itself never
//! blocks.

use conductor_adapters::{GitAdapter, GithubClient, Openers, TunnelAdapter};
use conductor_core::{PrInfo, TunnelMode, TunnelState};
use conductor_engine::{CreateOptions, LifecycleEngine};
use conductor_store::Store;
use conductor_ui::{plan_claude_worktrees, Command, Message, TickKind};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

pub struct Runtime<G: GitAdapter> {
    pub store: Store,
    pub engine: Arc<LifecycleEngine<G>>,
    pub github: Arc<dyn GithubClient>,
    pub tunnel: Arc<dyn TunnelAdapter>,
    pub openers: Openers,
    pub msg_tx: UnboundedSender<Message>,
}

impl<G: GitAdapter> Runtime<G> {
    fn send(&self, msg: Message) {
        let _ = self.msg_tx.send(msg);
    }

    /// Execute one command. Every branch resolves to exactly one message
    /// (creates additionally arm the detached setup notification).
    pub fn execute(&self, cmd: Command) {
        match cmd {
            Command::Refresh => self.send(Message::Snapshot(self.store.snapshot())),

            Command::CreateWorktree { project, branch } => {
                self.spawn_create(project, branch);
            }

            Command::RetrySetup { project, worktree } => {
                let engine = Arc::clone(&self.engine);
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let (p2, w2, tx2) = (project.clone(), worktree.clone(), tx.clone());
                    let created: conductor_engine::Notify = Box::new(move |result| {
                        let _ = tx2.send(Message::RetriedSetup {
                            project: p2,
                            worktree: w2,
                            result,
                        });
                    });
                    let (p3, w3, tx3) = (project.clone(), worktree.clone(), tx.clone());
                    let setup_done: conductor_engine::Notify = Box::new(move |result| {
                        let _ = tx3.send(Message::SetupComplete {
                            project: p3,
                            worktree: w3,
                            result,
                        });
                    });
                    if let Err(e) = engine
                        .retry_setup(&project, &worktree, Some(created), Some(setup_done))
                        .await
                    {
                        let _ = tx.send(Message::RetriedSetup {
                            project,
                            worktree,
                            result: Err(e),
                        });
                    }
                });
            }

            Command::ArchiveWorktree { project, worktree } => {
                let engine = Arc::clone(&self.engine);
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = engine.archive_worktree(&project, &worktree).await;
                    let _ = tx.send(Message::WorktreeArchived {
                        project,
                        worktree,
                        result,
                    });
                });
            }

            Command::DeleteWorktree { project, worktree } => {
                let result = self.engine.delete_worktree(&project, &worktree);
                self.send(Message::WorktreeDeleted {
                    project,
                    worktree,
                    result,
                });
            }

            Command::RemoveProject { project } => {
                if let Err(e) = self.engine.remove_project(&project) {
                    warn!(project, error = %e, "project removal failed");
                }
                self.send(Message::Snapshot(self.store.snapshot()));
            }

            Command::FetchPrs {
                project,
                worktree,
                branch,
            } => {
                let store = self.store.clone();
                let github = Arc::clone(&self.github);
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = fetch_branch_prs(&store, &github, &project, &worktree, &branch).await;
                    let _ = tx.send(Message::PrsFetched {
                        project,
                        worktree,
                        result,
                    });
                });
            }

            Command::FetchAllPrs { project } => {
                let store = self.store.clone();
                let github = Arc::clone(&self.github);
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = fetch_project_prs(&store, &github, &project).await;
                    let _ = tx.send(Message::AllProjectPrsFetched { project, result });
                });
            }

            Command::ScanClaudePrs { manual } => {
                self.spawn_scan(manual);
            }

            Command::FetchGitStatus { project, worktree } => {
                let store = self.store.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let summary = git_status_summary(&store, &project, &worktree).await;
                    let _ = tx.send(Message::GitStatusFetched {
                        project,
                        worktree,
                        summary,
                    });
                });
            }

            Command::StartTunnel {
                project,
                worktree,
                mode,
            } => {
                let store = self.store.clone();
                let tunnel = Arc::clone(&self.tunnel);
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = start_tunnel(&store, tunnel.as_ref(), &project, &worktree, mode).await;
                    let _ = tx.send(Message::TunnelStarted {
                        project,
                        worktree,
                        result,
                    });
                });
            }

            Command::StopTunnel {
                project,
                worktree,
                pid,
            } => {
                let store = self.store.clone();
                let tunnel = Arc::clone(&self.tunnel);
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = match tunnel.stop(pid).await {
                        Ok(()) => store
                            .clear_tunnel_state(&project, &worktree)
                            .map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    let _ = tx.send(Message::TunnelStopped {
                        project,
                        worktree,
                        result,
                    });
                });
            }

            Command::CheckUpdate => {
                let store = self.store.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let (available, version) = crate::update::check(&store).await;
                    let _ = tx.send(Message::UpdateChecked { available, version });
                });
            }

            Command::StatConfigFile => {
                let modified_ms = std::fs::metadata(self.store.path())
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0);
                let now_ms = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;
                self.send(Message::ConfigStat { modified_ms, now_ms });
            }

            Command::ReloadConfig => {
                if let Err(e) = self.store.reload() {
                    warn!(error = %e, "config reload failed");
                }
                self.send(Message::Snapshot(self.store.snapshot()));
            }

            Command::OpenEditor { project, worktree } => {
                if let Ok(wt) = self.store.worktree(&project, &worktree) {
                    self.openers.open_editor(&wt.path);
                }
                self.send(Message::Snapshot(self.store.snapshot()));
            }

            Command::OpenUrl { url } => {
                let github = Arc::clone(&self.github);
                let store = self.store.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = github.open_in_browser(&url).await {
                        warn!(url, error = %e, "failed to open browser");
                    }
                    let _ = tx.send(Message::Snapshot(store.snapshot()));
                });
            }

            Command::ScheduleStatusTimeout { epoch, after_ms } => {
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(after_ms)).await;
                    let _ = tx.send(Message::Tick(TickKind::StatusTimeout(epoch)));
                });
            }

            // The loop handles Exit before calling execute
            Command::Exit(_) => {}
        }
    }

    fn spawn_create(&self, project: String, branch: String) {
        let tx = self.msg_tx.clone();
        // Prepare picks the worktree's city name; the callbacks read it
        // from this slot so status lines match the Worktrees list. The
        // branch stands in only until Prepare has named the record.
        let name_slot = Arc::new(Mutex::new(branch.clone()));
        let (p2, slot2, tx2) = (project.clone(), Arc::clone(&name_slot), tx.clone());
        let created: conductor_engine::Notify = Box::new(move |result| {
            let _ = tx2.send(Message::WorktreeCreated {
                project: p2,
                worktree: slot2.lock().clone(),
                result,
            });
        });
        let (p3, slot3, tx3) = (project.clone(), Arc::clone(&name_slot), tx.clone());
        let setup_done: conductor_engine::Notify = Box::new(move |result| {
            let _ = tx3.send(Message::SetupComplete {
                project: p3,
                worktree: slot3.lock().clone(),
                result,
            });
        });
        match self.engine.create_worktree(
            &project,
            &branch,
            CreateOptions::default(),
            Some(created),
            Some(setup_done),
        ) {
            Ok(name) => *name_slot.lock() = name,
            Err(e) => self.send(Message::WorktreeCreated {
                project,
                worktree: branch,
                result: Err(e),
            }),
        }
    }

    /// One scan round: fetch each project's open PRs, plan the missing
    /// `claude/` worktrees, create them through the normal two-phase path.
    fn spawn_scan(&self, manual: bool) {
        let store = self.store.clone();
        let github = Arc::clone(&self.github);
        let engine = Arc::clone(&self.engine);
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let doc = store.snapshot();
            let mut errors = 0usize;
            let mut existing = 0usize;
            let mut fetched = Vec::new();
            for (name, project) in &doc.projects {
                let (Some(owner), Some(repo)) = (&project.github_owner, &project.github_repo)
                else {
                    continue;
                };
                match github.open_prs(owner, repo).await {
                    Ok(prs) => {
                        existing += prs
                            .iter()
                            .filter(|pr| {
                                pr.head_branch.starts_with(conductor_ui::scan::CLAUDE_BRANCH_PREFIX)
                                    && project.worktree_on_branch(&pr.head_branch).is_some()
                            })
                            .count();
                        fetched.push((name.clone(), prs));
                    }
                    Err(e) => {
                        warn!(project = %name, error = %e, "claude PR fetch failed");
                        errors += 1;
                    }
                }
            }

            let plan = plan_claude_worktrees(&doc, &fetched);
            let mut new = 0usize;
            for (project, branch) in plan {
                match engine.create_worktree(&project, &branch, CreateOptions::default(), None, None)
                {
                    Ok(_) => new += 1,
                    Err(e) => {
                        warn!(project = %project, branch = %branch, error = %e, "auto-create failed");
                        errors += 1;
                    }
                }
            }

            let _ = tx.send(Message::ClaudePrsScanned {
                new,
                existing,
                errors,
                manual,
            });
        });
    }
}

async fn fetch_branch_prs(
    store: &Store,
    github: &Arc<dyn GithubClient>,
    project: &str,
    worktree: &str,
    branch: &str,
) -> Result<Vec<PrInfo>, String> {
    let p = store.project(project).map_err(|e| e.to_string())?;
    let (Some(owner), Some(repo)) = (p.github_owner, p.github_repo) else {
        return Err("project has no GitHub remote".to_string());
    };
    let prs = github
        .prs_for_branch(&owner, &repo, branch)
        .await
        .map_err(|e| e.to_string())?;
    store
        .set_worktree_prs(project, worktree, prs.clone())
        .map_err(|e| e.to_string())?;
    Ok(prs)
}

async fn fetch_project_prs(
    store: &Store,
    github: &Arc<dyn GithubClient>,
    project: &str,
) -> Result<Vec<PrInfo>, String> {
    let p = store.project(project).map_err(|e| e.to_string())?;
    let (Some(owner), Some(repo)) = (p.github_owner.clone(), p.github_repo.clone()) else {
        return Err("project has no GitHub remote".to_string());
    };
    let prs = github
        .open_prs(&owner, &repo)
        .await
        .map_err(|e| e.to_string())?;

    // Cache per-worktree so the PR views work offline
    for (name, wt) in &p.worktrees {
        let matching: Vec<PrInfo> = prs
            .iter()
            .filter(|pr| pr.head_branch == wt.branch)
            .cloned()
            .collect();
        if !matching.is_empty() {
            let _ = store.set_worktree_prs(project, name, matching);
        }
    }
    Ok(prs)
}

async fn git_status_summary(store: &Store, project: &str, worktree: &str) -> String {
    let Ok(wt) = store.worktree(project, worktree) else {
        return "worktree not found".to_string();
    };
    let mut cmd = tokio::process::Command::new("git");
    cmd.arg("-C").arg(&wt.path).args(["status", "--porcelain"]);
    match conductor_adapters::run_with_timeout(cmd, Duration::from_secs(10), "git status").await {
        Ok(output) if output.status.success() => {
            let changed = String::from_utf8_lossy(&output.stdout)
                .lines()
                .filter(|l| !l.trim().is_empty())
                .count();
            if changed == 0 {
                "clean".to_string()
            } else {
                format!("{changed} file(s) changed")
            }
        }
        Ok(output) => String::from_utf8_lossy(&output.stderr).trim().to_string(),
        Err(e) => e,
    }
}

async fn start_tunnel(
    store: &Store,
    tunnel: &dyn TunnelAdapter,
    project: &str,
    worktree: &str,
    mode: TunnelMode,
) -> Result<String, String> {
    let wt = store.worktree(project, worktree).map_err(|e| e.to_string())?;
    let Some(port) = wt.primary_port() else {
        return Err("worktree has no allocated ports".to_string());
    };

    let handle = match mode {
        TunnelMode::Quick => tunnel
            .start_quick(project, worktree, port)
            .await
            .map_err(|e| e.to_string())?,
        TunnelMode::Named => {
            let hostname = format!("{worktree}.{project}.dev");
            tunnel
                .start_named(project, worktree, project, &hostname, port)
                .await
                .map_err(|e| e.to_string())?
        }
    };

    store
        .set_tunnel_state(
            project,
            worktree,
            TunnelState {
                active: true,
                mode,
                url: handle.url.clone(),
                port,
                pid: handle.pid,
                started_at: Utc::now(),
            },
        )
        .map_err(|e| e.to_string())?;
    Ok(handle.url)
}

/// Count tunnels that survived a restart (their PID is still live) so the
/// UI can report the reattachment once.
pub fn restored_tunnel_count(store: &Store, tunnel: &dyn TunnelAdapter) -> usize {
    let live = tunnel.live_pids();
    store
        .all_worktrees()
        .into_iter()
        .filter(|(_, _, wt)| {
            wt.tunnel
                .as_ref()
                .is_some_and(|t| t.active && live.contains(&t.pid))
        })
        .count()
}
