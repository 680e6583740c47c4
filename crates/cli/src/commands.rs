// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-interactive command surface.
//!
//! These are thin: parse, call the engine or the store, print. The
//! interactive loop in `tui` is the primary interface.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use conductor_adapters::GitAdapter;
use conductor_core::SetupStatus;
use conductor_engine::{CreateOptions, LifecycleEngine};
use conductor_store::Store;
use std::path::PathBuf;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    command: ProjectCommands,
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Register a git repository
    Add {
        path: PathBuf,
        /// Defaults to the directory name
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a project and free its ports
    Remove { name: String },
    /// List registered projects
    List,
}

#[derive(Args)]
pub struct WorktreeArgs {
    #[command(subcommand)]
    command: WorktreeCommands,
}

#[derive(Subcommand)]
enum WorktreeCommands {
    /// Create a worktree for a branch and run its setup
    Create {
        project: String,
        branch: String,
        /// Explicit worktree name instead of a random city
        #[arg(long)]
        name: Option<String>,
        /// Port count override
        #[arg(long, default_value_t = 0)]
        ports: u16,
    },
    /// List a project's worktrees
    List { project: String },
    /// Archive a worktree (frees its ports, keeps its logs)
    Archive { project: String, worktree: String },
    /// Delete an archived worktree's record
    Delete { project: String, worktree: String },
}

pub async fn project<G: GitAdapter>(
    store: &Store,
    engine: &LifecycleEngine<G>,
    args: ProjectArgs,
) -> Result<()> {
    match args.command {
        ProjectCommands::Add { path, name } => {
            let name = match name {
                Some(n) => n,
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            };
            if name.is_empty() {
                bail!("cannot derive a project name from {}", path.display());
            }
            engine.add_project(&name, &path).await?;
            println!("added project {name}");
            Ok(())
        }
        ProjectCommands::Remove { name } => {
            engine.remove_project(&name)?;
            println!("removed project {name}");
            Ok(())
        }
        ProjectCommands::List => {
            for (name, project) in store.list_projects() {
                let active = project.worktrees.values().filter(|w| !w.archived).count();
                println!("{name}\t{}\t{active} worktree(s)", project.path.display());
            }
            Ok(())
        }
    }
}

pub async fn worktree<G: GitAdapter>(
    store: &Store,
    engine: &LifecycleEngine<G>,
    args: WorktreeArgs,
) -> Result<()> {
    match args.command {
        WorktreeCommands::Create {
            project,
            branch,
            name,
            ports,
        } => {
            let (done_tx, done_rx) = tokio::sync::oneshot::channel();
            let worktree = engine.create_worktree(
                &project,
                &branch,
                CreateOptions { name, ports },
                None,
                Some(Box::new(move |result| {
                    let _ = done_tx.send(result);
                })),
            )?;
            println!("created {project}/{worktree}, running setup");
            match done_rx.await {
                Ok(Ok(())) => println!("{project}/{worktree}: setup done"),
                Ok(Err(e)) => bail!("{project}/{worktree}: {e}"),
                Err(_) => bail!("{project}/{worktree}: setup task vanished"),
            }
            Ok(())
        }
        WorktreeCommands::List { project } => {
            let p = store.project(&project)?;
            for (name, wt) in &p.worktrees {
                let state = if wt.archived {
                    "archived".to_string()
                } else if wt.is_root {
                    "root".to_string()
                } else {
                    wt.setup_status.to_string()
                };
                let ports = wt
                    .ports
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                println!("{name}\t{}\t{state}\t[{ports}]", wt.branch);
            }
            Ok(())
        }
        WorktreeCommands::Archive { project, worktree } => {
            engine.archive_worktree(&project, &worktree).await?;
            println!("archived {project}/{worktree}");
            Ok(())
        }
        WorktreeCommands::Delete { project, worktree } => {
            engine.delete_worktree(&project, &worktree)?;
            println!("deleted {project}/{worktree}");
            Ok(())
        }
    }
}

pub fn ports(store: &Store) -> Result<()> {
    let doc = store.snapshot();
    for (port, owner) in &doc.port_allocations {
        println!("{port}\t{}/{}\t#{}", owner.project, owner.worktree, owner.index);
    }
    Ok(())
}

pub fn status(store: &Store) -> Result<()> {
    for (name, project) in store.list_projects() {
        let mut running = 0;
        let mut done = 0;
        let mut failed = 0;
        for wt in project.worktrees.values().filter(|w| !w.archived && !w.is_root) {
            match wt.setup_status {
                SetupStatus::Creating | SetupStatus::Running => running += 1,
                SetupStatus::Done => done += 1,
                SetupStatus::Failed => failed += 1,
                SetupStatus::None => {}
            }
        }
        println!("{name}: {done} ready, {running} in flight, {failed} failed");
    }
    Ok(())
}
