// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! conductor - a workstation orchestrator for git worktrees

mod commands;
mod render;
mod runtime;
mod tui;
mod update;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use conductor_adapters::{CliGit, CloudflaredTunnel, GhCli, Openers, TunnelAdapter};
use conductor_engine::{LifecycleEngine, LogBuffers, SetupRunner};
use conductor_store::{conductor_dir, config_path, Store};
use std::path::Path;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "conductor",
    version,
    about = "Conductor - one worktree per task, each on its own ports"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Project management
    Project(commands::ProjectArgs),
    /// Worktree management
    Worktree(commands::WorktreeArgs),
    /// Show the port allocation table
    Ports,
    /// One-line summary per project
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let dir = conductor_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create state directory {}", dir.display()))?;
    init_tracing(&dir)?;

    // The document must load (or default-create); anything else is fatal
    let store = Store::open(config_path(&dir))
        .with_context(|| format!("cannot load {}", config_path(&dir).display()))?;

    let git = Arc::new(CliGit);
    let logs = LogBuffers::new(dir.join("logs"));
    let setup = SetupRunner::new(store.clone(), logs);
    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        git,
        setup,
        dir.clone(),
    ));
    let tunnel: Arc<dyn TunnelAdapter> = Arc::new(CloudflaredTunnel::new(&dir));

    let result = match cli.command {
        None => {
            tui::run(
                store.clone(),
                Arc::clone(&engine),
                Arc::new(GhCli),
                Arc::clone(&tunnel),
                Openers,
            )
            .await
        }
        Some(Commands::Project(args)) => commands::project(&store, &engine, args).await,
        Some(Commands::Worktree(args)) => commands::worktree(&store, &engine, args).await,
        Some(Commands::Ports) => commands::ports(&store),
        Some(Commands::Status) => commands::status(&store),
    };

    // Let the current git job finish and flush pending saves; detached
    // setup scripts keep running
    engine.queue().drain().await;
    let report = store.close().await;
    if let Some(err) = report.last_error {
        eprintln!("warning: state may not be fully saved: {}", err.error);
    }

    result
}

fn init_tracing(dir: &Path) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let appender = tracing_appender::rolling::never(dir.join("logs"), "conductor.log");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .init();
    Ok(())
}
