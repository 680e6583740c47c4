// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Setup and archive script execution.
//!
//! One task per script run. Output is streamed line by line into the log
//! buffers (memory ring + file). A non-zero setup exit fails the worktree;
//! an archive script's exit code is logged and never aborts the archive.

use crate::config::{ProjectConfig, ResolvedScript};
use crate::logs::{LogBuffers, ScriptLogKind};
use crate::queue::Notify;
use crate::script_env::script_env;
use conductor_core::{Error, SetupStatus, Subsystem};
use conductor_store::Store;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

/// Everything a script run needs to know about its worktree.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    pub project: String,
    pub project_path: PathBuf,
    pub worktree: String,
    pub worktree_path: PathBuf,
    pub ports: Vec<u16>,
}

/// Runs lifecycle scripts and owns the log buffers.
#[derive(Clone)]
pub struct SetupRunner {
    store: Store,
    logs: LogBuffers,
}

impl SetupRunner {
    pub fn new(store: Store, logs: LogBuffers) -> Self {
        Self { store, logs }
    }

    pub fn logs(&self) -> &LogBuffers {
        &self.logs
    }

    /// Spawn the setup script for a worktree already in `Running`.
    ///
    /// The spawned task moves the worktree to `Done` or `Failed` and then
    /// invokes `on_complete`. Setup runs detached: shutdown never
    /// interrupts it.
    pub fn start_setup(&self, ctx: ScriptContext, on_complete: Option<Notify>) {
        let runner = self.clone();
        tokio::spawn(async move {
            let result = runner.run_setup(&ctx).await;
            let status = match &result {
                Ok(()) => SetupStatus::Done,
                Err(_) => SetupStatus::Failed,
            };
            if let Err(e) = runner
                .store
                .set_worktree_status(&ctx.project, &ctx.worktree, status)
            {
                warn!(
                    project = %ctx.project,
                    worktree = %ctx.worktree,
                    error = %e,
                    "failed to record setup outcome"
                );
            }
            if let Some(cb) = on_complete {
                cb(result);
            }
        });
    }

    async fn run_setup(&self, ctx: &ScriptContext) -> Result<(), Error> {
        let config = ProjectConfig::load(&ctx.project_path)?;
        let Some(script) = config.resolve_script(&ctx.project_path, "setup") else {
            self.logs.append(
                &ctx.project,
                &ctx.worktree,
                ScriptLogKind::Setup,
                "no setup script configured; nothing to do",
            );
            return Ok(());
        };

        let code = self
            .run_script(ctx, &config, script, ScriptLogKind::Setup)
            .await?;
        if code != 0 {
            return Err(Error::external(
                Subsystem::Script,
                format!("setup script exited with code {code}"),
            ));
        }
        Ok(())
    }

    /// Run the archive script, best-effort: failures are logged, never
    /// propagated, so archiving always proceeds.
    pub async fn run_archive(&self, ctx: &ScriptContext) {
        let config = match ProjectConfig::load(&ctx.project_path) {
            Ok(c) => c,
            Err(e) => {
                warn!(project = %ctx.project, error = %e, "archive skipping broken project config");
                return;
            }
        };
        let Some(script) = config.resolve_script(&ctx.project_path, "archive") else {
            return;
        };

        match self
            .run_script(ctx, &config, script, ScriptLogKind::Archive)
            .await
        {
            Ok(0) => {}
            Ok(code) => self.logs.append(
                &ctx.project,
                &ctx.worktree,
                ScriptLogKind::Archive,
                &format!("archive script exited with code {code} (ignored)"),
            ),
            Err(e) => self.logs.append(
                &ctx.project,
                &ctx.worktree,
                ScriptLogKind::Archive,
                &format!("archive script failed to run: {e} (ignored)"),
            ),
        }
    }

    /// Execute a resolved script with the worktree env, streaming output.
    /// Returns the exit code.
    async fn run_script(
        &self,
        ctx: &ScriptContext,
        config: &ProjectConfig,
        script: ResolvedScript,
        kind: ScriptLogKind,
    ) -> Result<i32, Error> {
        let mut cmd = Command::new("bash");
        match &script {
            ResolvedScript::File(path) => {
                cmd.arg(path);
            }
            ResolvedScript::Inline(body) => {
                cmd.arg("-c").arg(format!("set -euo pipefail\n{body}"));
            }
        }
        let env = script_env(
            &ctx.project,
            &ctx.worktree_path.to_string_lossy(),
            &ctx.ports,
            &config.port_labels,
        );
        cmd.current_dir(&ctx.worktree_path)
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        info!(
            project = %ctx.project,
            worktree = %ctx.worktree,
            kind = %kind,
            "running script"
        );

        let mut child = cmd.spawn().map_err(|e| {
            Error::external(Subsystem::Script, format!("failed to spawn bash: {e}"))
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_task = {
            let logs = self.logs.clone();
            let project = ctx.project.clone();
            let worktree = ctx.worktree.clone();
            async move {
                if let Some(pipe) = stdout {
                    let mut lines = BufReader::new(pipe).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        logs.append(&project, &worktree, kind, &line);
                    }
                }
            }
        };
        let stderr_task = {
            let logs = self.logs.clone();
            let project = ctx.project.clone();
            let worktree = ctx.worktree.clone();
            async move {
                if let Some(pipe) = stderr {
                    let mut lines = BufReader::new(pipe).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        logs.append(&project, &worktree, kind, &line);
                    }
                }
            }
        };

        // Drain both pipes fully before reaping the child
        let (status, (), ()) = tokio::join!(child.wait(), stdout_task, stderr_task);
        let status = status.map_err(|e| {
            Error::external(Subsystem::Script, format!("script wait failed: {e}"))
        })?;
        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;
