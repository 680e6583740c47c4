// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cloudflare tunnel adapter.
//!
//! Tunnels are detached `cloudflared` processes. Each started tunnel writes
//! a PID file under `<conductor-dir>/tunnels/` so a later process can reap
//! or reattach; the recovery pass compares persisted tunnel state against
//! [`TunnelAdapter::live_pids`] and clears entries whose process is gone.

use async_trait::async_trait;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors from tunnel operations.
#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("cloudflared failed to start: {0}")]
    Spawn(String),
    #[error("no tunnel URL within {0:?}")]
    NoUrl(Duration),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A started tunnel: the detached process and its public URL.
#[derive(Debug, Clone)]
pub struct TunnelHandle {
    pub pid: u32,
    pub url: String,
}

/// The tunnel surface the core needs.
#[async_trait]
pub trait TunnelAdapter: Send + Sync + 'static {
    /// Start a quick tunnel to `localhost:port`; resolves once the public
    /// URL is known.
    async fn start_quick(&self, project: &str, worktree: &str, port: u16)
        -> Result<TunnelHandle, TunnelError>;

    /// Start a named tunnel with an ingress rule for `hostname`.
    async fn start_named(
        &self,
        project: &str,
        worktree: &str,
        tunnel_name: &str,
        hostname: &str,
        port: u16,
    ) -> Result<TunnelHandle, TunnelError>;

    /// Stop a tunnel by PID and drop its PID file.
    async fn stop(&self, pid: u32) -> Result<(), TunnelError>;

    /// Verify `cloudflared` is installed and authenticated.
    async fn test_auth(&self) -> Result<(), TunnelError>;

    /// PIDs from PID files whose process is still alive.
    fn live_pids(&self) -> HashSet<u32>;
}

const URL_WAIT: Duration = Duration::from_secs(30);

/// Production adapter spawning `cloudflared`.
pub struct CloudflaredTunnel {
    pid_dir: PathBuf,
}

impl CloudflaredTunnel {
    pub fn new(conductor_dir: &std::path::Path) -> Self {
        Self {
            pid_dir: conductor_dir.join("tunnels"),
        }
    }

    fn pid_file(&self, project: &str, worktree: &str) -> PathBuf {
        self.pid_dir.join(format!("{project}-{worktree}.pid"))
    }

    fn write_pid_file(&self, project: &str, worktree: &str, pid: u32) -> Result<(), TunnelError> {
        fs::create_dir_all(&self.pid_dir)?;
        fs::write(self.pid_file(project, worktree), pid.to_string())?;
        Ok(())
    }

    /// Spawn cloudflared and scrape the public URL from its stderr.
    async fn spawn_and_wait_for_url(
        &self,
        project: &str,
        worktree: &str,
        args: Vec<String>,
    ) -> Result<TunnelHandle, TunnelError> {
        let mut child = Command::new("cloudflared")
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TunnelError::Spawn(e.to_string()))?;

        let pid = child.id().ok_or_else(|| {
            TunnelError::Spawn("cloudflared exited before reporting a pid".to_string())
        })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TunnelError::Spawn("no stderr handle".to_string()))?;

        let url = tokio::time::timeout(URL_WAIT, async {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(url) = extract_tunnel_url(&line) {
                    return Some(url);
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
        .ok_or(TunnelError::NoUrl(URL_WAIT))?;

        self.write_pid_file(project, worktree, pid)?;

        // Detach: the process keeps running after we drop the handle
        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        debug!(pid, url = %url, "tunnel started");
        Ok(TunnelHandle { pid, url })
    }
}

#[async_trait]
impl TunnelAdapter for CloudflaredTunnel {
    async fn start_quick(
        &self,
        project: &str,
        worktree: &str,
        port: u16,
    ) -> Result<TunnelHandle, TunnelError> {
        let args = vec![
            "tunnel".to_string(),
            "--url".to_string(),
            format!("http://localhost:{port}"),
        ];
        self.spawn_and_wait_for_url(project, worktree, args).await
    }

    async fn start_named(
        &self,
        project: &str,
        worktree: &str,
        tunnel_name: &str,
        hostname: &str,
        port: u16,
    ) -> Result<TunnelHandle, TunnelError> {
        let args = vec![
            "tunnel".to_string(),
            "run".to_string(),
            "--url".to_string(),
            format!("http://localhost:{port}"),
            tunnel_name.to_string(),
        ];
        let mut handle = self.spawn_and_wait_for_url(project, worktree, args).await?;
        // Named tunnels serve on the configured hostname, not the scraped URL
        handle.url = format!("https://{hostname}");
        Ok(handle)
    }

    async fn stop(&self, pid: u32) -> Result<(), TunnelError> {
        let status = Command::new("kill")
            .arg(pid.to_string())
            .status()
            .await
            .map_err(|e| TunnelError::Spawn(e.to_string()))?;
        if !status.success() {
            warn!(pid, "kill reported failure; process was likely already gone");
        }
        // Drop whichever PID file pointed at this process
        if let Ok(entries) = fs::read_dir(&self.pid_dir) {
            for entry in entries.flatten() {
                if read_pid(&entry.path()) == Some(pid) {
                    let _ = fs::remove_file(entry.path());
                }
            }
        }
        Ok(())
    }

    async fn test_auth(&self) -> Result<(), TunnelError> {
        let output = Command::new("cloudflared")
            .args(["tunnel", "list"])
            .output()
            .await
            .map_err(|e| TunnelError::Spawn(e.to_string()))?;
        if !output.status.success() {
            return Err(TunnelError::Spawn(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    fn live_pids(&self) -> HashSet<u32> {
        let mut live = HashSet::new();
        let Ok(entries) = fs::read_dir(&self.pid_dir) else {
            return live;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(true, |e| e != "pid") {
                continue;
            }
            match read_pid(&path) {
                Some(pid) if process_alive(pid) => {
                    live.insert(pid);
                }
                // Stale or unreadable PID file: reap it
                _ => {
                    let _ = fs::remove_file(&path);
                }
            }
        }
        live
    }
}

fn read_pid(path: &std::path::Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Signal-0 probe via /proc on Linux, `kill -0` elsewhere.
fn process_alive(pid: u32) -> bool {
    if cfg!(target_os = "linux") {
        return std::path::Path::new(&format!("/proc/{pid}")).exists();
    }
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Find the `https://….trycloudflare.com` URL in a cloudflared log line.
fn extract_tunnel_url(line: &str) -> Option<String> {
    let start = line.find("https://")?;
    let rest = &line[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '"' || c == '|')
        .unwrap_or(rest.len());
    let url = &rest[..end];
    if url.contains("trycloudflare.com") {
        Some(url.to_string())
    } else {
        None
    }
}

#[cfg(test)]
#[path = "tunnel_tests.rs"]
mod tests;
