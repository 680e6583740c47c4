// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = {
        "2026-07-30T10:00:00Z INF |  https://brief-otter.trycloudflare.com  |",
        Some("https://brief-otter.trycloudflare.com")
    },
    boxed = {
        "INF |  https://a-b-c.trycloudflare.com",
        Some("https://a-b-c.trycloudflare.com")
    },
    unrelated_url = { "INF visit https://developers.cloudflare.com for docs", None },
    no_url = { "INF starting tunnel", None },
)]
fn url_extraction(line: &str, expected: Option<&str>) {
    assert_eq!(extract_tunnel_url(line).as_deref(), expected);
}

#[test]
fn live_pids_reads_pid_files_and_reaps_stale_ones() {
    let dir = tempfile::tempdir().unwrap();
    let tunnel = CloudflaredTunnel::new(dir.path());
    let pid_dir = dir.path().join("tunnels");
    fs::create_dir_all(&pid_dir).unwrap();

    // Our own PID is definitely alive; 4000000 is outside pid_max defaults
    let own_pid = std::process::id();
    fs::write(pid_dir.join("acme-tokyo.pid"), own_pid.to_string()).unwrap();
    fs::write(pid_dir.join("acme-paris.pid"), "4000000").unwrap();
    fs::write(pid_dir.join("acme-oslo.pid"), "not a pid").unwrap();

    let live = tunnel.live_pids();
    assert_eq!(live, HashSet::from([own_pid]));

    // Stale and garbage files were reaped, the live one remains
    assert!(pid_dir.join("acme-tokyo.pid").exists());
    assert!(!pid_dir.join("acme-paris.pid").exists());
    assert!(!pid_dir.join("acme-oslo.pid").exists());
}

#[test]
fn live_pids_without_dir_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let tunnel = CloudflaredTunnel::new(dir.path());
    assert!(tunnel.live_pids().is_empty());
}
