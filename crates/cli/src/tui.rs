// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The interactive loop.
//!
//! Owns the terminal, the tickers, and the message channel. Recovery runs
//! before the first keystroke is read. The reducer stays pure; everything
//! here is plumbing between crossterm, the runtime executor, and the
//! renderer.

use crate::render;
use crate::runtime::{restored_tunnel_count, Runtime};
use anyhow::Result;
use conductor_adapters::{GitAdapter, GithubClient, Openers, TunnelAdapter};
use conductor_core::parse_interval_secs;
use conductor_engine::{recover, LifecycleEngine};
use conductor_store::Store;
use conductor_ui::{
    update, Command, Key, Message, Model, TickKind, CLAUDE_PR_SCAN_INTERVAL, CONFIG_WATCH_INTERVAL,
    SPINNER_INTERVAL, UPDATE_CHECK_INTERVAL,
};
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseEventKind};
use crossterm::{event, execute, terminal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub async fn run<G: GitAdapter>(
    store: Store,
    engine: Arc<LifecycleEngine<G>>,
    github: Arc<dyn GithubClient>,
    tunnel: Arc<dyn TunnelAdapter>,
    openers: Openers,
) -> Result<()> {
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();

    // Reconcile interrupted state before any input is processed
    let recovered = recover(&store, &tunnel.live_pids())?;
    let _ = msg_tx.send(Message::StatesRecovered {
        count: recovered.worktrees_reset,
    });
    let reattached = restored_tunnel_count(&store, tunnel.as_ref());
    let _ = msg_tx.send(Message::TunnelsRestored { count: reattached });

    let runtime = Runtime {
        store: store.clone(),
        engine,
        github,
        tunnel,
        openers,
        msg_tx: msg_tx.clone(),
    };

    // The update cadence comes from the persisted settings; the constant
    // is only the fallback for an unparseable interval
    let update_interval = parse_interval_secs(&store.snapshot().updates.check_interval)
        .map(Duration::from_secs)
        .unwrap_or(UPDATE_CHECK_INTERVAL);
    spawn_tickers(msg_tx.clone(), update_interval);
    spawn_input_reader(msg_tx.clone());

    let mut model = Model::new(store.snapshot());
    if let Ok((width, height)) = terminal::size() {
        model.width = width;
        model.height = height;
    }

    terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        event::EnableMouseCapture
    )?;

    let result = event_loop(&mut model, &runtime, &mut msg_rx).await;

    execute!(
        stdout,
        event::DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()?;
    result
}

async fn event_loop<G: GitAdapter>(
    model: &mut Model,
    runtime: &Runtime<G>,
    msg_rx: &mut mpsc::UnboundedReceiver<Message>,
) -> Result<()> {
    loop {
        render::draw(model)?;
        let Some(msg) = msg_rx.recv().await else {
            return Ok(());
        };
        for cmd in update(model, msg) {
            if let Command::Exit(mode) = cmd {
                if mode == conductor_ui::ExitMode::KillAll {
                    stop_all_tunnels(runtime).await;
                }
                return Ok(());
            }
            runtime.execute(cmd);
        }
    }
}

async fn stop_all_tunnels<G: GitAdapter>(runtime: &Runtime<G>) {
    for (project, worktree, wt) in runtime.store.all_worktrees() {
        if let Some(tunnel) = wt.tunnel.filter(|t| t.active) {
            let _ = runtime.tunnel.stop(tunnel.pid).await;
            let _ = runtime.store.clear_tunnel_state(&project, &worktree);
        }
    }
}

fn spawn_tickers(tx: mpsc::UnboundedSender<Message>, update_interval: Duration) {
    spawn_ticker(tx.clone(), SPINNER_INTERVAL, TickKind::Spinner);
    spawn_ticker(tx.clone(), CLAUDE_PR_SCAN_INTERVAL, TickKind::ClaudePrScan);
    spawn_ticker(tx.clone(), update_interval, TickKind::UpdateCheck);
    spawn_ticker(tx, CONFIG_WATCH_INTERVAL, TickKind::ConfigWatch);
}

fn spawn_ticker(tx: mpsc::UnboundedSender<Message>, interval: Duration, kind: TickKind) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick of tokio's interval fires immediately; skip it so
        // a 6h cadence does not fire at launch
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if tx.send(Message::Tick(kind)).is_err() {
                return;
            }
        }
    });
}

/// Blocking crossterm reads on a dedicated thread, translated into the
/// renderer-agnostic key space.
fn spawn_input_reader(tx: mpsc::UnboundedSender<Message>) {
    tokio::task::spawn_blocking(move || loop {
        match event::poll(Duration::from_millis(250)) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(_) => return,
        }
        let Ok(ev) = event::read() else { return };
        let msg = match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                translate_key(key.code).map(Message::Key)
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => Some(Message::MouseScroll(-1)),
                MouseEventKind::ScrollDown => Some(Message::MouseScroll(1)),
                _ => None,
            },
            Event::Resize(width, height) => Some(Message::Resize { width, height }),
            _ => None,
        };
        if let Some(msg) = msg {
            if tx.send(msg).is_err() {
                return;
            }
        }
    });
}

fn translate_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::PageUp => Some(Key::PageUp),
        KeyCode::PageDown => Some(Key::PageDown),
        KeyCode::Home => Some(Key::Home),
        KeyCode::End => Some(Key::End),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}
