//! panelsync panel
//!
//! A terminal control panel. Connects to a relay, joins a room and keeps
//! the panel's variables in sync with whatever peer shares the room.
//!
//! Usage:
//!   panelsync-panel --url ws://127.0.0.1:3000/ws --room room-x
//!
//! Type `btn1` to flip a toggle or `key=value` to set a variable.

use anyhow::{Context, Result};
use clap::Parser;
use panelsync_panel::{TerminalUi, read_inputs};
use panelsync_sync::{ControllerConfig, ReconnectPolicy, SyncController, WsTransport};
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "panelsync-panel")]
#[command(about = "panelsync terminal control panel")]
struct Args {
    /// Relay WebSocket URL
    #[arg(short, long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// JSON controller config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Room to join (overrides the config)
    #[arg(short, long)]
    room: Option<String>,

    /// Confirmation window in milliseconds (overrides the config)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Apply edits without waiting for confirmation
    #[arg(long)]
    no_confirm: bool,

    /// Exit when the relay connection drops instead of retrying
    #[arg(long)]
    no_reconnect: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let mut config = match &args.config {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ControllerConfig::default(),
    };
    if let Some(room) = args.room {
        config.room = room;
    }
    if let Some(ms) = args.timeout_ms {
        config.round_trip_timeout_ms = ms;
    }
    if args.no_confirm {
        config.enabled = false;
    }
    config.validate().context("Invalid configuration")?;

    let policy = if args.no_reconnect {
        ReconnectPolicy::disabled()
    } else {
        ReconnectPolicy::default()
    };
    let (transport, events) = WsTransport::connect_with(&args.url, policy)
        .await
        .with_context(|| format!("Failed to reach relay at {}", args.url))?;

    let ui = TerminalUi::new(&config.controls);
    let (inputs_tx, inputs_rx) = mpsc::channel(32);
    let reader_ui = ui.clone();
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = read_inputs(stdin, reader_ui, inputs_tx).await {
            warn!("stdin closed: {}", e);
        }
    });

    info!("Joining {} via {}", config.room, args.url);
    let controller = SyncController::new(config, ui, transport)?;
    let controller = controller.run(inputs_rx, events).await?;
    info!("Final variables: {}", controller.store().values());
    Ok(())
}
