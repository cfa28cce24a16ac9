//! panelsync relay
//!
//! Carries protocol events between control panels and the peers they
//! drive. Both sides join the same room; the relay forwards everything
//! else within the room.
//!
//! Usage:
//!   panelsync-relay --port 3000
//!
//! The relay holds no variable state of its own.

use anyhow::{Context, Result};
use clap::Parser;
use panelsync_relay::{Hub, RELAY_VERSION, build_router};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "panelsync-relay")]
#[command(about = "panelsync room relay")]
struct Args {
    /// Port to listen on (HTTP and WebSocket)
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

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

    info!("{} starting...", RELAY_VERSION);
    let app = build_router(Arc::new(Hub::new()));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {} (WebSocket at /ws)", addr);

    axum::serve(listener, app).await.context("Relay server failed")?;
    Ok(())
}
