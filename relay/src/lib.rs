//! Room hub and HTTP API for the panelsync relay.
//!
//! Clients connect over WebSocket at `/ws` and send `join-room` first. Every
//! other event is forwarded verbatim to the other members of the sender's
//! room; the relay never interprets variable sets.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::{Router, extract::State, response::Json, response::Response, routing::get};
use futures::{SinkExt, StreamExt};
use panelsync_sync::PanelEvent;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const RELAY_VERSION: &str = concat!("panelsync-relay/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusResponse {
    /// Members per room.
    pub rooms: BTreeMap<String, usize>,
    /// Open WebSocket connections, joined or not.
    pub clients: usize,
    pub relay_version: String,
}

type Outbox = mpsc::UnboundedSender<String>;

/// Room membership for all connected clients.
#[derive(Default)]
pub struct Hub {
    rooms: RwLock<HashMap<String, HashMap<Uuid, Outbox>>>,
    clients: AtomicUsize,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `client` in `room`, leaving any room it was in before.
    pub async fn join(&self, room: &str, client: Uuid, outbox: Outbox) {
        let mut rooms = self.rooms.write().await;
        for members in rooms.values_mut() {
            members.remove(&client);
        }
        rooms.retain(|_, members| !members.is_empty());
        rooms
            .entry(room.to_string())
            .or_default()
            .insert(client, outbox);
        info!("Client {} joined {}", client, room);
    }

    /// Removes `client` from every room.
    pub async fn leave(&self, client: Uuid) {
        let mut rooms = self.rooms.write().await;
        for members in rooms.values_mut() {
            members.remove(&client);
        }
        rooms.retain(|_, members| !members.is_empty());
    }

    /// Sends `text` to every member of `room` except `from`. Returns how
    /// many members it was handed to.
    pub async fn forward(&self, room: &str, from: Uuid, text: &str) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room) else {
            return 0;
        };
        members
            .iter()
            .filter(|(id, _)| **id != from)
            .filter(|(_, outbox)| outbox.send(text.to_string()).is_ok())
            .count()
    }

    pub async fn status(&self) -> StatusResponse {
        let rooms = self.rooms.read().await;
        StatusResponse {
            rooms: rooms
                .iter()
                .map(|(name, members)| (name.clone(), members.len()))
                .collect(),
            clients: self.clients.load(Ordering::SeqCst),
            relay_version: RELAY_VERSION.to_string(),
        }
    }
}

async fn hello_handler() -> &'static str {
    "Hello, world."
}

async fn status_handler(State(hub): State<Arc<Hub>>) -> Json<StatusResponse> {
    Json(hub.status().await)
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> Response {
    ws.on_upgrade(move |socket| serve_client(socket, hub))
}

async fn serve_client(socket: WebSocket, hub: Arc<Hub>) {
    let id = Uuid::new_v4();
    hub.clients.fetch_add(1, Ordering::SeqCst);
    debug!("Client {} connected", id);

    let (mut sink, mut stream) = socket.split();
    let (outbox, mut inbox) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(text) = inbox.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut room: Option<String> = None;
    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        match PanelEvent::from_text(text.as_str()) {
            Ok(PanelEvent::JoinRoom(name)) => {
                hub.join(&name, id, outbox.clone()).await;
                room = Some(name);
            }
            Ok(event) => match &room {
                Some(name) => {
                    let delivered = hub.forward(name, id, text.as_str()).await;
                    debug!("{} from {} reached {} peer(s)", event.name(), id, delivered);
                }
                None => warn!("Client {} sent {} before joining a room", id, event.name()),
            },
            Err(e) => warn!("Client {}: {}", id, e),
        }
    }

    hub.leave(id).await;
    hub.clients.fetch_sub(1, Ordering::SeqCst);
    writer.abort();
    debug!("Client {} disconnected", id);
}

/// Build the relay router around a shared hub.
pub fn build_router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/", get(hello_handler))
        .route("/api/v1/status", get(status_handler))
        .route("/ws", get(ws_handler))
        .with_state(hub)
}
