//! WebSocket client transport.

use crate::error::{SyncError, SyncResult};
use crate::protocol::{Delivery, PanelEvent};
use crate::transport::{PanelTransport, TransportEvent};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

/// Capacity of the incoming event channel.
const EVENT_BUFFER: usize = 64;

/// Capacity of the outgoing frame queue.
const OUTGOING_BUFFER: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How the transport retries after losing the relay.
///
/// Each failed attempt doubles the delay, up to `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever; `Some(0)` never reconnects.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that gives up as soon as the connection drops.
    pub fn disabled() -> Self {
        Self {
            max_attempts: Some(0),
            ..Self::default()
        }
    }
}

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The relay went away; reconnect if the policy allows.
    Lost,
    /// We closed it, or nobody is listening any more.
    Closed,
}

/// A [`PanelTransport`] over a WebSocket connection to a relay.
///
/// The connection is owned by a background task that reads frames, writes
/// queued events and reconnects per the [`ReconnectPolicy`]. Events are
/// delivered through the channel returned by [`WsTransport::connect`]: it
/// starts with `Connected`, reports every `Disconnected`/`Connected` pair
/// while reconnecting, and closes once the task gives up or is closed.
pub struct WsTransport {
    outgoing: mpsc::Sender<Message>,
    connected: Arc<AtomicBool>,
    session: JoinHandle<()>,
}

impl WsTransport {
    /// Connects to `url` (e.g. `ws://127.0.0.1:3000/ws`) with the default
    /// reconnect policy.
    pub async fn connect(url: &str) -> SyncResult<(Self, mpsc::Receiver<TransportEvent>)> {
        Self::connect_with(url, ReconnectPolicy::default()).await
    }

    /// Connects to `url`. The first attempt must succeed; later drops are
    /// retried per `policy`.
    pub async fn connect_with(
        url: &str,
        policy: ReconnectPolicy,
    ) -> SyncResult<(Self, mpsc::Receiver<TransportEvent>)> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| SyncError::Network(format!("connect to {url} failed: {e}")))?;
        info!("Connected to {}", url);

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        events_tx
            .send(TransportEvent::Connected)
            .await
            .map_err(|_| SyncError::ChannelClosed)?;

        let (outgoing, outgoing_rx) = mpsc::channel(OUTGOING_BUFFER);
        let connected = Arc::new(AtomicBool::new(true));
        let session = tokio::spawn(run_session(
            url.to_string(),
            stream,
            policy,
            connected.clone(),
            outgoing_rx,
            events_tx,
        ));

        Ok((
            Self {
                outgoing,
                connected,
                session,
            },
            events_rx,
        ))
    }

    /// Sends a close frame. The transport does not reconnect afterwards.
    pub async fn close(&mut self) -> SyncResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.outgoing
            .send(Message::Close(None))
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.session.abort();
    }
}

#[async_trait]
impl PanelTransport for WsTransport {
    async fn emit(&mut self, event: PanelEvent, delivery: Delivery) -> SyncResult<()> {
        if !self.is_connected() {
            return match delivery {
                Delivery::BestEffort => {
                    debug!("Dropping {} while disconnected", event.name());
                    Ok(())
                }
                Delivery::Reliable => Err(SyncError::NotConnected),
            };
        }
        let text = event.to_text()?;
        self.outgoing
            .send(Message::text(text))
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

// ── Session task ────────────────────────────────────────────────

async fn run_session(
    url: String,
    mut stream: WsStream,
    policy: ReconnectPolicy,
    connected: Arc<AtomicBool>,
    mut outgoing: mpsc::Receiver<Message>,
    events: mpsc::Sender<TransportEvent>,
) {
    loop {
        let end = pump(stream, &mut outgoing, &events).await;
        connected.store(false, Ordering::SeqCst);
        if events.send(TransportEvent::Disconnected).await.is_err() {
            return;
        }
        if end == SessionEnd::Closed {
            debug!("Connection to {} closed", url);
            return;
        }
        warn!("Lost connection to {}", url);

        // Frames queued for the dead connection are stale.
        while outgoing.try_recv().is_ok() {}

        let Some(next) = reconnect(&url, &policy, &mut outgoing).await else {
            return;
        };
        stream = next;
        connected.store(true, Ordering::SeqCst);
        if events.send(TransportEvent::Connected).await.is_err() {
            return;
        }
    }
}

/// Moves frames both ways until the connection ends.
async fn pump(
    stream: WsStream,
    outgoing: &mut mpsc::Receiver<Message>,
    events: &mpsc::Sender<TransportEvent>,
) -> SessionEnd {
    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match PanelEvent::from_text(text.as_str()) {
                    Ok(event) => {
                        debug!("Received {}", event.name());
                        if events.send(TransportEvent::Message(event)).await.is_err() {
                            return SessionEnd::Closed;
                        }
                    }
                    Err(e) => warn!("Dropping frame: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Lost,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket read failed: {}", e);
                    return SessionEnd::Lost;
                }
            },
            out = outgoing.recv() => match out {
                Some(message @ Message::Close(_)) => {
                    if let Err(e) = sink.send(message).await {
                        debug!("Close frame not sent: {}", e);
                    }
                    return SessionEnd::Closed;
                }
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        warn!("WebSocket write failed: {}", e);
                        return SessionEnd::Lost;
                    }
                }
                None => {
                    if let Err(e) = sink.close().await {
                        debug!("Close failed: {}", e);
                    }
                    return SessionEnd::Closed;
                }
            },
        }
    }
}

/// Retries with backoff. `None` when the policy gives up or the transport
/// is closed meanwhile.
async fn reconnect(
    url: &str,
    policy: &ReconnectPolicy,
    outgoing: &mut mpsc::Receiver<Message>,
) -> Option<WsStream> {
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 0;
    loop {
        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            warn!("Giving up on {} after {} attempt(s)", url, attempt);
            return None;
        }
        attempt += 1;
        if !backoff(delay, outgoing).await {
            return None;
        }
        match connect_async(url).await {
            Ok((stream, _)) => {
                info!("Reconnected to {} (attempt {})", url, attempt);
                return Some(stream);
            }
            Err(e) => debug!("Reconnect attempt {} to {} failed: {}", attempt, url, e),
        }
        delay = (delay * 2).min(policy.max_delay);
    }
}

/// Sleeps for `delay`. Returns `false` if the transport was closed first.
async fn backoff(delay: Duration, outgoing: &mut mpsc::Receiver<Message>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return true,
            out = outgoing.recv() => match out {
                Some(Message::Close(_)) | None => return false,
                Some(_) => debug!("Dropping outgoing frame while reconnecting"),
            },
        }
    }
}
