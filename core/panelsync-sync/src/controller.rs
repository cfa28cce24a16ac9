//! Sync controller: bridges widgets and the transport to the store.
//!
//! The controller owns the store, the widget layer and the transport, and
//! runs on a single event loop: input events, transport events and the
//! watchdog are handled one at a time, so the store is never touched
//! concurrently.
//!
//! Every round trip ends in the same supervision pass: roll back if still
//! unconfirmed, refresh the widgets, reset the store to idle, and unlock.

use crate::config::ControllerConfig;
use crate::error::SyncResult;
use crate::protocol::{Delivery, PanelEvent};
use crate::store::VariableStore;
use crate::timer::Firing;
use crate::transport::{PanelTransport, TransportEvent};
use crate::image;
use crate::ui::{InputEvent, PanelUi, WidgetKind};
use panelsync_types::{FramePayload, Payload, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Drives one panel: one store, one widget layer, one connection.
pub struct SyncController<U, T> {
    config: ControllerConfig,
    store: VariableStore,
    ui: U,
    transport: T,
    connected: bool,
    locked: bool,
}

impl<U: PanelUi, T: PanelTransport> SyncController<U, T> {
    /// Builds the controller and paints the initial values.
    pub fn new(config: ControllerConfig, ui: U, transport: T) -> SyncResult<Self> {
        config.validate()?;
        let store = VariableStore::new(config.initial_variables(), config.round_trip_timeout())
            .with_enabled(config.enabled);
        let mut controller = Self {
            config,
            store,
            ui,
            transport,
            connected: false,
            locked: false,
        };
        let indicator = controller.config.status_indicator.clone();
        controller.ui.set_checked(&indicator, false);
        controller.refresh_ui();
        Ok(controller)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether input widgets are disabled awaiting confirmation.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    // ── Local edits ──────────────────────────────────────────────

    /// Applies a local edit optimistically, sends the whole set, and opens
    /// the confirmation window.
    ///
    /// A failed send is not an error here: the window still expires and
    /// rolls the edit back.
    pub async fn update_variable(&mut self, key: &str, value: Value) -> SyncResult<()> {
        self.store.set(key, value, true, false)?;
        info!("Local edit {} = {}, sending {}", key, value, self.store.values());

        let update = PanelEvent::SendUpdate(Payload::from(self.store.values().clone()));
        if let Err(e) = self.transport.emit(update, Delivery::Reliable).await {
            warn!("Failed to send update: {}", e);
        }

        if self.store.is_enabled() {
            self.lock_ui();
            self.store.wait_response();
        }
        Ok(())
    }

    /// Handles an input event from the widget layer.
    pub async fn handle_input(&mut self, input: InputEvent) -> SyncResult<()> {
        match input {
            InputEvent::Changed { key, value } => self.update_variable(&key, value).await,
            InputEvent::Activated { key } => {
                let value = self
                    .ui
                    .value(&key)
                    .ok_or_else(|| panelsync_types::Error::UnknownKey(key.clone()))?;
                self.update_variable(&key, value).await
            }
        }
    }

    // ── Supervision ──────────────────────────────────────────────

    /// Settles the current round trip: rolls back if unconfirmed, refreshes
    /// every widget, resets the store to idle and unlocks the panel.
    pub fn supervise(&mut self) {
        if self.store.check_streaming_fail() {
            warn!("No confirmation from peer, rolled back to {}", self.store.values());
        }
        self.refresh_ui();
        self.store.reset_streaming_status();
        self.unlock_ui();
    }

    fn settle(&mut self, firing: Firing) {
        if firing == Firing::Immediate {
            self.supervise();
        }
    }

    // ── Remote traffic ───────────────────────────────────────────

    /// Applies an authoritative set from the peer and acknowledges it with
    /// `reply`.
    ///
    /// A malformed payload is rejected and nothing changes, locally or on
    /// the wire.
    pub async fn receive_variables(&mut self, data: Payload, reply: PanelEvent) -> SyncResult<()> {
        let firing = match self.store.update(data) {
            Ok(firing) => firing,
            Err(e) => {
                warn!("Rejected incoming variables: {}", e);
                return Err(e);
            }
        };
        info!("Received {}", self.store.values());
        self.refresh_ui();
        self.settle(firing);
        self.transport.emit(reply, Delivery::BestEffort).await
    }

    /// The peer confirmed the last change.
    pub fn acknowledged(&mut self) {
        let firing = self.store.streamed_successfully();
        self.settle(firing);
    }

    /// Answers a state request with the current set, without locking.
    pub async fn serve_state_request(&mut self) -> SyncResult<()> {
        debug!("Serving state request");
        let push = PanelEvent::PushState(Payload::from(self.store.values().clone()));
        self.transport.emit(push, Delivery::Reliable).await
    }

    /// Reflects the connection status; on connect, joins the room and asks
    /// for the peer's state.
    pub async fn connection_changed(&mut self, connected: bool) -> SyncResult<()> {
        self.connected = connected;
        let indicator = self.config.status_indicator.clone();
        self.ui.set_checked(&indicator, connected);
        if !connected {
            warn!("Disconnected from peer");
            return Ok(());
        }
        info!("Connected, joining {}", self.config.room);
        let join = PanelEvent::JoinRoom(self.config.room.clone());
        self.transport.emit(join, Delivery::Reliable).await?;
        if self.config.request_state_on_connect {
            self.transport
                .emit(PanelEvent::RequestState, Delivery::Reliable)
                .await?;
        }
        Ok(())
    }

    /// Shows a video frame on the image element.
    pub fn show_frame(&mut self, frame: &FramePayload) {
        let Some(data) = frame.channel(&self.config.video_channel) else {
            return;
        };
        match image::data_uri(data) {
            Ok(Some(source)) => {
                let element = self.config.image_element.clone();
                self.ui.set_image_source(&element, &source);
            }
            Ok(None) => {}
            Err(e) => warn!("Dropping video frame: {}", e),
        }
    }

    /// Dispatches a transport event.
    pub async fn handle_transport(&mut self, event: TransportEvent) -> SyncResult<()> {
        match event {
            TransportEvent::Connected => self.connection_changed(true).await,
            TransportEvent::Disconnected => self.connection_changed(false).await,
            TransportEvent::Message(message) => match message {
                PanelEvent::PushState(data) => {
                    self.receive_variables(data, PanelEvent::AckState).await
                }
                PanelEvent::SendUpdate(data) => {
                    self.receive_variables(data, PanelEvent::AckUpdate).await
                }
                PanelEvent::AckUpdate | PanelEvent::AckState => {
                    self.acknowledged();
                    Ok(())
                }
                PanelEvent::RequestState => self.serve_state_request().await,
                PanelEvent::VideoFrame(frame) => {
                    self.show_frame(&frame);
                    Ok(())
                }
                PanelEvent::JoinRoom(room) => {
                    debug!("Ignoring join-room {} from peer", room);
                    Ok(())
                }
            },
        }
    }

    // ── Event loop ───────────────────────────────────────────────

    /// Runs until both channels close, then returns the controller.
    ///
    /// After the startup grace delay a supervision pass runs once
    /// unconditionally, so the panel is never left locked when the initial
    /// state request goes unanswered. Handler errors are logged and do not
    /// stop the loop.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<InputEvent>,
        mut events: mpsc::Receiver<TransportEvent>,
    ) -> SyncResult<Self> {
        let grace = tokio::time::sleep(self.config.startup_grace());
        tokio::pin!(grace);
        let mut grace_pending = true;
        let mut inputs_open = true;
        let mut events_open = true;

        while inputs_open || events_open {
            tokio::select! {
                () = &mut grace, if grace_pending => {
                    grace_pending = false;
                    debug!("Startup supervision pass");
                    self.supervise();
                }
                () = self.store.expired() => {
                    debug!("Watchdog expired");
                    self.supervise();
                }
                input = inputs.recv(), if inputs_open => match input {
                    Some(input) => {
                        if let Err(e) = self.handle_input(input).await {
                            warn!("Input rejected: {}", e);
                        }
                    }
                    None => inputs_open = false,
                },
                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        if let Err(e) = self.handle_transport(event).await {
                            warn!("Transport event failed: {}", e);
                        }
                    }
                    None => events_open = false,
                },
            }
        }

        self.store.stop();
        Ok(self)
    }

    // ── Widgets ──────────────────────────────────────────────────

    /// Paints every bound widget from the store.
    pub fn refresh_ui(&mut self) {
        for control in &self.config.controls {
            let Some(value) = self.store.get(&control.key) else {
                continue;
            };
            match (control.widget, value) {
                (WidgetKind::Toggle, Value::Bool(checked)) => {
                    self.ui.set_checked(&control.key, checked)
                }
                (WidgetKind::Slider, Value::Number(n)) => self.ui.set_value(&control.key, n),
                (_, value) => self.ui.set_text(&control.key, &value.to_string()),
            }
        }
    }

    fn lock_ui(&mut self) {
        self.set_inputs_enabled(false);
        self.locked = true;
    }

    fn unlock_ui(&mut self) {
        self.set_inputs_enabled(true);
        self.locked = false;
    }

    fn set_inputs_enabled(&mut self, enabled: bool) {
        for control in self.config.controls.iter().filter(|c| c.widget.is_input()) {
            self.ui.set_enabled(&control.key, enabled);
        }
    }
}

impl<U, T> std::fmt::Debug for SyncController<U, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("store", &self.store)
            .field("connected", &self.connected)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}
