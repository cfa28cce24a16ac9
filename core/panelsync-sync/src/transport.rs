//! Transport layer abstraction.
//!
//! The controller only needs to emit events and know whether a connection
//! is up. Incoming traffic reaches it as [`TransportEvent`]s over a channel,
//! so a transport is free to read on its own task.

use crate::error::SyncResult;
use crate::protocol::{Delivery, PanelEvent};
use async_trait::async_trait;

/// Something that happened on the connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection came up (initially or after a reconnect).
    Connected,
    /// The connection dropped.
    Disconnected,
    /// The peer sent an event.
    Message(PanelEvent),
}

/// A connection that carries protocol events to the remote peer.
#[async_trait]
pub trait PanelTransport: Send {
    /// Sends an event.
    async fn emit(&mut self, event: PanelEvent, delivery: Delivery) -> SyncResult<()>;

    /// Returns whether the connection is up.
    fn is_connected(&self) -> bool;
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use crate::error::SyncError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records every emitted event. Clones share the same log and
    /// connection flag, so a test can keep a handle while the controller
    /// owns another.
    #[derive(Debug, Clone)]
    pub struct MockTransport {
        sent: Arc<Mutex<Vec<(PanelEvent, Delivery)>>>,
        connected: Arc<AtomicBool>,
    }

    impl MockTransport {
        /// Creates a connected mock transport.
        pub fn new() -> Self {
            Self {
                sent: Arc::new(Mutex::new(Vec::new())),
                connected: Arc::new(AtomicBool::new(true)),
            }
        }

        /// Marks the connection up or down.
        pub fn set_connected(&self, connected: bool) {
            self.connected.store(connected, Ordering::SeqCst);
        }

        /// All events sent so far, oldest first.
        pub fn sent(&self) -> Vec<PanelEvent> {
            self.sent.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
        }

        /// All events sent so far with their delivery mode.
        pub fn sent_with_delivery(&self) -> Vec<(PanelEvent, Delivery)> {
            self.sent.lock().unwrap().clone()
        }

        /// The most recent event.
        pub fn last_sent(&self) -> Option<PanelEvent> {
            self.sent.lock().unwrap().last().map(|(e, _)| e.clone())
        }

        /// Clears the log.
        pub fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PanelTransport for MockTransport {
        async fn emit(&mut self, event: PanelEvent, delivery: Delivery) -> SyncResult<()> {
            if !self.is_connected() {
                return match delivery {
                    Delivery::BestEffort => Ok(()),
                    Delivery::Reliable => Err(SyncError::NotConnected),
                };
            }
            self.sent.lock().unwrap().push((event, delivery));
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }
}
