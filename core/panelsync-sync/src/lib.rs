//! Optimistic variable sync engine for panelsync.
//!
//! A panel mirrors a small set of named variables (switches, directions,
//! speeds) with a remote peer. Local edits are applied to the widgets
//! immediately and confirmed by a round trip; an edit the peer never
//! confirms is rolled back when its watchdog window expires.
//!
//! # Architecture
//!
//! - **Timer**: a one-shot, restartable delay used as the round-trip watchdog
//! - **Store**: current and backup variable sets plus the confirm-or-rollback
//!   state machine
//! - **Controller**: wires widget input and transport traffic to the store
//!   and owns the lock/unlock contract of the panel
//! - **Transport**: abstracts the connection to the peer; a WebSocket client
//!   and a mock are provided
//!
//! ## Round trip
//!
//! 1. **Edit**: the store snapshots the backup, writes the value and arms the watchdog
//! 2. **Send**: the whole set goes to the peer and the panel locks
//! 3. **Confirm**: an acknowledgement or a full push settles the round trip
//! 4. **Expire**: without confirmation the store restores the backup
//! 5. **Settle**: widgets are repainted and the panel unlocks
//!
//! # Example
//!
//! ```
//! use panelsync_sync::VariableStore;
//! use panelsync_types::{Value, VariableSet};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut store = VariableStore::new(
//!     VariableSet::new().with("speed", 0),
//!     Duration::from_secs(2),
//! );
//! store.set("speed", 5, true, false).unwrap();
//! assert_eq!(store.backup().get("speed"), Some(Value::Number(0.0)));
//!
//! // No confirmation arrived in time.
//! assert!(store.check_streaming_fail());
//! assert_eq!(store.get("speed"), Some(Value::Number(0.0)));
//! # }
//! ```

pub mod config;
pub mod controller;
mod error;
pub mod image;
pub mod protocol;
pub mod store;
pub mod timer;
pub mod transport;
pub mod ui;
pub mod ws;

pub use config::{ControlBinding, ControllerConfig};
pub use controller::SyncController;
pub use error::{SyncError, SyncResult};
pub use protocol::{DEFAULT_ROOM, Delivery, PanelEvent};
pub use store::{StreamingStatus, VariableStore};
pub use timer::{DelayTimer, Firing};
pub use transport::{PanelTransport, TransportEvent};
pub use ui::{InputEvent, PanelUi, WidgetKind};
pub use ws::{ReconnectPolicy, WsTransport};
