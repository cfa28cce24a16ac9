//! Protocol events exchanged between a panel and its peer.
//!
//! Events travel as JSON text frames of the form
//! `{"event": "<name>", "data": <payload>}`:
//!
//! | event | data | meaning |
//! |---|---|---|
//! | `join-room` | room name | attach to a logical channel on the relay |
//! | `request-state` | none | ask the peer for its authoritative set |
//! | `push-state` | variable set | authoritative full set from the peer |
//! | `send-update` | variable set | a local edit, sent optimistically |
//! | `ack-update` | none | the peer accepted a `send-update` |
//! | `ack-state` | none | the receiver applied a `push-state` |
//! | `video-frame` | frame | base64 image, bare or keyed by channel |

use crate::error::{SyncError, SyncResult};
use panelsync_types::{FramePayload, Payload};
use serde::{Deserialize, Serialize};

/// Default room both ends join when none is configured.
pub const DEFAULT_ROOM: &str = "room-x";

/// A protocol event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum PanelEvent {
    JoinRoom(String),
    RequestState,
    PushState(Payload),
    SendUpdate(Payload),
    AckUpdate,
    AckState,
    VideoFrame(FramePayload),
}

impl PanelEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "join-room",
            Self::RequestState => "request-state",
            Self::PushState(_) => "push-state",
            Self::SendUpdate(_) => "send-update",
            Self::AckUpdate => "ack-update",
            Self::AckState => "ack-state",
            Self::VideoFrame(_) => "video-frame",
        }
    }

    /// Whether this event carries a variable set.
    pub fn carries_variables(&self) -> bool {
        matches!(self, Self::PushState(_) | Self::SendUpdate(_))
    }

    /// Encodes the event as a text frame.
    pub fn to_text(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes an event from a text frame.
    pub fn from_text(text: &str) -> SyncResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| SyncError::Protocol(format!("undecodable event: {e}")))
    }
}

/// How an outgoing event should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Fail if the event cannot be handed to the connection.
    Reliable,
    /// Silently drop the event while disconnected.
    BestEffort,
}
