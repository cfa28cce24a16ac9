//! Typed unions resolved once at the transport edge.

use crate::{Result, VariableSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A variable set as it arrives from a peer: either already structured, or
/// still in its serialized text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Parsed(VariableSet),
    Raw(String),
}

impl Payload {
    /// Resolves the payload into a variable set, parsing text if needed.
    pub fn into_variables(self) -> Result<VariableSet> {
        match self {
            Self::Parsed(set) => Ok(set),
            Self::Raw(text) => VariableSet::from_json(&text),
        }
    }
}

impl From<VariableSet> for Payload {
    fn from(set: VariableSet) -> Self {
        Self::Parsed(set)
    }
}

/// A video frame: either a bare base64 image, or one image per named
/// camera channel (`{"webcam": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FramePayload {
    Encoded(String),
    Channels(BTreeMap<String, String>),
}

impl FramePayload {
    /// Returns the encoded image for `channel`.
    ///
    /// A bare frame belongs to every channel.
    pub fn channel(&self, channel: &str) -> Option<&str> {
        match self {
            Self::Encoded(data) => Some(data),
            Self::Channels(channels) => channels.get(channel).map(String::as_str),
        }
    }
}
