//! Controller configuration.

use crate::error::{SyncError, SyncResult};
use crate::protocol::DEFAULT_ROOM;
use crate::ui::WidgetKind;
use panelsync_types::{Value, ValueKind, VariableSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Binds a variable to the widget that shows it. The widget's element id is
/// the variable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlBinding {
    pub key: String,
    pub widget: WidgetKind,
    pub initial: Value,
}

impl ControlBinding {
    pub fn toggle(key: impl Into<String>, initial: bool) -> Self {
        Self {
            key: key.into(),
            widget: WidgetKind::Toggle,
            initial: Value::Bool(initial),
        }
    }

    pub fn slider(key: impl Into<String>, initial: f64) -> Self {
        Self {
            key: key.into(),
            widget: WidgetKind::Slider,
            initial: Value::Number(initial),
        }
    }

    pub fn label(key: impl Into<String>, initial: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            widget: WidgetKind::Label,
            initial: initial.into(),
        }
    }
}

/// Configuration for the sync controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Room joined on every (re)connect.
    pub room: String,
    /// Watchdog window for an optimistic edit (ms).
    pub round_trip_timeout_ms: u64,
    /// Delay before the unconditional startup supervision pass (ms).
    pub startup_grace_ms: u64,
    /// Whether edits lock the panel and wait for confirmation.
    pub enabled: bool,
    /// Whether to ask the peer for its state after connecting.
    pub request_state_on_connect: bool,
    /// Element showing the connection status.
    pub status_indicator: String,
    /// Image element for video frames.
    pub image_element: String,
    /// Camera channel shown when frames arrive keyed by channel.
    pub video_channel: String,
    /// The recognized control set.
    pub controls: Vec<ControlBinding>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            room: DEFAULT_ROOM.to_string(),
            round_trip_timeout_ms: 2_000,
            startup_grace_ms: 500,
            enabled: true,
            request_state_on_connect: true,
            status_indicator: "ledSocket".to_string(),
            image_element: "image".to_string(),
            video_channel: "webcam".to_string(),
            controls: vec![
                ControlBinding::toggle("btn1", false),
                ControlBinding::toggle("btn2", false),
                ControlBinding::toggle("btn3", false),
            ],
        }
    }
}

impl ControllerConfig {
    /// Parses a JSON config. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> SyncResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn round_trip_timeout(&self) -> Duration {
        Duration::from_millis(self.round_trip_timeout_ms)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }

    /// The initial variable set built from the bindings.
    pub fn initial_variables(&self) -> VariableSet {
        self.controls
            .iter()
            .map(|c| (c.key.clone(), c.initial))
            .collect()
    }

    /// Checks bindings for duplicates and widget/value mismatches.
    pub fn validate(&self) -> SyncResult<()> {
        if self.controls.is_empty() {
            return Err(SyncError::Config("no controls configured".into()));
        }
        let mut seen = HashSet::new();
        for control in &self.controls {
            if !seen.insert(control.key.as_str()) {
                return Err(SyncError::Config(format!(
                    "duplicate control: {}",
                    control.key
                )));
            }
            let expected = match control.widget {
                WidgetKind::Toggle => Some(ValueKind::Bool),
                WidgetKind::Slider => Some(ValueKind::Number),
                WidgetKind::Label => None,
            };
            if let Some(expected) = expected {
                if control.initial.kind() != expected {
                    return Err(SyncError::Config(format!(
                        "control {} needs a {expected} initial value",
                        control.key
                    )));
                }
            }
        }
        Ok(())
    }
}
