//! A [`PanelUi`] that renders to the log.

use panelsync_sync::{ControlBinding, PanelUi, WidgetKind};
use panelsync_types::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
struct Element {
    checked: Option<bool>,
    value: Option<f64>,
    text: Option<String>,
    disabled: bool,
    frames: u64,
}

/// Widget state shared between the controller and the stdin reader.
/// Clones share state.
#[derive(Debug, Clone)]
pub struct TerminalUi {
    elements: Arc<Mutex<HashMap<String, Element>>>,
    toggles: Arc<HashSet<String>>,
}

impl TerminalUi {
    /// Only controls bound as [`WidgetKind::Toggle`] can be flipped from
    /// the keyboard; indicators painted with a checked state cannot.
    pub fn new(controls: &[ControlBinding]) -> Self {
        Self {
            elements: Arc::default(),
            toggles: Arc::new(
                controls
                    .iter()
                    .filter(|c| c.widget == WidgetKind::Toggle)
                    .map(|c| c.key.clone())
                    .collect(),
            ),
        }
    }

    fn elements(&self) -> MutexGuard<'_, HashMap<String, Element>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with(&self, element: &str, f: impl FnOnce(&mut Element)) {
        f(self.elements().entry(element.to_string()).or_default());
    }

    /// Whether the element currently accepts input.
    pub fn is_enabled(&self, element: &str) -> bool {
        self.elements().get(element).is_none_or(|e| !e.disabled)
    }

    /// Whether the element is bound to a toggle control.
    pub fn is_toggle(&self, element: &str) -> bool {
        self.toggles.contains(element)
    }

    /// Flips a toggle the way a click would. Returns the new state, or
    /// `None` when the element is not a painted toggle control.
    pub fn toggle(&self, element: &str) -> Option<bool> {
        if !self.is_toggle(element) {
            return None;
        }
        let mut elements = self.elements();
        let state = elements.get_mut(element)?;
        let checked = !state.checked?;
        state.checked = Some(checked);
        Some(checked)
    }

    /// Video frames shown on `element` so far.
    pub fn frames_shown(&self, element: &str) -> u64 {
        self.elements().get(element).map_or(0, |e| e.frames)
    }

    pub fn text(&self, element: &str) -> Option<String> {
        self.elements().get(element).and_then(|e| e.text.clone())
    }
}

impl PanelUi for TerminalUi {
    fn set_checked(&mut self, element: &str, checked: bool) {
        self.with(element, |e| e.checked = Some(checked));
        info!("{} [{}]", element, if checked { "on" } else { "off" });
    }

    fn set_value(&mut self, element: &str, value: f64) {
        self.with(element, |e| e.value = Some(value));
        info!("{} = {}", element, value);
    }

    fn set_text(&mut self, element: &str, text: &str) {
        self.with(element, |e| e.text = Some(text.to_string()));
        info!("{}: {}", element, text);
    }

    fn set_enabled(&mut self, element: &str, enabled: bool) {
        self.with(element, |e| e.disabled = !enabled);
        debug!("{} {}", element, if enabled { "unlocked" } else { "locked" });
    }

    fn set_image_source(&mut self, element: &str, source: &str) {
        self.with(element, |e| e.frames += 1);
        debug!("{} frame ({} bytes)", element, source.len());
    }

    fn value(&self, element: &str) -> Option<Value> {
        let elements = self.elements();
        let e = elements.get(element)?;
        e.checked
            .map(Value::Bool)
            .or_else(|| e.value.map(Value::Number))
    }
}
