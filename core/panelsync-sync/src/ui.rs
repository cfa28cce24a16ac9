//! Widget layer abstraction.
//!
//! The controller drives widgets by element id. Widgets only reflect state
//! and raise input events; they make no decisions.

use panelsync_types::Value;
use serde::{Deserialize, Serialize};

/// The kind of widget a variable is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    /// On/off button bound to a boolean.
    Toggle,
    /// Range input bound to a number.
    Slider,
    /// Read-only text showing the value.
    Label,
}

impl WidgetKind {
    /// Whether the widget accepts input and is locked during a round trip.
    pub fn is_input(&self) -> bool {
        !matches!(self, Self::Label)
    }
}

/// An input raised by the widget layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The widget reports its new value.
    Changed { key: String, value: Value },
    /// The widget was activated; its value is read back from the widget.
    Activated { key: String },
}

/// A widget layer the controller can drive.
pub trait PanelUi: Send {
    fn set_checked(&mut self, element: &str, checked: bool);

    fn set_value(&mut self, element: &str, value: f64);

    fn set_text(&mut self, element: &str, text: &str);

    fn set_enabled(&mut self, element: &str, enabled: bool);

    /// Sets an image element's source (a data URI).
    fn set_image_source(&mut self, element: &str, source: &str);

    /// Reads back the value an input widget currently shows.
    fn value(&self, element: &str) -> Option<Value>;
}

/// A recording widget layer for testing.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// What a single element currently shows.
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct WidgetState {
        pub checked: Option<bool>,
        pub value: Option<f64>,
        pub text: Option<String>,
        pub disabled: bool,
        pub image: Option<String>,
    }

    /// Keeps the last state of every element. Clones share state.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingUi {
        widgets: Arc<Mutex<HashMap<String, WidgetState>>>,
    }

    impl RecordingUi {
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of one element.
        pub fn widget(&self, element: &str) -> WidgetState {
            self.widgets
                .lock()
                .unwrap()
                .get(element)
                .cloned()
                .unwrap_or_default()
        }

        pub fn checked(&self, element: &str) -> Option<bool> {
            self.widget(element).checked
        }

        pub fn number(&self, element: &str) -> Option<f64> {
            self.widget(element).value
        }

        pub fn text(&self, element: &str) -> Option<String> {
            self.widget(element).text
        }

        pub fn is_enabled(&self, element: &str) -> bool {
            !self.widget(element).disabled
        }

        pub fn image(&self, element: &str) -> Option<String> {
            self.widget(element).image
        }

        /// Simulates the user flipping a toggle before it raises `Activated`.
        pub fn toggle(&self, element: &str) {
            let mut widgets = self.widgets.lock().unwrap();
            let state = widgets.entry(element.to_string()).or_default();
            state.checked = Some(!state.checked.unwrap_or(false));
        }

        fn with(&self, element: &str, f: impl FnOnce(&mut WidgetState)) {
            let mut widgets = self.widgets.lock().unwrap();
            f(widgets.entry(element.to_string()).or_default());
        }
    }

    impl PanelUi for RecordingUi {
        fn set_checked(&mut self, element: &str, checked: bool) {
            self.with(element, |w| w.checked = Some(checked));
        }

        fn set_value(&mut self, element: &str, value: f64) {
            self.with(element, |w| w.value = Some(value));
        }

        fn set_text(&mut self, element: &str, text: &str) {
            self.with(element, |w| w.text = Some(text.to_string()));
        }

        fn set_enabled(&mut self, element: &str, enabled: bool) {
            self.with(element, |w| w.disabled = !enabled);
        }

        fn set_image_source(&mut self, element: &str, source: &str) {
            self.with(element, |w| w.image = Some(source.to_string()));
        }

        fn value(&self, element: &str) -> Option<Value> {
            let widget = self.widget(element);
            widget
                .checked
                .map(Value::Bool)
                .or(widget.value.map(Value::Number))
        }
    }
}
