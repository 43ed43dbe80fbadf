use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Interaction", inline)]
#[serde(default)]
/// Pointer timing and drag parameters.
pub struct InteractionOptions {
    /// Window in which a second trigger turns a select into
    /// select-then-isolate, in milliseconds.
    #[schemars(title = "Double Trigger (ms)", range(min = 100, max = 1000))]
    pub double_trigger_ms: u64,
    /// Delay after the last pointer move before a hover pick runs, in
    /// milliseconds.
    #[schemars(title = "Hover Debounce (ms)", range(min = 0, max = 500))]
    pub hover_debounce_ms: u64,
    /// Pointer travel (normalized viewport units) that turns a press into
    /// a drag.
    #[schemars(skip)]
    pub drag_threshold: f32,
}

impl InteractionOptions {
    /// The double-trigger window as a [`Duration`].
    #[must_use]
    pub fn double_trigger_window(&self) -> Duration {
        Duration::from_millis(self.double_trigger_ms)
    }

    /// The hover debounce delay as a [`Duration`].
    #[must_use]
    pub fn hover_debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            double_trigger_ms: 300,
            hover_debounce_ms: 60,
            drag_threshold: 0.01,
        }
    }
}
