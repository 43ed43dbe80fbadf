use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scene::Appearance;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Display", inline)]
#[serde(default)]
/// Overlay colors applied by the color-state encoder.
pub struct DisplayOptions {
    /// Appearance of selected parts.
    #[schemars(title = "Selection")]
    pub selection: Appearance,
    /// Appearance of the hovered part.
    #[schemars(title = "Highlight")]
    pub highlight: Appearance,
    /// Opacity of parts faded out by isolation.
    #[schemars(title = "Isolation Opacity", range(min = 0, max = 255))]
    pub isolation_opacity: u8,
    /// Color of parts faded out by isolation (`None` keeps the base color).
    #[schemars(title = "Isolation Tint")]
    pub isolation_tint: Option<[u8; 3]>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            selection: Appearance::opaque([255, 170, 0]),
            highlight: Appearance::opaque([102, 178, 255]),
            isolation_opacity: 38,
            isolation_tint: None,
        }
    }
}
