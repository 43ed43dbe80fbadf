//! Color-state encoder: a pure function from base appearance and part
//! state to the bytes written into the merged color arrays.

use crate::options::DisplayOptions;
use crate::scene::Appearance;

/// Interaction flags of one part, gathered from the state holders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartState {
    /// Hidden parts keep their geometry but draw nothing.
    pub hidden: bool,
    /// Explicit user color and opacity.
    pub custom: Option<Appearance>,
    /// Member of the selection.
    pub selected: bool,
    /// Faded out by isolation.
    pub isolated: bool,
    /// Under the pointer.
    pub highlighted: bool,
}

/// Resolve the appearance a part is drawn with.
///
/// Layers are ordered hidden > custom color > selection > isolation fade >
/// highlight > base. The winning layer replaces everything below it; the
/// base is only read, so dropping every overlay yields it back exactly.
#[must_use]
pub fn encode(
    base: Appearance,
    state: PartState,
    display: &DisplayOptions,
) -> Appearance {
    if state.hidden {
        return Appearance::new(base.color, 0);
    }
    if let Some(custom) = state.custom {
        return custom;
    }
    if state.selected {
        return display.selection;
    }
    if state.isolated {
        return Appearance::new(
            display.isolation_tint.unwrap_or(base.color),
            display.isolation_opacity,
        );
    }
    if state.highlighted {
        return display.highlight;
    }
    base
}
