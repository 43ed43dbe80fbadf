/// Modifier-key state accompanying a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Whether the shift key is held.
    pub shift: bool,
    /// Whether the control key is held.
    pub ctrl: bool,
    /// Whether the platform command key (⌘ / Windows) is held.
    pub meta: bool,
}

impl Modifiers {
    /// No modifier held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        meta: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        meta: false,
    };

    /// Whether a trigger with these modifiers toggles membership instead of
    /// replacing the selection.
    #[must_use]
    pub fn toggles(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}
