use std::time::Duration;

use glam::Vec2;
use web_time::Instant;

use super::event::Modifiers;
use crate::scene::PartKey;
use crate::state::SelectMode;

/// A resolved pointer trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// The window elapsed without a second trigger. `part` is `None` when
    /// the trigger hit the background.
    Select {
        /// Part under the pointer.
        part: Option<PartKey>,
        /// Replace or toggle.
        mode: SelectMode,
    },
    /// A second trigger arrived inside the window: apply the first trigger's
    /// selection, then isolate the selection.
    SelectThenIsolate {
        /// Part under the first trigger.
        part: Option<PartKey>,
        /// Mode of the first trigger.
        mode: SelectMode,
    },
}

#[derive(Debug, Clone, Copy)]
struct Press {
    position: Vec2,
    part: Option<PartKey>,
    dragging: bool,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    part: Option<PartKey>,
    mode: SelectMode,
    deadline: Instant,
}

/// Drag detection and single/second-trigger disambiguation.
///
/// A trigger (press and release over the same part without dragging)
/// opens a window with an explicit deadline. The deadline is checked on
/// every event and on [`Self::poll`]; nothing fires on its own.
#[derive(Debug, Clone)]
pub struct TriggerResolver {
    window: Duration,
    drag_threshold: f32,
    press: Option<Press>,
    pending: Option<Pending>,
}

impl TriggerResolver {
    /// Resolver with the given second-trigger window and drag threshold (in
    /// normalized coordinates).
    #[must_use]
    pub fn new(window: Duration, drag_threshold: f32) -> Self {
        Self {
            window,
            drag_threshold,
            press: None,
            pending: None,
        }
    }

    /// Record a press at `position` over `part`.
    pub fn pointer_down(
        &mut self,
        position: Vec2,
        part: Option<PartKey>,
        now: Instant,
    ) -> Option<TriggerAction> {
        self.press = Some(Press {
            position,
            part,
            dragging: false,
        });
        self.poll(now)
    }

    /// Track movement; leaving the drag threshold turns the press into a
    /// drag, which never triggers.
    pub fn pointer_move(&mut self, position: Vec2, now: Instant) -> Option<TriggerAction> {
        if let Some(press) = &mut self.press {
            if press.position.distance(position) > self.drag_threshold {
                press.dragging = true;
            }
        }
        self.poll(now)
    }

    /// Whether the current press has become a drag.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.press.is_some_and(|p| p.dragging)
    }

    /// Process a release over `part`.
    pub fn pointer_up(
        &mut self,
        part: Option<PartKey>,
        modifiers: Modifiers,
        now: Instant,
    ) -> Option<TriggerAction> {
        let expired = self.poll(now);
        let Some(press) = self.press.take() else {
            return expired;
        };
        // A cancelled press leaves an open window to resolve at its deadline.
        if press.dragging || press.part != part {
            return expired;
        }
        if let Some(first) = self.pending.take() {
            return Some(TriggerAction::SelectThenIsolate {
                part: first.part,
                mode: first.mode,
            });
        }
        let mode = if modifiers.toggles() {
            SelectMode::Toggle
        } else {
            SelectMode::Replace
        };
        self.pending = Some(Pending {
            part,
            mode,
            deadline: now + self.window,
        });
        expired
    }

    /// Resolve a pending trigger whose window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<TriggerAction> {
        let pending = self.pending.take_if(|p| now >= p.deadline)?;
        Some(TriggerAction::Select {
            part: pending.part,
            mode: pending.mode,
        })
    }

    /// Deadline of the open window, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }
}
