use std::time::Duration;

use glam::Vec2;
use web_time::Instant;

/// Delays hover picks until the pointer has rested for a fixed interval.
///
/// Every move pushes the deadline back, so at most one pick runs per pause
/// regardless of how many move events arrive.
#[derive(Debug, Clone)]
pub struct HoverDebouncer {
    delay: Duration,
    position: Option<Vec2>,
    deadline: Option<Instant>,
}

impl HoverDebouncer {
    /// Debouncer firing `delay` after the last move.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            position: None,
            deadline: None,
        }
    }

    /// Record a move.
    pub fn moved(&mut self, position: Vec2, now: Instant) {
        self.position = Some(position);
        self.deadline = Some(now + self.delay);
    }

    /// Forget the pointer (it left the canvas or started a drag).
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Position to pick once the pointer has rested long enough.
    pub fn poll(&mut self, now: Instant) -> Option<Vec2> {
        let _ = self.deadline.take_if(|deadline| now >= *deadline)?;
        self.position
    }

    /// Pending deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
