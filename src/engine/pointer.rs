//! Pointer events and deadline polling.
//!
//! Positions are normalized to the viewport (`0..=1`, top-left origin).
//! Every entry point takes the current instant; timers are deadlines checked
//! here, never callbacks.

use glam::Vec2;
use web_time::Instant;

use super::command::{Outcome, ViewerCommand};
use super::Viewer;
use crate::error::StrataError;
use crate::input::{Modifiers, TriggerAction};
use crate::picking::PickTarget;

impl Viewer {
    /// Pointer pressed at `position`.
    ///
    /// # Errors
    ///
    /// Propagates pick and composition failures.
    pub fn pointer_down(
        &mut self,
        position: Vec2,
        now: Instant,
        target: &mut dyn PickTarget,
    ) -> Result<Vec<Outcome>, StrataError> {
        let part = self.pick(position, target)?.map(|hit| hit.part);
        let action = self.trigger.pointer_down(position, part, now);
        self.hover.cancel();
        self.resolve_trigger(action)
    }

    /// Pointer moved to `position`. Schedules a debounced hover pick unless
    /// the pointer is dragging.
    ///
    /// # Errors
    ///
    /// Propagates composition failures of an elapsed trigger.
    pub fn pointer_move(
        &mut self,
        position: Vec2,
        now: Instant,
    ) -> Result<Vec<Outcome>, StrataError> {
        let action = self.trigger.pointer_move(position, now);
        if self.trigger.is_dragging() {
            self.hover.cancel();
        } else {
            self.hover.moved(position, now);
        }
        self.resolve_trigger(action)
    }

    /// Pointer released at `position`.
    ///
    /// # Errors
    ///
    /// Propagates pick and composition failures.
    pub fn pointer_up(
        &mut self,
        position: Vec2,
        modifiers: Modifiers,
        now: Instant,
        target: &mut dyn PickTarget,
    ) -> Result<Vec<Outcome>, StrataError> {
        let part = self.pick(position, target)?.map(|hit| hit.part);
        let action = self.trigger.pointer_up(part, modifiers, now);
        self.resolve_trigger(action)
    }

    /// Pointer left the canvas: drop the pending hover and the highlight.
    ///
    /// # Errors
    ///
    /// Propagates composition failures.
    pub fn pointer_leave(&mut self) -> Result<Outcome, StrataError> {
        self.hover.cancel();
        self.execute(ViewerCommand::Hover { id: None })
    }

    /// Resolve elapsed deadlines: a single trigger whose second-trigger
    /// window closed, and a hover pick whose debounce delay passed.
    ///
    /// # Errors
    ///
    /// Propagates pick and composition failures.
    pub fn update(
        &mut self,
        now: Instant,
        target: &mut dyn PickTarget,
    ) -> Result<Vec<Outcome>, StrataError> {
        let action = self.trigger.poll(now);
        let mut outcomes = self.resolve_trigger(action)?;
        if let Some(position) = self.hover.poll(now) {
            let id = self.pick(position, target)?.map(|hit| hit.id);
            outcomes.push(self.execute(ViewerCommand::Hover { id })?);
        }
        Ok(outcomes)
    }

    /// Earliest pending deadline, for hosts that sleep between frames.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.trigger.deadline(), self.hover.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn resolve_trigger(
        &mut self,
        action: Option<TriggerAction>,
    ) -> Result<Vec<Outcome>, StrataError> {
        let Some(action) = action else {
            return Ok(Vec::new());
        };
        let (part, mode, isolate) = match action {
            TriggerAction::Select { part, mode } => (part, mode, false),
            TriggerAction::SelectThenIsolate { part, mode } => (part, mode, true),
        };
        // A part removed since the press resolves like the background.
        let ids = part
            .and_then(|key| self.registry.part(key))
            .map(|p| vec![p.name.clone()])
            .unwrap_or_default();
        let mut outcomes = vec![self.execute(ViewerCommand::Select { ids, mode })?];
        if isolate {
            outcomes.push(self.execute(ViewerCommand::IsolateSelected)?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::fixtures::{quad_source, viewer, pointer_at};
    use super::*;
    use crate::options::Options;
    use crate::picking::software::SoftwarePickTarget;
    use crate::scene::PartKey;
    use crate::state::SelectMode;

    fn key(viewer: &Viewer, id: &str) -> PartKey {
        viewer.registry().lookup(id)[0]
    }

    fn scene() -> Viewer {
        let mut viewer = viewer(Options::default());
        let _ = viewer.open_model(quad_source("A", &[("a1", -3.0), ("a2", 0.0)]));
        let _ = viewer.open_model(quad_source("B", &[("b1", 3.0)]));
        let _ = viewer.finish_loads().unwrap();
        viewer
    }

    fn trigger(
        viewer: &mut Viewer,
        at: Vec2,
        now: Instant,
        target: &mut SoftwarePickTarget,
    ) -> Vec<Outcome> {
        let mut outcomes = viewer.pointer_down(at, now, target).unwrap();
        outcomes.extend(viewer.pointer_up(at, Modifiers::NONE, now, target).unwrap());
        outcomes
    }

    #[test]
    fn second_trigger_selects_then_isolates() {
        let mut viewer = scene();
        let mut target = SoftwarePickTarget::default();
        let t0 = Instant::now();
        let at = pointer_at(&viewer, -3.0);

        assert!(trigger(&mut viewer, at, t0, &mut target).is_empty());
        let outcomes = trigger(&mut viewer, at, t0 + Duration::from_millis(150), &mut target);
        assert_eq!(outcomes.len(), 2);

        let (a1, a2, b1) = (key(&viewer, "a1"), key(&viewer, "a2"), key(&viewer, "b1"));
        let selection: Vec<PartKey> = viewer.state().selection().iter().collect();
        assert_eq!(selection, [a1]);
        assert_eq!(viewer.state().isolation().len(), 2);
        assert!(viewer.state().isolation().contains(a2));
        assert!(viewer.state().isolation().contains(b1));

        let _ = viewer.select(&[]).unwrap();
        assert!(viewer.state().selection().is_empty());
        assert!(viewer.state().isolation().is_empty());
    }

    #[test]
    fn single_trigger_selects_after_window() {
        let mut viewer = scene();
        let mut target = SoftwarePickTarget::default();
        let t0 = Instant::now();
        let at = pointer_at(&viewer, 3.0);

        let _ = trigger(&mut viewer, at, t0, &mut target);
        assert!(viewer.state().selection().is_empty());
        assert!(viewer.update(t0 + Duration::from_millis(100), &mut target).unwrap().is_empty());

        let outcomes = viewer.update(t0 + Duration::from_millis(300), &mut target).unwrap();
        assert_eq!(outcomes, [Outcome::Applied(vec!["b1".to_owned()])]);
        assert!(viewer.state().isolation().is_empty());
    }

    #[test]
    fn dragged_second_press_still_selects_first_trigger() {
        let mut viewer = scene();
        let mut target = SoftwarePickTarget::default();
        let t0 = Instant::now();
        let at = pointer_at(&viewer, -3.0);
        let _ = trigger(&mut viewer, at, t0, &mut target);

        let t1 = t0 + Duration::from_millis(100);
        let _ = viewer.pointer_down(at, t1, &mut target).unwrap();
        let _ = viewer.pointer_move(at + Vec2::new(0.2, 0.0), t1).unwrap();
        let released = viewer
            .pointer_up(at + Vec2::new(0.2, 0.0), Modifiers::NONE, t1, &mut target)
            .unwrap();
        assert!(released.is_empty());

        let _ = viewer.update(t0 + Duration::from_secs(2), &mut target).unwrap();
        let selection: Vec<PartKey> = viewer.state().selection().iter().collect();
        assert_eq!(selection, [key(&viewer, "a1")]);
        assert!(viewer.state().isolation().is_empty());
    }

    #[test]
    fn background_trigger_clears_selection() {
        let mut viewer = scene();
        let mut target = SoftwarePickTarget::default();
        let _ = viewer.select(&["a1"]).unwrap();
        let t0 = Instant::now();
        let _ = trigger(&mut viewer, Vec2::new(0.02, 0.02), t0, &mut target);
        let _ = viewer.update(t0 + Duration::from_secs(1), &mut target).unwrap();
        assert!(viewer.state().selection().is_empty());
    }

    #[test]
    fn hover_is_debounced() {
        let mut viewer = scene();
        let mut target = SoftwarePickTarget::default();
        let t0 = Instant::now();
        let at = pointer_at(&viewer, 0.0);
        for step in 0..5_u64 {
            let _ = viewer
                .pointer_move(at, t0 + Duration::from_millis(step * 10))
                .unwrap();
            let _ = viewer
                .update(t0 + Duration::from_millis(step * 10), &mut target)
                .unwrap();
        }
        assert_eq!(target.passes, 0);

        let outcomes = viewer.update(t0 + Duration::from_millis(200), &mut target).unwrap();
        assert_eq!(target.passes, 1);
        assert_eq!(outcomes, [Outcome::Applied(vec!["a2".to_owned()])]);
        assert_eq!(viewer.state().highlight().id(), Some("a2"));

        let _ = viewer.pointer_leave().unwrap();
        assert_eq!(viewer.state().highlight().id(), None);
    }

    #[test]
    fn modified_trigger_toggles() {
        let mut viewer = scene();
        let mut target = SoftwarePickTarget::default();
        let _ = viewer.select(&["a1"]).unwrap();
        let t0 = Instant::now();
        let at = pointer_at(&viewer, 3.0);
        let _ = viewer.pointer_down(at, t0, &mut target).unwrap();
        let _ = viewer.pointer_up(at, Modifiers::SHIFT, t0, &mut target).unwrap();
        let _ = viewer.update(t0 + Duration::from_secs(1), &mut target).unwrap();
        assert_eq!(viewer.state().selection().len(), 2);
        let _ = viewer
            .execute(ViewerCommand::Select {
                ids: vec!["a1".to_owned()],
                mode: SelectMode::Toggle,
            })
            .unwrap();
        assert_eq!(viewer.state().selection().len(), 1);
    }
}
