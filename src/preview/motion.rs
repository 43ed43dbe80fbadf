use glam::Mat4;

/// What to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// Camera is moving: draw the per-model proxies.
    Preview,
    /// Draw the merged buffers. `forced` marks the first frame after motion
    /// stopped, which must be rendered even if nothing else changed.
    Detail {
        /// Whether a full-detail redraw is required.
        forced: bool,
    },
}

/// Detects sustained camera motion from successive view-projections.
#[derive(Debug, Clone, Default)]
pub struct MotionTracker {
    last: Option<Mat4>,
    moving_frames: u32,
    min_frames: u32,
    previewing: bool,
}

impl MotionTracker {
    /// Tracker engaging the preview after `min_frames` consecutive moving
    /// frames (at least one).
    #[must_use]
    pub fn new(min_frames: u32) -> Self {
        Self {
            min_frames: min_frames.max(1),
            ..Self::default()
        }
    }

    /// Feed this frame's view-projection and get the draw mode.
    pub fn observe(&mut self, view_proj: Mat4) -> FrameMode {
        let moved = self
            .last
            .is_some_and(|last| !last.abs_diff_eq(view_proj, 1e-6));
        self.last = Some(view_proj);

        if moved {
            self.moving_frames = self.moving_frames.saturating_add(1);
            if self.moving_frames >= self.min_frames {
                self.previewing = true;
                return FrameMode::Preview;
            }
            return FrameMode::Detail { forced: false };
        }
        self.moving_frames = 0;
        let forced = std::mem::take(&mut self.previewing);
        FrameMode::Detail { forced }
    }

    /// Whether the last observed frame drew the preview.
    #[must_use]
    pub fn is_previewing(&self) -> bool {
        self.previewing
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn view(x: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn motion_engages_preview_and_idle_forces_detail() {
        let mut tracker = MotionTracker::new(1);
        assert_eq!(tracker.observe(view(0.0)), FrameMode::Detail { forced: false });
        assert_eq!(tracker.observe(view(1.0)), FrameMode::Preview);
        assert_eq!(tracker.observe(view(2.0)), FrameMode::Preview);
        assert_eq!(tracker.observe(view(2.0)), FrameMode::Detail { forced: true });
        assert_eq!(tracker.observe(view(2.0)), FrameMode::Detail { forced: false });
    }

    #[test]
    fn short_motion_below_threshold_stays_detailed() {
        let mut tracker = MotionTracker::new(3);
        let _ = tracker.observe(view(0.0));
        assert_eq!(tracker.observe(view(1.0)), FrameMode::Detail { forced: false });
        assert_eq!(tracker.observe(view(1.0)), FrameMode::Detail { forced: false });
        assert!(!tracker.is_previewing());
    }
}
