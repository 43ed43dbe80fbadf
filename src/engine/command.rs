//! The viewer's complete state-mutation vocabulary.
//!
//! Every mutation, whether it came from a pointer gesture, a UI panel or a
//! programmatic call, is a [`ViewerCommand`] passed to
//! [`Viewer::execute`](super::Viewer::execute). Commands address parts by
//! id (part name); an id addresses every loaded part carrying that name.

use crate::scene::Appearance;
use crate::state::SelectMode;

/// Explicit color assignment for a set of ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSpec {
    /// Ids to color.
    pub ids: Vec<String>,
    /// RGB color.
    pub color: [u8; 3],
    /// Opacity (0 = invisible, 255 = opaque).
    pub opacity: u8,
}

impl ColorSpec {
    /// The appearance assigned by this spec.
    #[must_use]
    pub fn appearance(&self) -> Appearance {
        Appearance::new(self.color, self.opacity)
    }
}

/// A state mutation the viewer can perform.
///
/// ```ignore
/// viewer.execute(ViewerCommand::Select { ids: vec!["wall-3".into()], mode: SelectMode::Replace })?;
/// viewer.execute(ViewerCommand::IsolateSelected)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    // ── Selection ───────────────────────────────────────────────────
    /// Replace the selection, or toggle ids in and out of it. Replacing
    /// with an empty list clears both selection and isolation.
    Select {
        /// Ids to select.
        ids: Vec<String>,
        /// Replace or toggle.
        mode: SelectMode,
    },

    // ── Isolation ───────────────────────────────────────────────────
    /// Fade every part except `ids`. An empty list ends isolation.
    Isolate {
        /// Ids kept at full appearance.
        ids: Vec<String>,
    },
    /// Fade every part except the current selection.
    IsolateSelected,

    // ── Coloring ────────────────────────────────────────────────────
    /// Assign an explicit color and opacity.
    Color(ColorSpec),
    /// Drop custom colors from `ids`, or from every part when `None`.
    ResetColors {
        /// Ids to reset.
        ids: Option<Vec<String>>,
    },

    // ── Hover ───────────────────────────────────────────────────────
    /// Point the highlight at an id, or clear it. Never deferred.
    Hover {
        /// Hovered id.
        id: Option<String>,
    },

    // ── Visibility ──────────────────────────────────────────────────
    /// Hide parts (opacity forced to zero, excluded from picking).
    Hide {
        /// Ids to hide.
        ids: Vec<String>,
    },
    /// Show hidden parts again.
    Show {
        /// Ids to show.
        ids: Vec<String>,
    },
    /// Show every hidden part.
    ShowAll,
}

impl ViewerCommand {
    /// Ids the command resolves against the registry.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        match self {
            Self::Select { ids, .. }
            | Self::Isolate { ids }
            | Self::Hide { ids }
            | Self::Show { ids } => ids,
            Self::Color(spec) => &spec.ids,
            Self::ResetColors { ids } => ids.as_deref().unwrap_or_default(),
            Self::Hover { id } => id.as_slice(),
            Self::IsolateSelected | Self::ShowAll => &[],
        }
    }

    /// Whether the command may wait for in-flight loads.
    #[must_use]
    pub fn is_deferrable(&self) -> bool {
        !matches!(self, Self::Hover { .. })
    }
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Applied now; carries the ids whose resolved appearance changed.
    Applied(Vec<String>),
    /// Queued until a pending load completes.
    Deferred,
}

impl Outcome {
    /// Affected ids, empty when deferred.
    #[must_use]
    pub fn affected(&self) -> &[String] {
        match self {
            Self::Applied(ids) => ids,
            Self::Deferred => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_cover_every_variant() {
        let ids = vec!["a".to_owned()];
        assert_eq!(ViewerCommand::Isolate { ids: ids.clone() }.ids(), &ids[..]);
        assert_eq!(ViewerCommand::Hover { id: Some("a".to_owned()) }.ids(), &ids[..]);
        assert!(ViewerCommand::ResetColors { ids: None }.ids().is_empty());
        assert!(ViewerCommand::ShowAll.ids().is_empty());
        assert!(!ViewerCommand::Hover { id: None }.is_deferrable());
    }
}
