//! The `Viewer` facade: registry, interaction holders, merged geometry,
//! picking scene, preview proxies and the loader, kept consistent with each
//! other.
//!
//! All mutation happens on the caller's thread. Loading is the only
//! background work; its results are folded in by [`Viewer::poll`].

/// Viewer command vocabulary.
pub mod command;
mod frame;
mod interaction;
mod lifecycle;
mod pointer;
mod queries;

#[cfg(test)]
mod fixtures;

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

pub use self::command::{ColorSpec, Outcome, ViewerCommand};
pub use self::queries::ViewerStats;
use crate::camera::Camera;
use crate::error::StrataError;
use crate::input::{HoverDebouncer, TriggerResolver};
use crate::loader::{LoadQueue, ModelDecoder};
use crate::merge::MergedGeometry;
use crate::options::{DisplayOptions, Options};
use crate::picking::PickingScene;
use crate::preview::FastPreview;
use crate::scene::{Appearance, ModelId, Part, PartKey, PartRegistry};
use crate::state::{encode, InteractionState};

/// Lifecycle notification produced while folding in load results or closing
/// models.
#[derive(Debug)]
pub enum ViewerEvent {
    /// A model finished loading and its parts are live.
    ModelOpened {
        /// The model.
        model: ModelId,
        /// Ids of the parts added, in decode order.
        parts: Vec<String>,
    },
    /// A model was closed.
    ModelClosed {
        /// The model.
        model: ModelId,
        /// Ids of the parts removed. Empty when the load was still pending.
        parts: Vec<String>,
    },
    /// A model failed to load. Previously loaded state is untouched.
    ModelFailed {
        /// The model.
        model: ModelId,
        /// Why.
        error: StrataError,
    },
    /// A deferred command was applied after a load completed.
    CommandReplayed {
        /// The command.
        command: ViewerCommand,
        /// Ids whose appearance changed.
        affected: Vec<String>,
    },
}

/// Part resolved by a pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickHit {
    /// Arena key of the part.
    pub part: PartKey,
    /// Owning model.
    pub model: ModelId,
    /// Part id (name).
    pub id: String,
}

/// Scene composition engine for one canvas.
#[derive(Debug)]
pub struct Viewer {
    options: Options,
    registry: PartRegistry,
    state: InteractionState,
    merged: MergedGeometry,
    picking: PickingScene,
    preview: FastPreview,
    loader: LoadQueue,
    camera: Camera,
    trigger: TriggerResolver,
    hover: HoverDebouncer,
    next_model: u32,
    /// Models closed while their load was still in flight.
    cancelled: FxHashSet<ModelId>,
    /// Commands waiting for loads, in issue order.
    deferred: VecDeque<ViewerCommand>,
    events: Vec<ViewerEvent>,
}

impl Viewer {
    /// Create a viewer and spawn its loader thread.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ThreadSpawn`] if the loader thread cannot be
    /// spawned.
    pub fn new(options: Options, decoder: impl ModelDecoder) -> Result<Self, StrataError> {
        Self::with_picking(options, decoder, PickingScene::new())
    }

    /// Like [`Self::new`] with a caller-configured picking scene (for
    /// example one drawing from a smaller color space).
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ThreadSpawn`] if the loader thread cannot be
    /// spawned.
    pub fn with_picking(
        options: Options,
        decoder: impl ModelDecoder,
        picking: PickingScene,
    ) -> Result<Self, StrataError> {
        let loader = LoadQueue::new(decoder)?;
        let interaction = &options.interaction;
        Ok(Self {
            registry: PartRegistry::new(),
            state: InteractionState::new(),
            merged: MergedGeometry::new(options.merge.clone()),
            picking,
            preview: FastPreview::new(options.preview.clone()),
            loader,
            camera: Camera::default(),
            trigger: TriggerResolver::new(
                interaction.double_trigger_window(),
                interaction.drag_threshold,
            ),
            hover: HoverDebouncer::new(interaction.hover_debounce()),
            next_model: 1,
            cancelled: FxHashSet::default(),
            deferred: VecDeque::new(),
            events: Vec::new(),
            options,
        })
    }

    /// Active options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The part registry.
    #[must_use]
    pub fn registry(&self) -> &PartRegistry {
        &self.registry
    }

    /// The interaction holders.
    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// The merged draw buffers.
    #[must_use]
    pub fn merged(&self) -> &MergedGeometry {
        &self.merged
    }

    /// The picking proxies.
    #[must_use]
    pub fn picking(&self) -> &PickingScene {
        &self.picking
    }

    /// The per-model preview proxies.
    #[must_use]
    pub fn preview(&self) -> &FastPreview {
        &self.preview
    }
}

/// Current appearance of a registered part.
fn resolver<'a>(
    state: &'a InteractionState,
    display: &'a DisplayOptions,
) -> impl Fn(PartKey, &Part) -> Appearance + 'a {
    move |key: PartKey, part: &Part| encode(part.base, state.state_of(key), display)
}
