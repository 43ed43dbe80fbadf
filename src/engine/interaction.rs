//! Command execution, deferral while loads are in flight, and the flush
//! that keeps merged colors and picking visibility in step with the
//! holders.

use rustc_hash::FxHashSet;

use super::command::{ColorSpec, Outcome, ViewerCommand};
use super::{Viewer, ViewerEvent};
use crate::error::StrataError;
use crate::scene::PartKey;
use crate::state::{dedup_keys, encode, SelectMode};

impl Viewer {
    /// Execute a command.
    ///
    /// A command naming ids that match no loaded part is deferred while any
    /// load is in flight, and replayed once a load completes. Isolation
    /// fades every part, so it waits until no load is in flight at all.
    /// Once one command is deferred every later deferrable command queues
    /// behind it, so commands always apply in issue order. With nothing in
    /// flight, unmatched ids are simply ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MissingRange`] if merged buffers and registry
    /// disagree, which is a broken invariant rather than a caller error.
    pub fn execute(&mut self, command: ViewerCommand) -> Result<Outcome, StrataError> {
        if command.is_deferrable() && self.must_defer(&command) {
            log::debug!("deferred {command:?}");
            self.deferred.push_back(command);
            return Ok(Outcome::Deferred);
        }
        self.apply(&command).map(Outcome::Applied)
    }

    /// Select `ids`, replacing the selection.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub fn select(&mut self, ids: &[&str]) -> Result<Outcome, StrataError> {
        self.execute(ViewerCommand::Select {
            ids: owned(ids),
            mode: SelectMode::Replace,
        })
    }

    /// Fade everything except `ids`; an empty list ends isolation.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub fn isolate(&mut self, ids: &[&str]) -> Result<Outcome, StrataError> {
        self.execute(ViewerCommand::Isolate { ids: owned(ids) })
    }

    /// Assign a custom color.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub fn color(&mut self, spec: ColorSpec) -> Result<Outcome, StrataError> {
        self.execute(ViewerCommand::Color(spec))
    }

    /// Point the highlight at `id`, or clear it.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub fn hover(&mut self, id: Option<&str>) -> Result<Outcome, StrataError> {
        self.execute(ViewerCommand::Hover {
            id: id.map(str::to_owned),
        })
    }

    /// Number of commands waiting for loads.
    #[must_use]
    pub fn deferred_commands(&self) -> usize {
        self.deferred.len()
    }

    fn must_defer(&self, command: &ViewerCommand) -> bool {
        !self.deferred.is_empty() || self.waits_for_loads(command)
    }

    /// Whether applying `command` now would act on a partial registry.
    fn waits_for_loads(&self, command: &ViewerCommand) -> bool {
        if self.loader.in_flight() == 0 {
            return false;
        }
        let fades_all = match command {
            ViewerCommand::IsolateSelected => true,
            ViewerCommand::Isolate { ids } => !ids.is_empty(),
            _ => false,
        };
        fades_all || !self.registry.resolve(command.ids()).is_complete()
    }

    /// Apply queued commands that no longer need to wait, in order.
    pub(super) fn replay_deferred(&mut self) -> Result<(), StrataError> {
        while let Some(command) = self.deferred.front() {
            if self.waits_for_loads(command) {
                break;
            }
            let Some(command) = self.deferred.pop_front() else {
                break;
            };
            let affected = self.apply(&command)?;
            log::debug!("replayed {command:?}: {} ids affected", affected.len());
            self.events.push(ViewerEvent::CommandReplayed { command, affected });
        }
        Ok(())
    }

    /// Mutate the holders, then flush. Returns the affected ids.
    fn apply(&mut self, command: &ViewerCommand) -> Result<Vec<String>, StrataError> {
        let ids = command.ids();
        let keys = self.registry.resolve(ids).keys;
        // Ids given but none loaded: nothing to do.
        if !ids.is_empty() && keys.is_empty() && !matches!(command, ViewerCommand::Hover { .. }) {
            return Ok(Vec::new());
        }

        let dirty = match command {
            ViewerCommand::Select { mode, .. } => self.state.select(&keys, *mode),
            ViewerCommand::Isolate { .. } => self.state.isolate(&keys, self.registry.keys()),
            ViewerCommand::IsolateSelected => self.state.isolate_selected(self.registry.keys()),
            ViewerCommand::Color(spec) => self.state.color(&keys, spec.appearance()),
            ViewerCommand::ResetColors { ids } => {
                self.state.reset_colors(ids.as_ref().map(|_| keys.as_slice()))
            }
            ViewerCommand::Hover { id } => {
                let id = id.clone().filter(|_| !keys.is_empty());
                self.state.hover(id, &keys)
            }
            ViewerCommand::Hide { .. } => self.state.hide(&keys),
            ViewerCommand::Show { .. } => self.state.show(&keys),
            ViewerCommand::ShowAll => self.state.show_all(),
        };
        self.flush(&dirty)?;
        Ok(self.ids_of(&dirty))
    }

    /// Re-encode dirty parts into the merged buffers and sync their picking
    /// visibility with the resolved opacity.
    pub(super) fn flush(&mut self, dirty: &[PartKey]) -> Result<(), StrataError> {
        if dirty.is_empty() {
            return Ok(());
        }
        let registry = &self.registry;
        let state = &self.state;
        let display = &self.options.display;
        let resolve = |key: PartKey| {
            registry
                .part(key)
                .map(|part| encode(part.base, state.state_of(key), display))
        };
        let _ = self.merged.patch(dirty, resolve)?;
        for &key in dirty {
            if let Some(appearance) = resolve(key) {
                let _ = self.picking.set_visible(key, !appearance.is_invisible());
            }
        }
        Ok(())
    }

    /// Distinct ids of `keys`, in first-seen order.
    fn ids_of(&self, keys: &[PartKey]) -> Vec<String> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut ids: Vec<String> = Vec::new();
        for key in dedup_keys(keys.to_vec()) {
            if let Some(part) = self.registry.part(key) {
                if seen.insert(part.name.as_str()) {
                    ids.push(part.name.clone());
                }
            }
        }
        ids
    }
}

fn owned(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|&id| id.to_owned()).collect()
}
