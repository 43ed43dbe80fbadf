//! Model open/close and load-result folding.

use super::{resolver, Viewer, ViewerEvent};
use crate::error::StrataError;
use crate::loader::{LoadResult, ModelSource, PreparedModel};
use crate::scene::{ModelId, PartKey};

impl Viewer {
    /// Queue a model for loading and reserve its id.
    ///
    /// The load runs on the loader thread; its parts go live when a later
    /// [`Self::poll`] or [`Self::finish_loads`] reports
    /// [`ViewerEvent::ModelOpened`].
    pub fn open_model(&mut self, source: ModelSource) -> ModelId {
        let model = ModelId::new(self.next_model);
        self.next_model += 1;
        log::info!("queued {model} '{}' ({} bytes)", source.name, source.data.len());
        let preview = self
            .options
            .preview
            .enabled
            .then_some(self.options.preview.strategy);
        if let Err(error) = self.loader.submit(model, source, preview) {
            log::error!("{model} not queued: {error}");
            self.events.push(ViewerEvent::ModelFailed { model, error });
        }
        model
    }

    /// Close a model, returning the ids of the removed parts.
    ///
    /// Removal cascades to the picking scene (releasing colors), the merged
    /// buffers, every interaction holder and the preview proxies. A model
    /// whose load is still pending is marked so its result is discarded on
    /// arrival. Unknown models are a no-op.
    ///
    /// # Errors
    ///
    /// Propagates composition failures from re-encoding surviving parts.
    pub fn close_model(&mut self, model: ModelId) -> Result<Vec<String>, StrataError> {
        if self.loader.pending().any(|m| m == model) {
            log::info!("{model} closed while loading; result will be discarded");
            let _ = self.cancelled.insert(model);
            self.events.push(ViewerEvent::ModelClosed {
                model,
                parts: Vec::new(),
            });
            return Ok(Vec::new());
        }
        let Some((_, removed)) = self.registry.remove_model(model) else {
            log::debug!("close of unknown {model} ignored");
            return Ok(Vec::new());
        };

        let keys: Vec<PartKey> = removed.iter().map(|(key, _)| *key).collect();
        for &key in &keys {
            let _ = self.picking.unregister(key);
        }
        self.state.forget(&keys);
        self.merged.remove_model(
            model,
            &keys,
            &self.registry,
            resolver(&self.state, &self.options.display),
        );
        let _ = self.preview.remove(model);

        let parts: Vec<String> = removed.into_iter().map(|(_, part)| part.name).collect();
        log::info!("closed {model}: {} parts", parts.len());
        self.events.push(ViewerEvent::ModelClosed {
            model,
            parts: parts.clone(),
        });
        Ok(parts)
    }

    /// Fold in every finished load without blocking and return the events
    /// produced since the last call.
    ///
    /// # Errors
    ///
    /// Propagates composition failures raised while replaying deferred
    /// commands.
    pub fn poll(&mut self) -> Result<Vec<ViewerEvent>, StrataError> {
        while let Some(result) = self.loader.try_recv() {
            self.fold_result(result)?;
        }
        Ok(std::mem::take(&mut self.events))
    }

    /// Block until every queued load has resolved, then return the events.
    ///
    /// # Errors
    ///
    /// Same as [`Self::poll`].
    pub fn finish_loads(&mut self) -> Result<Vec<ViewerEvent>, StrataError> {
        while let Some(result) = self.loader.recv() {
            self.fold_result(result)?;
        }
        Ok(std::mem::take(&mut self.events))
    }

    /// Number of loads not yet folded in.
    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.loader.in_flight()
    }

    fn fold_result(&mut self, result: LoadResult) -> Result<(), StrataError> {
        let model = result.model();
        if self.cancelled.remove(&model) {
            log::info!("discarded result of closed {model}");
        } else {
            match result {
                LoadResult::Ready(prepared) => self.register(prepared),
                LoadResult::Failed { model, reason } => {
                    log::warn!("{model} failed to load: {reason}");
                    self.events.push(ViewerEvent::ModelFailed {
                        model,
                        error: StrataError::LoadFailure { model, reason },
                    });
                }
            }
        }
        self.replay_deferred()
    }

    /// Make a prepared model live. Any failure rolls the model back so
    /// previously displayed state is untouched.
    fn register(&mut self, prepared: PreparedModel) {
        let PreparedModel {
            model,
            guid,
            name,
            parts,
            preview,
        } = prepared;
        let keys = match self.registry.insert_model(model, guid, name, parts) {
            Ok(keys) => keys,
            Err(error) => {
                self.events.push(ViewerEvent::ModelFailed { model, error });
                return;
            }
        };

        let resolve = resolver(&self.state, &self.options.display);
        for (n, &key) in keys.iter().enumerate() {
            let Some(part) = self.registry.part(key) else {
                continue;
            };
            let visible = !resolve(key, part).is_invisible();
            if let Err(error) = self.picking.register(key, part.geometry.clone(), visible) {
                for &registered in &keys[..n] {
                    let _ = self.picking.unregister(registered);
                }
                let _ = self.registry.remove_model(model);
                log::error!("{model} rolled back: {error}");
                self.events.push(ViewerEvent::ModelFailed { model, error });
                return;
            }
        }

        self.merged.add_model(model, &self.registry, resolve);
        if let Some(proxy) = preview {
            self.preview.insert(model, proxy);
        }
        let ids: Vec<String> = keys
            .iter()
            .filter_map(|&key| self.registry.part(key).map(|p| p.name.clone()))
            .collect();
        log::info!("opened {model}: {} parts", ids.len());
        self.events.push(ViewerEvent::ModelOpened { model, parts: ids });
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{quad_source, viewer};
    use super::*;
    use crate::engine::command::ViewerCommand;
    use crate::engine::Outcome;
    use crate::options::Options;
    use crate::picking::{PickColorAllocator, PickingScene};
    use crate::state::SelectMode;

    #[test]
    fn close_while_pending_discards_result() {
        let mut viewer = viewer(Options::default());
        let a = viewer.open_model(quad_source("A", &[("a1", -3.0), ("a2", 0.0)]));
        let _b = viewer.open_model(quad_source("B", &[("b1", 3.0)]));
        assert!(viewer.close_model(a).unwrap().is_empty());

        let events = viewer.finish_loads().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, ViewerEvent::ModelOpened { parts, .. } if parts == &["b1"])));
        assert!(!events
            .iter()
            .any(|e| matches!(e, ViewerEvent::ModelOpened { model, .. } if *model == a)));

        let ids: Vec<&str> = viewer
            .registry()
            .iter()
            .map(|(_, part)| part.name.as_str())
            .collect();
        assert_eq!(ids, ["b1"]);
        assert_eq!(viewer.merged().patched_parts(), 0);
        assert_eq!(viewer.picking().len(), 1);
    }

    #[test]
    fn failed_load_keeps_siblings_and_prior_state() {
        let mut viewer = viewer(Options::default());
        let _a = viewer.open_model(quad_source("A", &[("a1", 0.0)]));
        let _ = viewer.finish_loads().unwrap();
        let _ = viewer
            .execute(ViewerCommand::Select {
                ids: vec!["a1".to_owned()],
                mode: SelectMode::Replace,
            })
            .unwrap();

        let bad = viewer.open_model(quad_source("bad", &[]));
        let _c = viewer.open_model(quad_source("C", &[("c1", 2.0)]));
        let events = viewer.finish_loads().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            ViewerEvent::ModelFailed { model, error: StrataError::LoadFailure { .. } }
                if *model == bad
        )));
        assert_eq!(viewer.registry().len(), 2);
        assert_eq!(viewer.state().selection().len(), 1);
    }

    fn crash_on_boom(source: &ModelSource) -> Result<crate::loader::DecodedModel, String> {
        if source.name == "boom" {
            panic!("decoder crashed");
        }
        super::super::fixtures::decode_quads(source)
    }

    #[test]
    fn crashed_decoder_fails_queued_siblings() {
        let mut viewer = Viewer::new(Options::default(), crash_on_boom).unwrap();
        let a = viewer.open_model(quad_source("A", &[("a1", 0.0)]));
        let boom = viewer.open_model(quad_source("boom", &[("x", 1.0)]));
        let c = viewer.open_model(quad_source("C", &[("c1", 2.0)]));

        let events = viewer.finish_loads().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, ViewerEvent::ModelOpened { model, .. } if *model == a)));
        for failed in [boom, c] {
            assert!(events.iter().any(|e| matches!(
                e,
                ViewerEvent::ModelFailed { model, error: StrataError::LoadFailure { .. } }
                    if *model == failed
            )));
        }
        assert_eq!(viewer.registry().len(), 1);
        assert_eq!(viewer.pending_loads(), 0);
    }

    #[test]
    fn close_cascades_to_every_structure() {
        let mut viewer = viewer(Options::default());
        let a = viewer.open_model(quad_source("A", &[("a1", -3.0), ("a2", 0.0)]));
        let _b = viewer.open_model(quad_source("B", &[("b1", 3.0)]));
        let _ = viewer.finish_loads().unwrap();
        let _ = viewer
            .execute(ViewerCommand::Select {
                ids: vec!["a1".to_owned(), "b1".to_owned()],
                mode: SelectMode::Replace,
            })
            .unwrap();
        let _ = viewer
            .execute(ViewerCommand::Hover {
                id: Some("a2".to_owned()),
            })
            .unwrap();

        let removed = viewer.close_model(a).unwrap();
        assert_eq!(removed, ["a1", "a2"]);
        assert_eq!(viewer.registry().len(), 1);
        assert_eq!(viewer.picking().len(), 1);
        assert_eq!(viewer.picking().live_colors(), 1);
        assert_eq!(viewer.state().selection().len(), 1);
        assert_eq!(viewer.state().highlight().id(), None);
        assert!(viewer.preview().get(a).is_none());
        assert_eq!(viewer.merged().vertex_count(), 4);
        assert!(viewer.close_model(a).unwrap().is_empty());
    }

    #[test]
    fn exhausted_colors_roll_back_the_model() {
        let mut viewer = Viewer::with_picking(
            Options::default(),
            super::super::fixtures::decode_quads,
            PickingScene::with_allocator(PickColorAllocator::with_limit(2)),
        )
        .unwrap();
        let _a = viewer.open_model(quad_source("A", &[("a1", 0.0)]));
        let big = viewer.open_model(quad_source("B", &[("b1", 1.0), ("b2", 2.0)]));
        let events = viewer.finish_loads().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            ViewerEvent::ModelFailed { model, error: StrataError::PickColorsExhausted }
                if *model == big
        )));
        assert_eq!(viewer.registry().len(), 1);
        assert_eq!(viewer.picking().len(), 1);
        assert_eq!(viewer.merged().vertex_count(), 4);
        assert_eq!(
            viewer
                .execute(ViewerCommand::Select {
                    ids: vec!["b1".to_owned()],
                    mode: SelectMode::Replace,
                })
                .unwrap(),
            Outcome::Applied(Vec::new())
        );
    }
}
