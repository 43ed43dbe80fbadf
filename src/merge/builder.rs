use slotmap::{SecondaryMap, SlotMap};

use super::batch::{BatchKey, MergedBatch, PartRange, Placement};
use crate::error::StrataError;
use crate::options::{MergeOptions, MergeStrategy};
use crate::scene::{Appearance, ModelId, Part, PartKey, PartRegistry};

/// Merged draw buffers for every loaded part.
///
/// Topology is fixed once a batch is built: `patch` rewrites color bytes in
/// place and never touches positions or indices. Batches are rebuilt only
/// when models are added or removed, and with the per-model strategies only
/// the affected model's batches are.
#[derive(Debug)]
pub struct MergedGeometry {
    options: MergeOptions,
    batches: SlotMap<BatchKey, MergedBatch>,
    /// Draw order.
    order: Vec<BatchKey>,
    ranges: SecondaryMap<PartKey, PartRange>,
    patched_parts: u64,
}

impl MergedGeometry {
    /// Create empty merged geometry with the given batching options.
    #[must_use]
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            batches: SlotMap::with_key(),
            order: Vec::new(),
            ranges: SecondaryMap::new(),
            patched_parts: 0,
        }
    }

    /// Active batch granularity.
    #[must_use]
    pub fn strategy(&self) -> MergeStrategy {
        self.options.strategy
    }

    /// Discard every batch and rebuild from the registry.
    pub fn rebuild(
        &mut self,
        registry: &PartRegistry,
        mut resolve: impl FnMut(PartKey, &Part) -> Appearance,
    ) {
        self.batches.clear();
        self.order.clear();
        self.ranges.clear();
        match self.options.strategy {
            MergeStrategy::Scene => {
                let parts = registry
                    .models()
                    .iter()
                    .flat_map(|m| m.parts().iter().copied());
                self.build_batches(None, parts, registry, None, &mut resolve);
            }
            MergeStrategy::PerModel | MergeStrategy::PerModelCapped => {
                for model in registry.models() {
                    self.build_batches(
                        Some(model.id),
                        model.parts().iter().copied(),
                        registry,
                        self.cap(),
                        &mut resolve,
                    );
                }
            }
        }
    }

    /// Build batches for a freshly registered model.
    pub fn add_model(
        &mut self,
        model: ModelId,
        registry: &PartRegistry,
        mut resolve: impl FnMut(PartKey, &Part) -> Appearance,
    ) {
        match self.options.strategy {
            MergeStrategy::Scene => self.rebuild(registry, resolve),
            MergeStrategy::PerModel | MergeStrategy::PerModelCapped => {
                self.build_batches(
                    Some(model),
                    registry.parts_of(model).iter().copied(),
                    registry,
                    self.cap(),
                    &mut resolve,
                );
            }
        }
    }

    /// Drop the batches of an unregistered model. `removed` are the keys it
    /// owned; `registry` must no longer contain them.
    pub fn remove_model(
        &mut self,
        model: ModelId,
        removed: &[PartKey],
        registry: &PartRegistry,
        resolve: impl FnMut(PartKey, &Part) -> Appearance,
    ) {
        match self.options.strategy {
            MergeStrategy::Scene => self.rebuild(registry, resolve),
            MergeStrategy::PerModel | MergeStrategy::PerModelCapped => {
                let batches = &mut self.batches;
                self.order.retain(|&batch| {
                    let owned = batches
                        .get(batch)
                        .is_some_and(|b| b.model() == Some(model));
                    if owned {
                        drop(batches.remove(batch));
                    }
                    !owned
                });
                for key in removed {
                    drop(self.ranges.remove(*key));
                }
            }
        }
    }

    /// Re-encode dirty parts in place. `resolve` must return the current
    /// appearance of a live part and `None` for a part that is gone.
    ///
    /// Cost is proportional to the dirty parts' vertex counts; nothing
    /// outside their ranges is written.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MissingRange`] if a live part has no range,
    /// which means batches and registry disagree.
    pub fn patch(
        &mut self,
        dirty: &[PartKey],
        mut resolve: impl FnMut(PartKey) -> Option<Appearance>,
    ) -> Result<usize, StrataError> {
        let mut patched = 0;
        for &key in dirty {
            let Some(appearance) = resolve(key) else {
                log::debug!("skipping patch of unloaded part {key:?}");
                continue;
            };
            let range = self.ranges.get(key).copied().ok_or_else(|| {
                log::error!("live part {key:?} has no merged range");
                StrataError::MissingRange(key)
            })?;
            let batch = self
                .batches
                .get_mut(range.batch)
                .ok_or(StrataError::MissingRange(key))?;
            batch.write_colors(&range, appearance.to_rgba());
            patched += 1;
        }
        self.patched_parts += patched as u64;
        Ok(patched)
    }

    /// Range of a part, if it is merged.
    #[must_use]
    pub fn range(&self, key: PartKey) -> Option<PartRange> {
        self.ranges.get(key).copied()
    }

    /// Current color bytes of a part.
    #[must_use]
    pub fn colors_of(&self, key: PartKey) -> Option<&[[u8; 4]]> {
        let range = self.ranges.get(key)?;
        self.batches.get(range.batch)?.colors().get(range.vertices())
    }

    /// A batch by key.
    #[must_use]
    pub fn batch(&self, key: BatchKey) -> Option<&MergedBatch> {
        self.batches.get(key)
    }

    /// Mutable access for uploaders that drain dirty ranges.
    pub fn batch_mut(&mut self, key: BatchKey) -> Option<&mut MergedBatch> {
        self.batches.get_mut(key)
    }

    /// Batch keys in draw order.
    #[must_use]
    pub fn batch_keys(&self) -> &[BatchKey] {
        &self.order
    }

    /// Batches in draw order.
    pub fn batches(&self) -> impl Iterator<Item = &MergedBatch> {
        self.order.iter().filter_map(|&k| self.batches.get(k))
    }

    /// Number of batches.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.order.len()
    }

    /// Total vertices across batches.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.batches().map(MergedBatch::vertex_count).sum()
    }

    /// Total indices across batches.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.batches().map(MergedBatch::index_count).sum()
    }

    /// Parts re-encoded by `patch` since creation.
    #[must_use]
    pub fn patched_parts(&self) -> u64 {
        self.patched_parts
    }

    fn cap(&self) -> Option<u32> {
        match self.options.strategy {
            MergeStrategy::PerModelCapped => Some(self.options.vertex_cap.max(1)),
            MergeStrategy::Scene | MergeStrategy::PerModel => None,
        }
    }

    /// Pack parts into one or more batches, splitting before a part that
    /// would push the current batch past `cap`.
    fn build_batches(
        &mut self,
        model: Option<ModelId>,
        parts: impl Iterator<Item = PartKey>,
        registry: &PartRegistry,
        cap: Option<u32>,
        resolve: &mut impl FnMut(PartKey, &Part) -> Appearance,
    ) {
        let mut current = MergedBatch::new(model);
        let mut placements: Vec<Placement> = Vec::new();

        for key in parts {
            let Some(part) = registry.part(key) else {
                continue;
            };
            let count = part.geometry.vertex_count();
            if let Some(cap) = cap {
                let cap = cap as usize;
                if count > cap {
                    log::warn!(
                        "part '{}' has {count} vertices, over the batch cap of {cap}",
                        part.name
                    );
                }
                if current.vertex_count() > 0
                    && current.vertex_count() + count > cap
                {
                    let full = std::mem::replace(
                        &mut current,
                        MergedBatch::new(model),
                    );
                    self.commit(full, std::mem::take(&mut placements));
                }
            }
            placements.push(current.push(key, part, resolve(key, part)));
        }

        if !current.parts().is_empty() {
            self.commit(current, placements);
        }
    }

    fn commit(&mut self, batch: MergedBatch, placements: Vec<Placement>) {
        let key = self.batches.insert(batch);
        self.order.push(key);
        for p in placements {
            drop(self.ranges.insert(
                p.key,
                PartRange {
                    batch: key,
                    first_vertex: p.first_vertex,
                    vertex_count: p.vertex_count,
                    first_index: p.first_index,
                    index_count: p.index_count,
                },
            ));
        }
    }
}
