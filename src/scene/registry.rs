use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use super::part::{Appearance, Geometry, Model, ModelId, Part, PartKey};
use crate::error::StrataError;

/// A part ready to be registered: name, world geometry, base appearance.
#[derive(Debug, Clone)]
pub struct NewPart {
    /// Local part name.
    pub name: String,
    /// World-space geometry.
    pub geometry: Arc<Geometry>,
    /// Decoded appearance.
    pub base: Appearance,
}

/// Ids resolved against the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Every part whose name matched one of the ids, in id order.
    pub keys: Vec<PartKey>,
    /// Ids that matched no loaded part.
    pub missing: Vec<String>,
}

impl Resolution {
    /// Whether every id matched at least one part.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Owns every loaded part, keyed by a stable arena key.
///
/// The name index and per-model part lists are derived from the arena and
/// updated only through `insert_model` / `remove_model`.
#[derive(Debug, Default)]
pub struct PartRegistry {
    parts: SlotMap<PartKey, Part>,
    by_name: FxHashMap<String, Vec<PartKey>>,
    /// Models in load order.
    models: Vec<Model>,
}

impl PartRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model and all of its parts. Returns the new part keys in
    /// decode order.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidState`] if the model is already
    /// registered.
    pub fn insert_model(
        &mut self,
        id: ModelId,
        guid: String,
        name: String,
        parts: Vec<NewPart>,
    ) -> Result<Vec<PartKey>, StrataError> {
        if self.model(id).is_some() {
            return Err(StrataError::InvalidState("model already registered"));
        }
        let mut keys = Vec::with_capacity(parts.len());
        for part in parts {
            let key = self.parts.insert(Part {
                model: id,
                name: part.name.clone(),
                geometry: part.geometry,
                base: part.base,
            });
            self.by_name.entry(part.name).or_default().push(key);
            keys.push(key);
        }
        self.models.push(Model {
            id,
            guid,
            name,
            parts: keys.clone(),
        });
        Ok(keys)
    }

    /// Unregister a model, returning its removed parts with their keys.
    /// Returns `None` if the model is not registered.
    pub fn remove_model(
        &mut self,
        id: ModelId,
    ) -> Option<(Model, Vec<(PartKey, Part)>)> {
        let idx = self.models.iter().position(|m| m.id == id)?;
        let model = self.models.remove(idx);
        let removed: Vec<(PartKey, Part)> = model
            .parts
            .iter()
            .filter_map(|&key| self.parts.remove(key).map(|part| (key, part)))
            .collect();

        let mut by_name: FxHashMap<&str, FxHashSet<PartKey>> = FxHashMap::default();
        for (key, part) in &removed {
            let _ = by_name.entry(part.name.as_str()).or_default().insert(*key);
        }
        for (name, gone) in by_name {
            if let Some(keys) = self.by_name.get_mut(name) {
                keys.retain(|k| !gone.contains(k));
                if keys.is_empty() {
                    drop(self.by_name.remove(name));
                }
            }
        }
        Some((model, removed))
    }

    /// Read access to a part.
    #[must_use]
    pub fn part(&self, key: PartKey) -> Option<&Part> {
        self.parts.get(key)
    }

    /// Whether `key` names a live part.
    #[must_use]
    pub fn contains(&self, key: PartKey) -> bool {
        self.parts.contains_key(key)
    }

    /// Every part sharing `name`, across all models.
    #[must_use]
    pub fn lookup(&self, name: &str) -> &[PartKey] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    /// Resolve ids to part keys. Duplicate names expand to every part that
    /// carries them; repeated ids are resolved once.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for id in ids {
            let id = id.as_ref();
            if !seen.insert(id) {
                continue;
            }
            let keys = self.lookup(id);
            if keys.is_empty() {
                resolution.missing.push(id.to_owned());
            } else {
                resolution.keys.extend_from_slice(keys);
            }
        }
        resolution
    }

    /// Read access to a model.
    #[must_use]
    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// All models in load order.
    #[must_use]
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Keys of the parts a model contributed (empty if not loaded).
    #[must_use]
    pub fn parts_of(&self, id: ModelId) -> &[PartKey] {
        self.model(id).map_or(&[], Model::parts)
    }

    /// Iterate over every live part.
    pub fn iter(&self) -> impl Iterator<Item = (PartKey, &Part)> {
        self.parts.iter()
    }

    /// Every live part key.
    pub fn keys(&self) -> impl Iterator<Item = PartKey> + '_ {
        self.parts.keys()
    }

    /// Number of live parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether no part is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
