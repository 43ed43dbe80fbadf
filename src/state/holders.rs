//! Id-set holders for selection, isolation, visibility, highlight and
//! custom colors. Every mutation reports the parts whose flags changed.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::scene::{Appearance, PartKey};

/// A set of parts with change-reporting mutations.
#[derive(Debug, Clone, Default)]
pub struct PartSet {
    members: FxHashSet<PartKey>,
}

impl PartSet {
    /// Replace the whole set. Returns the parts that left or joined it.
    pub fn replace(&mut self, keys: &[PartKey]) -> Vec<PartKey> {
        let next: FxHashSet<PartKey> = keys.iter().copied().collect();
        let mut changed: Vec<PartKey> = self
            .members
            .iter()
            .filter(|k| !next.contains(*k))
            .copied()
            .collect();
        changed.extend(keys.iter().filter(|k| !self.members.contains(*k)));
        self.members = next;
        dedup_keys(changed)
    }

    /// Add one part. Returns `true` if it was not already a member.
    pub fn add(&mut self, key: PartKey) -> bool {
        self.members.insert(key)
    }

    /// Remove one part. Returns `true` if it was a member.
    pub fn remove(&mut self, key: PartKey) -> bool {
        self.members.remove(&key)
    }

    /// Empty the set. Returns the former members.
    pub fn clear(&mut self) -> Vec<PartKey> {
        self.members.drain().collect()
    }

    /// Whether `key` is a member.
    #[must_use]
    pub fn contains(&self, key: PartKey) -> bool {
        self.members.contains(&key)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over members in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = PartKey> + '_ {
        self.members.iter().copied()
    }

    fn forget(&mut self, keys: &[PartKey]) {
        for key in keys {
            let _ = self.members.remove(key);
        }
    }
}

/// The hovered identifier and the parts that carry it.
///
/// Holds at most one identifier; with duplicate names that identifier can
/// cover more than one part.
#[derive(Debug, Clone, Default)]
pub struct Highlight {
    id: Option<String>,
    parts: PartSet,
}

impl Highlight {
    /// Currently hovered identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether `key` is highlighted.
    #[must_use]
    pub fn contains(&self, key: PartKey) -> bool {
        self.parts.contains(key)
    }

    /// Point the highlight at `id` (resolved to `keys`), or clear it.
    /// Returns the parts whose highlight flag changed.
    ///
    /// Re-hovering the same id re-resolves it, picking up parts loaded under
    /// that name since.
    pub fn set(&mut self, id: Option<String>, keys: &[PartKey]) -> Vec<PartKey> {
        self.id = id;
        if self.id.is_some() {
            self.parts.replace(keys)
        } else {
            self.parts.clear()
        }
    }
}

/// Explicit per-part color overrides.
#[derive(Debug, Clone, Default)]
pub struct CustomColors {
    colors: FxHashMap<PartKey, Appearance>,
}

impl CustomColors {
    /// Assign `appearance` to every key. Returns keys whose override changed.
    pub fn assign(&mut self, keys: &[PartKey], appearance: Appearance) -> Vec<PartKey> {
        let changed = keys
            .iter()
            .copied()
            .filter(|&key| self.colors.insert(key, appearance) != Some(appearance))
            .collect();
        dedup_keys(changed)
    }

    /// Drop the override of every key. Returns keys that had one.
    pub fn remove(&mut self, keys: &[PartKey]) -> Vec<PartKey> {
        keys.iter()
            .copied()
            .filter(|key| self.colors.remove(key).is_some())
            .collect()
    }

    /// Drop every override. Returns the keys that had one.
    pub fn clear(&mut self) -> Vec<PartKey> {
        self.colors.drain().map(|(key, _)| key).collect()
    }

    /// Override of `key`, if any.
    #[must_use]
    pub fn get(&self, key: PartKey) -> Option<Appearance> {
        self.colors.get(&key).copied()
    }

    /// Number of overridden parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no part is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    fn forget(&mut self, keys: &[PartKey]) {
        for key in keys {
            let _ = self.colors.remove(key);
        }
    }
}

/// How a selection request combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    /// Exclusive replace (plain trigger).
    #[default]
    Replace,
    /// Toggle each part in or out (modified trigger).
    Toggle,
}

/// All interaction side tables, keyed by part.
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    selection: PartSet,
    isolation: PartSet,
    hidden: PartSet,
    highlight: Highlight,
    custom: CustomColors,
}

impl InteractionState {
    /// Create empty holders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gather the encoder input for one part from every holder.
    #[must_use]
    pub fn state_of(&self, key: PartKey) -> super::PartState {
        super::PartState {
            hidden: self.hidden.contains(key),
            custom: self.custom.get(key),
            selected: self.selection.contains(key),
            isolated: self.isolation.contains(key),
            highlighted: self.highlight.contains(key),
        }
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> &PartSet {
        &self.selection
    }

    /// Parts currently faded out by isolation.
    #[must_use]
    pub fn isolation(&self) -> &PartSet {
        &self.isolation
    }

    /// Hidden parts.
    #[must_use]
    pub fn hidden(&self) -> &PartSet {
        &self.hidden
    }

    /// Hover highlight.
    #[must_use]
    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    /// Custom color overrides.
    #[must_use]
    pub fn custom(&self) -> &CustomColors {
        &self.custom
    }

    /// Apply a selection request.
    ///
    /// Replacing the selection with nothing also ends isolation, so a
    /// deselect-all always returns the scene to its base state.
    pub fn select(&mut self, keys: &[PartKey], mode: SelectMode) -> Vec<PartKey> {
        match mode {
            SelectMode::Replace => {
                let mut changed = self.selection.replace(keys);
                if keys.is_empty() {
                    changed.extend(self.isolation.clear());
                }
                dedup_keys(changed)
            }
            SelectMode::Toggle => {
                let changed = dedup_keys(keys.to_vec());
                for &key in &changed {
                    if !self.selection.remove(key) {
                        let _ = self.selection.add(key);
                    }
                }
                changed
            }
        }
    }

    /// Fade out every part of `all` except `keep`. An empty `keep` ends
    /// isolation.
    pub fn isolate(
        &mut self,
        keep: &[PartKey],
        all: impl Iterator<Item = PartKey>,
    ) -> Vec<PartKey> {
        if keep.is_empty() {
            return self.isolation.clear();
        }
        let keep: FxHashSet<PartKey> = keep.iter().copied().collect();
        let faded: Vec<PartKey> = all.filter(|k| !keep.contains(k)).collect();
        self.isolation.replace(&faded)
    }

    /// Fade out everything but the current selection.
    pub fn isolate_selected(
        &mut self,
        all: impl Iterator<Item = PartKey>,
    ) -> Vec<PartKey> {
        let keep: Vec<PartKey> = self.selection.iter().collect();
        self.isolate(&keep, all)
    }

    /// Hide parts.
    pub fn hide(&mut self, keys: &[PartKey]) -> Vec<PartKey> {
        keys.iter().copied().filter(|&k| self.hidden.add(k)).collect()
    }

    /// Show hidden parts again.
    pub fn show(&mut self, keys: &[PartKey]) -> Vec<PartKey> {
        keys.iter().copied().filter(|&k| self.hidden.remove(k)).collect()
    }

    /// Show every hidden part.
    pub fn show_all(&mut self) -> Vec<PartKey> {
        self.hidden.clear()
    }

    /// Assign a custom color.
    pub fn color(&mut self, keys: &[PartKey], appearance: Appearance) -> Vec<PartKey> {
        self.custom.assign(keys, appearance)
    }

    /// Remove custom colors from `keys`, or from every part.
    pub fn reset_colors(&mut self, keys: Option<&[PartKey]>) -> Vec<PartKey> {
        match keys {
            Some(keys) => self.custom.remove(keys),
            None => self.custom.clear(),
        }
    }

    /// Point the hover highlight at an identifier, or clear it.
    pub fn hover(&mut self, id: Option<String>, keys: &[PartKey]) -> Vec<PartKey> {
        self.highlight.set(id, keys)
    }

    /// Drop unloaded parts from every holder.
    pub fn forget(&mut self, keys: &[PartKey]) {
        self.selection.forget(keys);
        self.isolation.forget(keys);
        self.hidden.forget(keys);
        self.highlight.parts.forget(keys);
        if self.highlight.parts.is_empty() {
            self.highlight.id = None;
        }
        self.custom.forget(keys);
    }
}

/// Remove repeated keys, keeping first occurrences in order.
pub(crate) fn dedup_keys(keys: Vec<PartKey>) -> Vec<PartKey> {
    let mut seen = FxHashSet::default();
    keys.into_iter().filter(|k| seen.insert(*k)).collect()
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn keys(n: usize) -> Vec<PartKey> {
        let mut arena: SlotMap<PartKey, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn replace_reports_symmetric_difference() {
        let k = keys(3);
        let mut set = PartSet::default();
        assert_eq!(set.replace(&[k[0], k[1]]), vec![k[0], k[1]]);
        let changed = set.replace(&[k[1], k[2]]);
        assert_eq!(changed.len(), 2);
        assert!(changed.contains(&k[0]) && changed.contains(&k[2]));
        assert!(set.replace(&[k[1], k[2]]).is_empty());
    }

    #[test]
    fn toggle_flips_membership() {
        let k = keys(2);
        let mut state = InteractionState::new();
        let _ = state.select(&[k[0]], SelectMode::Replace);
        let changed = state.select(&[k[0], k[1]], SelectMode::Toggle);
        assert_eq!(changed, vec![k[0], k[1]]);
        assert!(!state.selection().contains(k[0]));
        assert!(state.selection().contains(k[1]));
    }

    #[test]
    fn empty_replace_ends_isolation() {
        let k = keys(3);
        let mut state = InteractionState::new();
        let _ = state.select(&[k[0]], SelectMode::Replace);
        let faded = state.isolate_selected(k.iter().copied());
        assert_eq!(faded.len(), 2);
        assert!(state.isolation().contains(k[2]));

        let changed = state.select(&[], SelectMode::Replace);
        assert_eq!(changed.len(), 3);
        assert!(state.isolation().is_empty());
        assert!(state.selection().is_empty());
    }

    #[test]
    fn hover_same_id_is_not_a_change() {
        let k = keys(2);
        let mut state = InteractionState::new();
        assert_eq!(state.hover(Some("beam".into()), &k), k);
        assert!(state.hover(Some("beam".into()), &k).is_empty());
        assert_eq!(state.hover(None, &[]).len(), 2);
        assert_eq!(state.highlight().id(), None);
    }

    #[test]
    fn rehover_picks_up_new_parts_with_same_id() {
        let k = keys(2);
        let mut state = InteractionState::new();
        assert_eq!(state.hover(Some("door".into()), &k[..1]), vec![k[0]]);
        assert_eq!(state.hover(Some("door".into()), &k), vec![k[1]]);
        assert!(state.highlight().contains(k[0]));
        assert!(state.highlight().contains(k[1]));
    }

    #[test]
    fn recoloring_with_same_value_is_not_a_change() {
        let k = keys(1);
        let mut state = InteractionState::new();
        let red = Appearance::opaque([255, 0, 0]);
        assert_eq!(state.color(&k, red), k);
        assert!(state.color(&k, red).is_empty());
        assert_eq!(state.reset_colors(None), k);
    }

    #[test]
    fn forget_scrubs_every_holder() {
        let k = keys(1);
        let mut state = InteractionState::new();
        let _ = state.select(&k, SelectMode::Replace);
        let _ = state.hide(&k);
        let _ = state.hover(Some("x".into()), &k);
        let _ = state.color(&k, Appearance::opaque([0, 0, 0]));
        state.forget(&k);
        assert_eq!(state.state_of(k[0]), crate::state::PartState::default());
        assert_eq!(state.highlight().id(), None);
    }
}
