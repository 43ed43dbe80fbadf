use std::ops::Range;

use crate::scene::{Appearance, ModelId, Part, PartKey};

slotmap::new_key_type! {
    /// Stable key of a merged batch.
    pub struct BatchKey;
}

/// Where a part's data sits inside its batch.
///
/// Ranges are assigned when a batch is built and never move afterwards;
/// [`super::MergedGeometry::patch`] only rewrites the color bytes inside
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    /// Owning batch.
    pub batch: BatchKey,
    /// First vertex of the part within the batch.
    pub first_vertex: u32,
    /// Number of vertices.
    pub vertex_count: u32,
    /// First index of the part within the batch index array.
    pub first_index: u32,
    /// Number of indices.
    pub index_count: u32,
}

impl PartRange {
    /// Vertex range as `usize` bounds.
    #[must_use]
    pub fn vertices(&self) -> Range<usize> {
        let start = self.first_vertex as usize;
        start..start + self.vertex_count as usize
    }

    /// Index range as `usize` bounds.
    #[must_use]
    pub fn indices(&self) -> Range<usize> {
        let start = self.first_index as usize;
        start..start + self.index_count as usize
    }
}

/// One GPU-ready draw payload combining several parts.
#[derive(Debug, Clone, Default)]
pub struct MergedBatch {
    model: Option<ModelId>,
    positions: Vec<[f32; 3]>,
    colors: Vec<[u8; 4]>,
    indices: Vec<u32>,
    parts: Vec<PartKey>,
    dirty: Vec<Range<u32>>,
    uploaded: bool,
}

/// Local placement of a part inside a batch under construction.
pub(super) struct Placement {
    pub key: PartKey,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub first_index: u32,
    pub index_count: u32,
}

impl MergedBatch {
    pub(super) fn new(model: Option<ModelId>) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Append a part, offsetting its indices by the current vertex count.
    pub(super) fn push(
        &mut self,
        key: PartKey,
        part: &Part,
        appearance: Appearance,
    ) -> Placement {
        let first_vertex = self.positions.len() as u32;
        let first_index = self.indices.len() as u32;
        let geometry = &part.geometry;

        self.positions
            .extend(geometry.positions.iter().map(|p| p.to_array()));
        self.colors.extend(std::iter::repeat_n(
            appearance.to_rgba(),
            geometry.positions.len(),
        ));
        self.indices
            .extend(geometry.indices.iter().map(|&i| i + first_vertex));
        self.parts.push(key);

        Placement {
            key,
            first_vertex,
            vertex_count: geometry.positions.len() as u32,
            first_index,
            index_count: geometry.indices.len() as u32,
        }
    }

    /// Overwrite the color bytes of one part's vertex range.
    pub(super) fn write_colors(&mut self, range: &PartRange, rgba: [u8; 4]) {
        let vertices = range.vertices();
        if let Some(slot) = self.colors.get_mut(vertices) {
            slot.fill(rgba);
            self.dirty
                .push(range.first_vertex..range.first_vertex + range.vertex_count);
        }
    }

    /// Model this batch belongs to (`None` for a whole-scene batch).
    #[must_use]
    pub fn model(&self) -> Option<ModelId> {
        self.model
    }

    /// Vertex positions.
    #[must_use]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Per-vertex RGBA; alpha is the resolved opacity.
    #[must_use]
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    /// Triangle-list indices.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Parts in this batch, in placement order.
    #[must_use]
    pub fn parts(&self) -> &[PartKey] {
        &self.parts
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Whether the batch addresses more vertices than 16-bit indices can.
    #[must_use]
    pub fn needs_wide_indices(&self) -> bool {
        self.positions.len() > usize::from(u16::MAX) + 1
    }

    /// Whether a full upload is still pending. Clears the flag.
    pub fn take_full_upload(&mut self) -> bool {
        if self.uploaded {
            false
        } else {
            self.uploaded = true;
            self.dirty.clear();
            true
        }
    }

    /// Vertex ranges whose colors changed since the last call, sorted and
    /// coalesced.
    pub fn take_dirty_ranges(&mut self) -> Vec<Range<u32>> {
        let mut ranges = std::mem::take(&mut self.dirty);
        ranges.sort_by_key(|r| r.start);
        let mut merged: Vec<Range<u32>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => {
                    last.end = last.end.max(range.end);
                }
                _ => merged.push(range),
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_ranges_coalesce() {
        let mut batch = MergedBatch::new(None);
        batch.dirty = vec![8..12, 0..4, 4..6, 10..16];
        assert_eq!(batch.take_dirty_ranges(), vec![0..6, 8..16]);
        assert!(batch.take_dirty_ranges().is_empty());
    }

    #[test]
    fn full_upload_is_reported_once() {
        let mut batch = MergedBatch::new(None);
        batch.dirty.push(0..1);
        assert!(batch.take_full_upload());
        assert!(!batch.take_full_upload());
        assert!(batch.take_dirty_ranges().is_empty());
    }
}
