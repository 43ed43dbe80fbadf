//! 24-bit picking colors and their allocator.

use std::collections::VecDeque;

use crate::error::StrataError;

/// Largest id representable in a 24-bit RGB color. Id `0` is background.
pub const MAX_PICK_ID: u32 = 0x00FF_FFFF;

/// A unique solid color identifying one part in the picking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickColor(u32);

impl PickColor {
    /// The integer id behind the color.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Encode as an opaque RGBA texel (red holds the high byte).
    #[must_use]
    pub const fn to_rgba(self) -> [u8; 4] {
        [
            (self.0 >> 16) as u8,
            (self.0 >> 8) as u8,
            self.0 as u8,
            u8::MAX,
        ]
    }

    /// Decode a texel read back from the picking target. Background (cleared
    /// to zero) and non-opaque texels decode to `None`.
    #[must_use]
    pub fn from_rgba(rgba: [u8; 4]) -> Option<Self> {
        if rgba[3] != u8::MAX {
            return None;
        }
        let id = (u32::from(rgba[0]) << 16)
            | (u32::from(rgba[1]) << 8)
            | u32::from(rgba[2]);
        (id != 0).then_some(Self(id))
    }
}

/// Hands out unique picking colors.
///
/// Fresh ids come from a monotonically increasing counter. Released ids are
/// held back until the next pick pass starts, so a texel rendered before a
/// part was removed can never resolve to the part that inherits its color;
/// after that they are reused, oldest first, before the counter advances.
#[derive(Debug, Clone)]
pub struct PickColorAllocator {
    next: u32,
    limit: u32,
    free: VecDeque<u32>,
    released: Vec<u32>,
    live: usize,
}

impl Default for PickColorAllocator {
    fn default() -> Self {
        Self::with_limit(MAX_PICK_ID)
    }
}

impl PickColorAllocator {
    /// Allocator over the full 24-bit id space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator over ids `1..=limit` (clamped to the 24-bit space).
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            next: 1,
            limit: limit.min(MAX_PICK_ID),
            free: VecDeque::new(),
            released: Vec::new(),
            live: 0,
        }
    }

    /// Take a color.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::PickColorsExhausted`] when every id is live.
    /// Two parts never share a color.
    pub fn allocate(&mut self) -> Result<PickColor, StrataError> {
        if self.free.is_empty() && self.next > self.limit {
            self.recycle_released();
        }
        let id = if let Some(id) = self.free.pop_front() {
            id
        } else if self.next <= self.limit {
            let id = self.next;
            self.next += 1;
            id
        } else {
            log::error!("picking color space exhausted ({} live)", self.live);
            return Err(StrataError::PickColorsExhausted);
        };
        self.live += 1;
        Ok(PickColor(id))
    }

    /// Return a color. It becomes reusable after the next pass starts.
    pub fn release(&mut self, color: PickColor) {
        self.released.push(color.0);
        self.live = self.live.saturating_sub(1);
    }

    /// Make released colors available for reuse.
    pub fn recycle_released(&mut self) {
        self.free.extend(self.released.drain(..));
    }

    /// Number of colors currently assigned.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_encoding_round_trips_high_ids() {
        let color = PickColor(0x12_34_56);
        assert_eq!(color.to_rgba(), [0x12, 0x34, 0x56, 0xFF]);
        assert_eq!(PickColor::from_rgba(color.to_rgba()), Some(color));
        assert_eq!(PickColor::from_rgba([0, 0, 0, 0]), None);
        assert_eq!(PickColor::from_rgba([0, 0, 0, 255]), None);
    }

    #[test]
    fn released_ids_wait_for_next_pass() {
        let mut alloc = PickColorAllocator::new();
        let a = alloc.allocate().unwrap();
        alloc.release(a);
        let b = alloc.allocate().unwrap();
        assert_ne!(a, b);

        alloc.recycle_released();
        assert_eq!(alloc.allocate().unwrap(), a);
        assert_eq!(alloc.live(), 2);
    }

    #[test]
    fn exhaustion_fails_closed() {
        let mut alloc = PickColorAllocator::with_limit(2);
        let a = alloc.allocate().unwrap();
        let _b = alloc.allocate().unwrap();
        assert!(matches!(
            alloc.allocate(),
            Err(StrataError::PickColorsExhausted)
        ));

        // A released id is reclaimed once nothing fresh is left.
        alloc.release(a);
        assert_eq!(alloc.allocate().unwrap(), a);
    }
}
