//! Position remapping across document edits
//!
//! Each step of a transaction replaces one contiguous range of the old
//! position space with a range of a new size. A [`Mapping`] chains those
//! step maps so positions computed against the old revision can be
//! translated into the new one.

use smallvec::SmallVec;

/// Which side a position sticks to when content is inserted exactly at it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    /// Stay before inserted content
    #[default]
    Before,
    /// Move after inserted content
    After,
}

/// Result of mapping a single position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The content around the position was removed
    pub deleted: bool,
}

/// Replacement of `old_size` positions at `start` by `new_size` positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

impl StepMap {
    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        Self {
            start,
            old_size,
            new_size,
        }
    }

    /// Map a position through this step
    pub fn map(&self, pos: usize, assoc: Assoc) -> MapResult {
        let end = self.start + self.old_size;

        if pos < self.start {
            return MapResult { pos, deleted: false };
        }

        if pos > end {
            return MapResult {
                pos: pos - self.old_size + self.new_size,
                deleted: false,
            };
        }

        if self.old_size == 0 {
            // Pure insertion at `pos`
            let pos = match assoc {
                Assoc::Before => self.start,
                Assoc::After => self.start + self.new_size,
            };
            return MapResult { pos, deleted: false };
        }

        if pos == self.start {
            return MapResult {
                pos: self.start,
                deleted: false,
            };
        }

        if pos == end {
            return MapResult {
                pos: self.start + self.new_size,
                deleted: false,
            };
        }

        let pos = match assoc {
            Assoc::Before => self.start,
            Assoc::After => self.start + self.new_size,
        };
        MapResult { pos, deleted: true }
    }
}

/// An ordered chain of step maps valid for a single transition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: SmallVec<[StepMap; 4]>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    /// Append all maps of another mapping (applied after this one)
    pub fn append(&mut self, other: &Mapping) {
        self.maps.extend_from_slice(&other.maps);
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    /// Map a position through every step, in order
    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut deleted = false;
        let mut pos = pos;
        for map in &self.maps {
            let result = map.map(pos, assoc);
            pos = result.pos;
            deleted |= result.deleted;
        }
        MapResult { pos, deleted }
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }
}
