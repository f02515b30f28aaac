//! Pagination state exposed to the host UI

use crate::layout::breaks::PageBreaks;
use crate::editing::{Assoc, Mapping};
use crate::layout::geometry::PageGeometry;
use crate::render::OverlaySet;
use serde::Serialize;
use std::ops::Range;

/// Boundary between page `page_number` and the next one
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakPoint {
    /// Position of the first block on the next page
    pub position: usize,
    /// The page that ends here (1-based)
    pub page_number: u32,
    /// Content height used on the page that ends here
    pub filled_height: f32,
}

/// Positions covered by one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRange {
    pub page_number: u32,
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Committed pagination of one document revision
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// Document revision this state was computed from
    pub revision: u64,
    pub breaks: Vec<BreakPoint>,
    pub total_pages: u32,
    pub remaining_height: f32,
    /// Document end position at `revision`
    pub doc_end: usize,
    #[serde(skip)]
    pub overlay: OverlaySet,
}

impl PaginationState {
    pub fn new(
        revision: u64,
        page_breaks: PageBreaks,
        doc_end: usize,
        overlay: OverlaySet,
    ) -> Self {
        Self {
            revision,
            breaks: page_breaks.breaks,
            total_pages: page_breaks.total_pages,
            remaining_height: page_breaks.remaining_height,
            doc_end,
            overlay,
        }
    }

    /// Page (1-based) holding the content at `position`
    pub fn page_for_position(&self, position: usize) -> u32 {
        page_for_position(&self.breaks, position)
    }

    /// First position of a page, used as a scroll target
    pub fn page_start(&self, page_number: u32) -> Option<usize> {
        match page_number {
            0 => None,
            1 => Some(0),
            n if n <= self.total_pages => self
                .breaks
                .get(n as usize - 2)
                .map(|b| b.position),
            _ => None,
        }
    }

    /// Position ranges of every page, in order
    pub fn page_ranges(&self) -> Vec<PageRange> {
        let mut ranges = Vec::with_capacity(self.total_pages as usize);
        let mut start = 0;
        for bp in &self.breaks {
            ranges.push(PageRange {
                page_number: bp.page_number,
                start,
                end: bp.position,
            });
            start = bp.position;
        }
        ranges.push(PageRange {
            page_number: self.total_pages,
            start,
            end: self.doc_end,
        });
        ranges
    }

    /// Height the page container needs to show every page in full
    pub fn container_min_height(&self, geometry: &PageGeometry) -> f32 {
        geometry.stack_height(self.total_pages)
    }

    /// Carry the state across an edit until the next pass replaces it.
    ///
    /// Breaks whose position was deleted, or that collapse onto the
    /// document start or onto an earlier break, are dropped and the
    /// remaining pages renumbered.
    pub fn map(
        &self,
        mapping: &Mapping,
        revision: u64,
        doc_end: usize,
        overlay: OverlaySet,
    ) -> Self {
        let mut breaks: Vec<BreakPoint> = Vec::with_capacity(self.breaks.len());
        for bp in &self.breaks {
            let result = mapping.map_result(bp.position, Assoc::Before);
            if result.deleted || result.pos == 0 {
                continue;
            }
            if breaks.last().is_some_and(|last| last.position >= result.pos) {
                continue;
            }
            breaks.push(BreakPoint {
                position: result.pos,
                page_number: breaks.len() as u32 + 1,
                filled_height: bp.filled_height,
            });
        }
        Self {
            revision,
            total_pages: breaks.len() as u32 + 1,
            breaks,
            remaining_height: self.remaining_height,
            doc_end,
            overlay,
        }
    }

    /// Same breaks and page count, heights equal within `tolerance`
    pub fn same_layout(&self, other: &PaginationState, tolerance: f32) -> bool {
        self.total_pages == other.total_pages
            && self.breaks.len() == other.breaks.len()
            && (self.remaining_height - other.remaining_height).abs() <= tolerance
            && self.breaks.iter().zip(&other.breaks).all(|(a, b)| {
                a.position == b.position
                    && a.page_number == b.page_number
                    && (a.filled_height - b.filled_height).abs() <= tolerance
            })
    }
}

/// Binary search over ordered breaks
pub fn page_for_position(breaks: &[BreakPoint], position: usize) -> u32 {
    breaks.partition_point(|b| b.position <= position) as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::StepMap;

    fn state() -> PaginationState {
        let breaks = PageBreaks {
            breaks: vec![
                BreakPoint {
                    position: 100,
                    page_number: 1,
                    filled_height: 900.0,
                },
                BreakPoint {
                    position: 250,
                    page_number: 2,
                    filled_height: 920.0,
                },
            ],
            total_pages: 3,
            remaining_height: 400.0,
        };
        PaginationState::new(4, breaks, 300, OverlaySet::default())
    }

    #[test]
    fn test_page_for_position() {
        let state = state();
        assert_eq!(state.page_for_position(0), 1);
        assert_eq!(state.page_for_position(99), 1);
        assert_eq!(state.page_for_position(100), 2);
        assert_eq!(state.page_for_position(249), 2);
        assert_eq!(state.page_for_position(250), 3);
        assert_eq!(state.page_for_position(10_000), 3);
        assert_eq!(page_for_position(&[], 42), 1);
    }

    #[test]
    fn test_page_start() {
        let state = state();
        assert_eq!(state.page_start(0), None);
        assert_eq!(state.page_start(1), Some(0));
        assert_eq!(state.page_start(2), Some(100));
        assert_eq!(state.page_start(3), Some(250));
        assert_eq!(state.page_start(4), None);
    }

    #[test]
    fn test_page_ranges() {
        let ranges = state().page_ranges();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].range(), 0..100);
        assert_eq!(ranges[1].range(), 100..250);
        assert_eq!(ranges[2], PageRange { page_number: 3, start: 250, end: 300 });
    }

    #[test]
    fn test_container_min_height() {
        let geometry = PageGeometry::default();
        assert_eq!(state().container_min_height(&geometry), 3.0 * 1123.0 + 2.0 * 24.0);
    }

    #[test]
    fn test_map_shifts_breaks() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(10, 0, 500));
        let mapped = state().map(&mapping, 5, 800, OverlaySet::default());
        assert_eq!(mapped.revision, 5);
        assert_eq!(mapped.doc_end, 800);
        assert_eq!(mapped.page_start(2), Some(600));
        assert_eq!(mapped.page_for_position(100), 1);
        assert_eq!(mapped.page_for_position(750), 3);
    }

    #[test]
    fn test_map_drops_deleted_breaks() {
        let mut mapping = Mapping::new();
        // Removes 90..200, swallowing the break at 100
        mapping.push(StepMap::new(90, 110, 0));
        let mapped = state().map(&mapping, 5, 190, OverlaySet::default());
        assert_eq!(mapped.total_pages, 2);
        assert_eq!(mapped.breaks.len(), 1);
        assert_eq!(mapped.breaks[0].position, 140);
        assert_eq!(mapped.breaks[0].page_number, 1);
        assert_eq!(mapped.page_ranges().last().unwrap().end, 190);
    }

    #[test]
    fn test_same_layout_tolerance() {
        let a = state();
        let mut b = state();
        b.remaining_height += 0.2;
        assert!(a.same_layout(&b, 0.5));
        b.breaks[0].position += 1;
        assert!(!a.same_layout(&b, 0.5));
    }
}
