//! Break calculation over measured top-level blocks

use crate::layout::pagination::BreakPoint;
use serde::Serialize;

/// A top-level block with its position and measured height
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuredBlock {
    /// Index of the block in the document
    pub index: usize,
    /// Start position of the block
    pub position: usize,
    pub height: f32,
}

impl MeasuredBlock {
    pub fn new(index: usize, position: usize, height: f32) -> Self {
        Self {
            index,
            position,
            height,
        }
    }
}

/// Output of the break calculator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBreaks {
    pub breaks: Vec<BreakPoint>,
    pub total_pages: u32,
    /// Unused content height on the final page
    pub remaining_height: f32,
}

impl PageBreaks {
    /// Pagination of a document without blocks
    pub fn empty(content_height: f32) -> Self {
        Self {
            breaks: Vec::new(),
            total_pages: 1,
            remaining_height: content_height,
        }
    }
}

/// Decide page breaks for blocks laid out in document order.
///
/// The first block on a page is always placed, however tall, so an
/// oversized block occupies a page alone. A block that exactly fills the
/// remaining space stays on the current page.
///
/// # Panics
///
/// Panics on non-finite or negative heights, a non-positive content
/// height, or positions that are not strictly increasing.
pub fn calculate_breaks(blocks: &[MeasuredBlock], content_height: f32) -> PageBreaks {
    assert!(
        content_height.is_finite() && content_height > 0.0,
        "content height must be positive, got {content_height}"
    );

    let mut breaks = Vec::new();
    let mut page_number: u32 = 1;
    let mut accumulated: f32 = 0.0;
    let mut last_position: Option<usize> = None;

    for block in blocks {
        assert!(
            block.height.is_finite() && block.height >= 0.0,
            "block {} has invalid height {}",
            block.index,
            block.height
        );
        if let Some(last) = last_position {
            assert!(
                block.position > last,
                "block positions must increase: {} after {}",
                block.position,
                last
            );
        }
        last_position = Some(block.position);

        if accumulated == 0.0 {
            accumulated = block.height;
        } else if accumulated + block.height > content_height {
            breaks.push(BreakPoint {
                position: block.position,
                page_number,
                filled_height: accumulated,
            });
            page_number += 1;
            accumulated = block.height;
        } else {
            accumulated += block.height;
        }
    }

    PageBreaks {
        breaks,
        total_pages: page_number,
        remaining_height: (content_height - accumulated).max(0.0),
    }
}
