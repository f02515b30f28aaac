//! Block height measurement
//!
//! Two strategies share the [`HeightMeasurer`] capability: a heuristic
//! estimate computed from block type and content, and a measurement read
//! from the host's rendered layout.

use crate::document::{Block, BlockKind, Document};
use crate::error::MeasureError;
use crate::layout::breaks::MeasuredBlock;
use crate::layout::metrics::EstimateMetrics;
use serde::{Deserialize, Serialize};

/// Capability: vertical space occupied by a top-level block
pub trait HeightMeasurer {
    /// Height of `block`, which starts at `position` in the current revision
    fn measure(&self, block: &Block, position: usize) -> Result<f32, MeasureError>;
}

/// Which measurer the engine prefers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeasureStrategy {
    /// Always estimate from content
    Heuristic,
    /// Read the rendered layout, estimating when it is unavailable
    #[default]
    Measured,
}

/// Deterministic height estimation without a rendering surface
#[derive(Debug, Clone, Default)]
pub struct HeuristicMeasurer {
    metrics: EstimateMetrics,
}

impl HeuristicMeasurer {
    pub fn new(metrics: EstimateMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &EstimateMetrics {
        &self.metrics
    }

    /// Estimate the height of a block
    pub fn estimate_height(&self, block: &Block) -> f32 {
        let m = &self.metrics;
        let lines = |len: usize| m.wrapped_lines(len) as f32;

        match &block.kind {
            BlockKind::Heading { level } => m.heading_height(*level).unwrap_or(m.line_height),
            BlockKind::Paragraph => lines(block.text_len()) * m.line_height + m.block_spacing,
            BlockKind::BulletList | BlockKind::OrderedList | BlockKind::TaskList => {
                let items: f32 = block.item_lens().map(|len| lines(len) * m.line_height).sum();
                items + m.list_spacing
            }
            BlockKind::Table => block.row_count() as f32 * m.table_row_height + m.table_spacing,
            BlockKind::Blockquote => {
                lines(block.text_len()) * m.line_height + m.blockquote_padding
            }
            BlockKind::CodeBlock => {
                let code_lines = block.text().map(|t| t.split('\n').count()).unwrap_or(1);
                code_lines as f32 * m.code_line_height + m.code_padding
            }
            BlockKind::HorizontalRule => m.rule_height,
            BlockKind::Other { .. } => m.line_height,
        }
    }
}

impl HeightMeasurer for HeuristicMeasurer {
    fn measure(&self, block: &Block, _position: usize) -> Result<f32, MeasureError> {
        Ok(self.estimate_height(block))
    }
}

/// Rendered box of a top-level block
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBox {
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl BlockBox {
    pub fn new(height: f32, margin_top: f32, margin_bottom: f32) -> Self {
        Self {
            height,
            margin_top,
            margin_bottom,
        }
    }

    /// Box height plus computed margins
    pub fn outer_height(&self) -> f32 {
        self.height + self.margin_top + self.margin_bottom
    }
}

/// Read access to the host's rendered layout
pub trait LayoutSurface {
    /// Whether layout is stable after the latest render pass
    fn is_settled(&self) -> bool;

    /// Rendered box of the top-level block starting at `position`
    fn block_box(&self, position: usize) -> Option<BlockBox>;
}

/// Measures blocks from a rendered layout surface
pub struct RenderedMeasurer<'a> {
    surface: &'a dyn LayoutSurface,
    fallback: &'a HeuristicMeasurer,
}

impl<'a> RenderedMeasurer<'a> {
    pub fn new(surface: &'a dyn LayoutSurface, fallback: &'a HeuristicMeasurer) -> Self {
        Self { surface, fallback }
    }
}

impl HeightMeasurer for RenderedMeasurer<'_> {
    fn measure(&self, block: &Block, position: usize) -> Result<f32, MeasureError> {
        if !self.surface.is_settled() {
            return Err(MeasureError::Unavailable);
        }
        match self.surface.block_box(position) {
            Some(bbox) if bbox.height.is_finite() => {
                // Negative margins may pull the box up past its own height
                let outer = bbox.outer_height();
                Ok(if outer.is_finite() { outer.max(0.0) } else { bbox.height.max(0.0) })
            }
            Some(bbox) => {
                log::warn!(
                    "Rendered height {} for {} at {} is not finite, estimating",
                    bbox.height,
                    block.kind.name(),
                    position
                );
                Ok(self.fallback.estimate_height(block))
            }
            None => {
                log::debug!(
                    "No rendered box for {} at {}, estimating",
                    block.kind.name(),
                    position
                );
                Ok(self.fallback.estimate_height(block))
            }
        }
    }
}

/// Measure every top-level block of a document in order
pub fn measure_document(
    document: &Document,
    measurer: &dyn HeightMeasurer,
) -> Result<Vec<MeasuredBlock>, MeasureError> {
    document
        .positions()
        .enumerate()
        .map(|(index, (position, block))| {
            Ok(MeasuredBlock {
                index,
                position,
                height: measurer.measure(block, position)?,
            })
        })
        .collect()
}

/// A surface backed by heights captured from the renderer
#[derive(Debug, Clone, Default)]
pub struct SnapshotSurface {
    settled: bool,
    boxes: Vec<(usize, BlockBox)>,
}

impl SnapshotSurface {
    /// Pair boxes with block positions of `document`, in order
    pub fn from_boxes(document: &Document, boxes: impl IntoIterator<Item = BlockBox>) -> Self {
        let boxes = document
            .positions()
            .map(|(pos, _)| pos)
            .zip(boxes)
            .collect();
        Self {
            settled: true,
            boxes,
        }
    }

    /// A surface that has not rendered yet
    pub fn unsettled() -> Self {
        Self::default()
    }
}

impl LayoutSurface for SnapshotSurface {
    fn is_settled(&self) -> bool {
        self.settled
    }

    fn block_box(&self, position: usize) -> Option<BlockBox> {
        self.boxes
            .binary_search_by_key(&position, |(pos, _)| *pos)
            .ok()
            .map(|i| self.boxes[i].1)
    }
}
