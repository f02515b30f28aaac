//! Constants for heuristic height estimation

use serde::{Deserialize, Serialize};

/// Metrics needed for heuristic block height estimation, in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstimateMetrics {
    /// Height of one line of body text
    pub line_height: f32,
    /// Approximate characters per wrapped line
    pub chars_per_line: usize,
    /// Fixed heights for heading levels 1, 2 and 3
    pub heading_heights: [f32; 3],
    /// Space after a paragraph
    pub block_spacing: f32,
    /// Space around a list
    pub list_spacing: f32,
    pub table_row_height: f32,
    pub table_spacing: f32,
    /// Vertical padding of a blockquote
    pub blockquote_padding: f32,
    pub code_line_height: f32,
    pub code_padding: f32,
    pub rule_height: f32,
}

impl Default for EstimateMetrics {
    fn default() -> Self {
        Self {
            line_height: 24.0,
            chars_per_line: 80,
            heading_heights: [48.0, 36.0, 30.0],
            block_spacing: 16.0,
            list_spacing: 16.0,
            table_row_height: 40.0,
            table_spacing: 16.0,
            blockquote_padding: 24.0,
            code_line_height: 20.0,
            code_padding: 16.0,
            rule_height: 32.0,
        }
    }
}

impl EstimateMetrics {
    /// Number of wrapped lines for a text length, never less than one
    pub fn wrapped_lines(&self, text_len: usize) -> usize {
        let per_line = self.chars_per_line.max(1);
        text_len.div_ceil(per_line).max(1)
    }

    /// Fixed height for a heading level, if it has one
    pub fn heading_height(&self, level: u8) -> Option<f32> {
        match level {
            1..=3 => Some(self.heading_heights[level as usize - 1]),
            _ => None,
        }
    }
}
