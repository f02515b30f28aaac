//! Flat buffer protocol for zero-copy overlay transfer
//!
//! ## u32 Buffer Layout:
//! ```text
//! Header:
//! [0]     MAGIC (0x50464F56 = "PFOV" for validation)
//! [1]     SCHEMA_VERSION (protocol version, currently 1)
//! [2]     revision_lo
//! [3]     revision_hi
//! [4]     total_pages
//! [5]     artifact_count
//! [6]     break_count
//! [7]     f32_len (for bounds checking on the JS side)
//! [8..]   per-artifact: [kind, anchor, page, flags]
//!     kind:  0 = page indicator, 1 = page break, 2 = final footer
//!     page:  indicator page, ending page of a break, or last page
//!     flags: bit0 = has_spacer (final footer only)
//! ```
//!
//! ## f32 Buffer Layout:
//! ```text
//! Per-artifact: [a, b, c]
//!   page break:   [footer_fill, gap, header_space]
//!   final footer: [spacer, 0, 0]
//!   indicator:    [0, 0, 0]
//! ```
//! Artifact `i` lives at `HEADER_SIZE + i * U32_PER_ARTIFACT` and
//! `i * F32_PER_ARTIFACT`.

use crate::render::{OverlayArtifact, OverlaySet};

/// Magic number for format validation: "PFOV" (Page Flow OVerlay)
pub const MAGIC: u32 = 0x50464F56;

/// Schema version for protocol compatibility checking
pub const SCHEMA_VERSION: u32 = 1;

/// Header size in u32 elements
pub const HEADER_SIZE: usize = 8;

pub const U32_PER_ARTIFACT: usize = 4;
pub const F32_PER_ARTIFACT: usize = 3;

/// Artifact kind opcodes
pub const KIND_PAGE_INDICATOR: u32 = 0;
pub const KIND_PAGE_BREAK: u32 = 1;
pub const KIND_FINAL_FOOTER: u32 = 2;

/// Flags bitmask
pub const FLAG_HAS_SPACER: u32 = 0b0001;

/// Overlay buffer for zero-copy WASM transfer
pub struct OverlayBuffer {
    /// Integer data (header, kinds, anchors, page numbers)
    pub u32_data: Vec<u32>,
    /// Float data (heights)
    pub f32_data: Vec<f32>,
    artifact_count: u32,
    break_count: u32,
}

impl Default for OverlayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayBuffer {
    pub fn new() -> Self {
        Self {
            u32_data: Vec::with_capacity(HEADER_SIZE + 16 * U32_PER_ARTIFACT),
            f32_data: Vec::with_capacity(16 * F32_PER_ARTIFACT),
            artifact_count: 0,
            break_count: 0,
        }
    }

    pub fn clear(&mut self) {
        self.u32_data.clear();
        self.f32_data.clear();
        self.artifact_count = 0;
        self.break_count = 0;
    }

    /// Pre-allocate for `artifacts` entries so the buffers are not
    /// reallocated while JS holds pointers into them.
    pub fn prepare(&mut self, artifacts: usize) {
        let u32_target = HEADER_SIZE + artifacts * U32_PER_ARTIFACT + 16;
        let f32_target = artifacts * F32_PER_ARTIFACT + 16;

        // Reuse buffers if capacity is sufficient
        if self.u32_data.capacity() < u32_target {
            self.u32_data = Vec::with_capacity(u32_target);
        } else {
            self.u32_data.clear();
        }
        if self.f32_data.capacity() < f32_target {
            self.f32_data = Vec::with_capacity(f32_target);
        } else {
            self.f32_data.clear();
        }
        self.artifact_count = 0;
        self.break_count = 0;
    }

    pub fn write_header(&mut self, revision: u64, total_pages: u32) {
        self.u32_data.push(MAGIC); //                             [0] magic number
        self.u32_data.push(SCHEMA_VERSION); //                    [1] schema version
        self.u32_data.push((revision & 0xFFFFFFFF) as u32); //    [2] revision_lo
        self.u32_data.push((revision >> 32) as u32); //           [3] revision_hi
        self.u32_data.push(total_pages); //                       [4] total pages
        self.u32_data.push(0); //                                 [5] artifact_count (placeholder)
        self.u32_data.push(0); //                                 [6] break_count (placeholder)
        self.u32_data.push(0); //                                 [7] f32_len (placeholder)
    }

    pub fn write_artifact(&mut self, artifact: &OverlayArtifact) {
        let (kind, page, flags, floats) = match artifact {
            OverlayArtifact::PageIndicator { page, .. } => {
                (KIND_PAGE_INDICATOR, *page, 0, [0.0; 3])
            }
            OverlayArtifact::PageBreak {
                ending_page,
                footer_fill,
                gap,
                header_space,
                ..
            } => {
                self.break_count += 1;
                (
                    KIND_PAGE_BREAK,
                    *ending_page,
                    0,
                    [*footer_fill, *gap, *header_space],
                )
            }
            OverlayArtifact::FinalFooter { page, spacer, .. } => match spacer {
                Some(height) => (KIND_FINAL_FOOTER, *page, FLAG_HAS_SPACER, [*height, 0.0, 0.0]),
                None => (KIND_FINAL_FOOTER, *page, 0, [0.0; 3]),
            },
        };

        self.u32_data.push(kind);
        self.u32_data.push(artifact.anchor() as u32);
        self.u32_data.push(page);
        self.u32_data.push(flags);
        self.f32_data.extend_from_slice(&floats);
        self.artifact_count += 1;
    }

    /// Synchronize header counts. Must be called after the last artifact.
    pub fn finalize(&mut self) {
        if self.u32_data.len() < HEADER_SIZE {
            return;
        }
        self.u32_data[5] = self.artifact_count;
        self.u32_data[6] = self.break_count;
        self.u32_data[7] = self.f32_data.len() as u32;
    }

    /// Encode a whole overlay set
    pub fn write_overlay(&mut self, overlay: &OverlaySet, total_pages: u32) {
        self.prepare(overlay.len());
        self.write_header(overlay.revision, total_pages);
        for artifact in overlay.iter() {
            self.write_artifact(artifact);
        }
        self.finalize();
    }

    // Accessors for WASM
    // Return u32 instead of usize for explicit WASM contract (wasm32 linear memory uses u32 offsets)

    pub fn u32_ptr(&self) -> u32 {
        self.u32_data.as_ptr() as u32
    }

    pub fn u32_len(&self) -> u32 {
        self.u32_data.len() as u32
    }

    pub fn f32_ptr(&self) -> u32 {
        self.f32_data.as_ptr() as u32
    }

    pub fn f32_len(&self) -> u32 {
        self.f32_data.len() as u32
    }
}
