//! page-flow: pagination engine for a paged rich-text editor
//!
//! This crate decides where page boundaries fall in a continuously edited
//! document:
//! - Heuristic or measured block heights behind one capability
//! - Greedy break calculation over top-level blocks
//! - Presentation-only overlay artifacts, remapped across edits and diffed
//! - A debounced, coalescing update scheduler driven by explicit time

pub mod document;
pub mod editing;
pub mod error;
pub mod layout;
pub mod render;
pub mod scheduler;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use document::{Block, BlockContent, BlockKind, Document, DocumentChange};
pub use editing::{Assoc, Mapping, Step, Transaction};
pub use error::{ConfigError, DocumentError, Error, MeasureError, Result, SerializeError};
pub use layout::{
    BlockBox, BreakPoint, FrameOutcome, LayoutSurface, MeasureStrategy, OverlayCommit, PageConfig,
    PageGeometry, PageRange, PageSize, PaginationState, Paginator, PaginatorConfig,
};
pub use render::{OverlayArtifact, OverlayDiff, OverlayPatch, OverlaySet};
pub use scheduler::{Clock, SchedulerAction, SchedulerConfig, SystemClock};

/// A document together with the engine paginating it
pub struct PagedEditor {
    document: Document,
    paginator: Paginator,
}

impl PagedEditor {
    /// Create an editor over an empty document
    pub fn new(config: PaginatorConfig) -> Result<Self, ConfigError> {
        Self::with_document(Document::new(), config)
    }

    pub fn with_document(document: Document, config: PaginatorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            document,
            paginator: Paginator::new(config)?,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn paginator_mut(&mut self) -> &mut Paginator {
        &mut self.paginator
    }

    /// Schedule the initial pass
    pub fn start(&mut self, now_ms: u64) {
        self.paginator.start(&self.document, now_ms);
    }

    /// Replace the whole document and schedule a fresh initial pass
    pub fn set_document(&mut self, document: Document, now_ms: u64) {
        self.document = document;
        self.paginator.start(&self.document, now_ms);
    }

    /// Apply a transaction and notify the engine
    pub fn apply(
        &mut self,
        transaction: &Transaction,
        now_ms: u64,
    ) -> Result<DocumentChange, DocumentError> {
        let change = self.document.apply(transaction)?;
        self.paginator.on_document_changed(&change, now_ms);
        Ok(change)
    }

    /// Drive the scheduler once. Returns the frame outcome when a layout
    /// frame was due and has been processed.
    pub fn tick(
        &mut self,
        now_ms: u64,
        surface: Option<&dyn LayoutSurface>,
    ) -> Option<FrameOutcome> {
        match self.paginator.poll(now_ms) {
            SchedulerAction::RequestLayoutFrame { .. } | SchedulerAction::AwaitingFrame => {
                Some(self.layout_frame(surface, now_ms))
            }
            SchedulerAction::Sleep | SchedulerAction::Wait { .. } => None,
        }
    }

    /// Hand a layout frame to the engine
    pub fn layout_frame(
        &mut self,
        surface: Option<&dyn LayoutSurface>,
        now_ms: u64,
    ) -> FrameOutcome {
        self.paginator.on_layout_frame(&self.document, surface, now_ms)
    }

    /// Run a pass immediately, bypassing the scheduler
    pub fn recalculate(&mut self, surface: Option<&dyn LayoutSurface>) -> FrameOutcome {
        self.paginator.recalculate(&self.document, surface)
    }

    /// Document content as HTML. Never carries overlay markup.
    pub fn serialize(&self) -> String {
        self.document.to_html()
    }

    /// Strip overlay markup from HTML captured from the rendered surface
    pub fn sanitize(&self, markup: &str) -> Result<String, SerializeError> {
        document::serialize::strip_overlays(markup)
    }

    /// Rendered overlay markup keyed by artifact
    pub fn overlay_html(&self) -> Vec<(String, String)> {
        render::render_overlay(self.paginator.overlay())
    }
}
