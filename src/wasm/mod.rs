//! WASM bindings for the pagination engine
//!
//! Structured values cross the bridge as JSON strings; the overlay is also
//! available as a flat buffer the host reads from linear memory.

pub mod flat_buffer;

use crate::document::serialize::strip_overlays;
use crate::document::Document;
use crate::editing::Transaction;
use crate::error::Error;
use crate::layout::{BlockBox, PaginatorConfig, SnapshotSurface};
use crate::render::{render_overlay, PRINT_CSS};
use crate::scheduler::{Clock, SystemClock};
use crate::PagedEditor;
use flat_buffer::OverlayBuffer;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string(value)?)
}

fn parse_config(config_json: &str) -> Result<PaginatorConfig, Error> {
    if config_json.trim().is_empty() {
        return Ok(PaginatorConfig::default());
    }
    Ok(serde_json::from_str(config_json)?)
}

#[derive(Serialize)]
struct KeyedMarkup<'a> {
    key: &'a str,
    html: &'a str,
}

/// WASM-exposed pagination engine
#[wasm_bindgen]
pub struct WasmPaginator {
    editor: PagedEditor,
    clock: SystemClock,
    buffer: OverlayBuffer,
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create an engine from a JSON configuration; an empty string uses defaults
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmPaginator, JsError> {
        let config = parse_config(config_json)?;
        Ok(Self {
            editor: PagedEditor::new(config).map_err(Error::from)?,
            clock: SystemClock,
            buffer: OverlayBuffer::new(),
        })
    }

    /// Load a document (JSON) and schedule the initial pass
    #[wasm_bindgen(js_name = setDocument)]
    pub fn set_document(&mut self, document_json: &str) -> Result<(), JsError> {
        let document: Document = serde_json::from_str(document_json).map_err(Error::from)?;
        self.editor.set_document(document, self.clock.now_ms());
        Ok(())
    }

    /// Apply a transaction (JSON); returns the new revision
    #[wasm_bindgen(js_name = applyTransaction)]
    pub fn apply_transaction(&mut self, transaction_json: &str) -> Result<f64, JsError> {
        let transaction: Transaction =
            serde_json::from_str(transaction_json).map_err(Error::from)?;
        let change = self
            .editor
            .apply(&transaction, self.clock.now_ms())
            .map_err(Error::from)?;
        Ok(change.after.revision() as f64)
    }

    /// Next scheduler action as JSON
    pub fn poll(&mut self) -> Result<String, JsError> {
        let action = self.editor.paginator_mut().poll(self.clock.now_ms());
        Ok(to_json(&action)?)
    }

    /// Hand over a rendered layout frame: one height and margin pair per
    /// top-level block, in document order. Returns the outcome as JSON.
    #[wasm_bindgen(js_name = layoutFrame)]
    pub fn layout_frame(
        &mut self,
        heights: &[f32],
        margins_top: &[f32],
        margins_bottom: &[f32],
        settled: bool,
    ) -> Result<String, JsError> {
        // Unparseable computed margins arrive as NaN and count as zero
        let margin = |values: &[f32], i: usize| {
            values
                .get(i)
                .copied()
                .filter(|m| m.is_finite())
                .unwrap_or(0.0)
        };
        let surface = if settled {
            let boxes = heights.iter().enumerate().map(|(i, &height)| {
                BlockBox::new(height, margin(margins_top, i), margin(margins_bottom, i))
            });
            SnapshotSurface::from_boxes(self.editor.document(), boxes)
        } else {
            SnapshotSurface::unsettled()
        };

        let outcome = self.editor.layout_frame(Some(&surface), self.clock.now_ms());
        Ok(to_json(&outcome)?)
    }

    /// Estimate heights and paginate synchronously
    pub fn recalculate(&mut self) -> Result<String, JsError> {
        let outcome = self.editor.recalculate(None);
        Ok(to_json(&outcome)?)
    }

    #[wasm_bindgen(js_name = setPageSize)]
    pub fn set_page_size(&mut self, key: &str) -> Result<(), JsError> {
        let now = self.clock.now_ms();
        self.editor
            .paginator_mut()
            .set_page_size(key, now)
            .map_err(Error::from)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config_json: &str) -> Result<(), JsError> {
        let config = parse_config(config_json)?;
        let now = self.clock.now_ms();
        self.editor
            .paginator_mut()
            .set_config(config, now)
            .map_err(Error::from)?;
        Ok(())
    }

    /// Committed pagination state as JSON, `null` before the first pass
    pub fn state(&self) -> Result<String, JsError> {
        Ok(to_json(&self.editor.paginator().state())?)
    }

    #[wasm_bindgen(js_name = totalPages)]
    pub fn total_pages(&self) -> u32 {
        self.editor.paginator().total_pages()
    }

    #[wasm_bindgen(js_name = pageForPosition)]
    pub fn page_for_position(&self, position: u32) -> u32 {
        self.editor.paginator().page_for_position(position as usize)
    }

    /// Scroll target of a page
    #[wasm_bindgen(js_name = pageStart)]
    pub fn page_start(&self, page_number: u32) -> Option<u32> {
        self.editor
            .paginator()
            .page_start(page_number)
            .map(|pos| pos as u32)
    }

    #[wasm_bindgen(js_name = pageRanges)]
    pub fn page_ranges(&self) -> Result<String, JsError> {
        Ok(to_json(&self.editor.paginator().page_ranges())?)
    }

    #[wasm_bindgen(js_name = containerMinHeight)]
    pub fn container_min_height(&self) -> f32 {
        self.editor.paginator().container_min_height()
    }

    pub fn geometry(&self) -> Result<String, JsError> {
        Ok(to_json(self.editor.paginator().geometry())?)
    }

    /// Overlay markup as a JSON array of `{ key, html }`
    #[wasm_bindgen(js_name = overlayHtml)]
    pub fn overlay_html(&self) -> Result<String, JsError> {
        let rendered = render_overlay(self.editor.paginator().overlay());
        let keyed: Vec<KeyedMarkup<'_>> = rendered
            .iter()
            .map(|(key, html)| KeyedMarkup { key, html })
            .collect();
        Ok(to_json(&keyed)?)
    }

    #[wasm_bindgen(js_name = printCss)]
    pub fn print_css() -> String {
        PRINT_CSS.to_string()
    }

    /// Encode the current overlay into the flat buffer
    #[wasm_bindgen(js_name = writeOverlayBuffer)]
    pub fn write_overlay_buffer(&mut self) {
        let paginator = self.editor.paginator();
        self.buffer
            .write_overlay(paginator.overlay(), paginator.total_pages());
    }

    #[wasm_bindgen(js_name = overlayU32Ptr)]
    pub fn overlay_u32_ptr(&self) -> u32 {
        self.buffer.u32_ptr()
    }

    #[wasm_bindgen(js_name = overlayU32Len)]
    pub fn overlay_u32_len(&self) -> u32 {
        self.buffer.u32_len()
    }

    #[wasm_bindgen(js_name = overlayF32Ptr)]
    pub fn overlay_f32_ptr(&self) -> u32 {
        self.buffer.f32_ptr()
    }

    #[wasm_bindgen(js_name = overlayF32Len)]
    pub fn overlay_f32_len(&self) -> u32 {
        self.buffer.f32_len()
    }

    /// Document content as HTML, without overlays
    #[wasm_bindgen(js_name = serializeDocument)]
    pub fn serialize_document(&self) -> String {
        self.editor.serialize()
    }

    /// Remove overlay markup from HTML captured from the editor surface
    #[wasm_bindgen(js_name = sanitizeMarkup)]
    pub fn sanitize_markup(&self, markup: &str) -> Result<String, JsError> {
        Ok(strip_overlays(markup).map_err(Error::from)?)
    }
}
