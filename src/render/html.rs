//! HTML rendering of overlay artifacts for DOM hosts

use crate::document::serialize::OVERLAY_ATTR;
use crate::render::overlay::{OverlayArtifact, OverlaySet};
use std::fmt::Write as _;

/// Print stylesheet: page boundaries become real page breaks and overlay
/// chrome is hidden.
pub const PRINT_CSS: &str = "@media print {
  .page-indicator, .page-gap, .page-header-space, .page-spacer { display: none !important; }
  .page-footer { display: none !important; }
  .page-break-widget { break-after: page; page-break-after: always; height: 0; }
}
";

fn open(out: &mut String, classes: &str, page: u32) {
    let _ = write!(
        out,
        "<div class=\"{classes}\" {OVERLAY_ATTR}=\"true\" contenteditable=\"false\" data-page=\"{page}\">"
    );
}

fn spacer(out: &mut String, class: &str, height: f32) {
    let _ = write!(out, "<div class=\"{class}\" style=\"height: {height}px\"></div>");
}

fn footer(out: &mut String, page: u32, height: Option<f32>) {
    match height {
        Some(h) => {
            let _ = write!(out, "<div class=\"page-footer\" style=\"height: {h}px\">");
        }
        None => out.push_str("<div class=\"page-footer\">"),
    }
    let _ = write!(out, "<span class=\"page-number\">{page}</span></div>");
}

/// Markup for a single artifact
pub fn render_artifact(artifact: &OverlayArtifact) -> String {
    let mut out = String::with_capacity(256);
    match artifact {
        OverlayArtifact::PageIndicator { page, .. } => {
            open(&mut out, "page-indicator", *page);
            let _ = write!(out, "<span class=\"page-badge\">Page {page}</span>");
        }
        OverlayArtifact::PageBreak {
            ending_page,
            next_page,
            footer_fill,
            gap,
            header_space,
            ..
        } => {
            open(&mut out, "page-break-widget page-break-container", *next_page);
            footer(&mut out, *ending_page, Some(*footer_fill));
            spacer(&mut out, "page-gap", *gap);
            spacer(&mut out, "page-header-space", *header_space);
        }
        OverlayArtifact::FinalFooter { page, spacer: fill, .. } => {
            open(&mut out, "page-footer-final", *page);
            if let Some(height) = fill {
                spacer(&mut out, "page-spacer", *height);
            }
            footer(&mut out, *page, None);
        }
    }
    out.push_str("</div>");
    out
}

/// Keyed markup for every artifact of a set, in anchor order
pub fn render_overlay(overlay: &OverlaySet) -> Vec<(String, String)> {
    overlay
        .iter()
        .map(|artifact| (artifact.key().to_string(), render_artifact(artifact)))
        .collect()
}
