//! Markup serialization at the persistence boundary
//!
//! `to_html` writes document content only. `strip_overlays` removes any
//! pagination overlay that leaked into markup captured from a rendered
//! surface before it is stored or exported.

use super::{Block, BlockContent, BlockKind, Document};
use crate::error::SerializeError;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::fmt::Write as _;

/// Attribute carried by the root element of every overlay artifact
pub const OVERLAY_ATTR: &str = "data-pagination-overlay";

/// Root classes of overlay artifacts, also matched without the attribute
pub const OVERLAY_CLASSES: &[&str] = &[
    "page-break-widget",
    "page-break-container",
    "page-footer-final",
    "page-indicator",
];

const WRAPPER: &str = "page-flow-fragment";

/// Serialize document content as HTML
pub fn to_html(document: &Document) -> String {
    let mut out = String::new();
    for block in document.blocks() {
        write_block(&mut out, block);
    }
    out
}

fn write_block(out: &mut String, block: &Block) {
    let _ = match (&block.kind, &block.content) {
        (BlockKind::Heading { level }, BlockContent::Text(text)) => {
            write!(out, "<h{level}>{}</h{level}>", escape(text.as_str()))
        }
        (BlockKind::Blockquote, BlockContent::Text(text)) => {
            write!(out, "<blockquote><p>{}</p></blockquote>", escape(text.as_str()))
        }
        (BlockKind::CodeBlock, BlockContent::Text(text)) => {
            write!(out, "<pre><code>{}</code></pre>", escape(text.as_str()))
        }
        (BlockKind::Other { name }, BlockContent::Text(text)) => write!(
            out,
            "<div data-type=\"{}\">{}</div>",
            escape(name.as_str()),
            escape(text.as_str())
        ),
        (_, BlockContent::Text(text)) => write!(out, "<p>{}</p>", escape(text.as_str())),
        (kind, BlockContent::Items(items)) => {
            let (open, close, item_open) = match kind {
                BlockKind::OrderedList => ("<ol>", "</ol>", "<li>"),
                BlockKind::TaskList => (
                    "<ul data-type=\"taskList\">",
                    "</ul>",
                    "<li data-type=\"taskItem\">",
                ),
                _ => ("<ul>", "</ul>", "<li>"),
            };
            out.push_str(open);
            for item in items {
                let _ = write!(out, "{item_open}<p>{}</p></li>", escape(item.as_str()));
            }
            out.push_str(close);
            Ok(())
        }
        (_, BlockContent::Rows(rows)) => {
            out.push_str("<table><tbody>");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    let _ = write!(out, "<td><p>{}</p></td>", escape(cell.as_str()));
                }
                out.push_str("</tr>");
            }
            out.push_str("</tbody></table>");
            Ok(())
        }
        (_, BlockContent::Empty) => {
            out.push_str("<hr/>");
            Ok(())
        }
    };
}

fn is_overlay(start: &BytesStart<'_>) -> bool {
    start.attributes().flatten().any(|attr| {
        let key = attr.key.as_ref();
        if key == OVERLAY_ATTR.as_bytes() {
            return true;
        }
        key == b"class"
            && std::str::from_utf8(&attr.value)
                .map(|classes| {
                    classes
                        .split_whitespace()
                        .any(|class| OVERLAY_CLASSES.contains(&class))
                })
                .unwrap_or(false)
    })
}

/// Remove every overlay subtree from an HTML fragment
pub fn strip_overlays(markup: &str) -> Result<String, SerializeError> {
    let wrapped = format!("<{WRAPPER}>{markup}</{WRAPPER}>");
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut writer = Writer::new(Vec::with_capacity(markup.len()));
    // Tag name of the overlay root being skipped and how many same-named
    // elements are open below it. Other elements inside the overlay are
    // ignored, so void elements without an end tag cannot unbalance it.
    let mut skipping: Option<(Vec<u8>, usize)> = None;
    let mut stripped = 0usize;

    loop {
        let event = reader.read_event().map_err(|err| SerializeError::Markup {
            position: reader.buffer_position() as u64,
            message: err.to_string(),
        })?;

        match &event {
            Event::Eof => break,
            Event::Start(start) => {
                if let Some((root, depth)) = skipping.as_mut() {
                    if start.name().as_ref() == root.as_slice() {
                        *depth += 1;
                    }
                    continue;
                }
                if is_overlay(start) {
                    skipping = Some((start.name().as_ref().to_vec(), 0));
                    stripped += 1;
                    continue;
                }
                if start.name().as_ref() == WRAPPER.as_bytes() {
                    continue;
                }
            }
            Event::End(end) => {
                if end.name().as_ref() == WRAPPER.as_bytes() {
                    skipping = None;
                    continue;
                }
                if let Some((root, depth)) = skipping.as_mut() {
                    if end.name().as_ref() == root.as_slice() {
                        if *depth == 0 {
                            skipping = None;
                        } else {
                            *depth -= 1;
                        }
                    }
                    continue;
                }
            }
            Event::Empty(start) => {
                if skipping.is_some() {
                    continue;
                }
                if is_overlay(start) {
                    stripped += 1;
                    continue;
                }
            }
            _ if skipping.is_some() => continue,
            _ => {}
        }

        writer
            .write_event(event)
            .map_err(|err| SerializeError::Write(err.to_string()))?;
    }

    if stripped > 0 {
        log::warn!("Stripped {} pagination overlay(s) from serialized markup", stripped);
    }

    String::from_utf8(writer.into_inner()).map_err(|err| SerializeError::Write(err.to_string()))
}

/// Check whether markup still carries overlay markers
pub fn contains_overlay_markers(markup: &str) -> bool {
    markup.contains(OVERLAY_ATTR) || OVERLAY_CLASSES.iter().any(|class| markup.contains(class))
}
