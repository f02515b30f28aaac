//! Top-level block nodes

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// The kind of a top-level block.
///
/// Serialized as `{"type": "<node name>"}` plus `level` for headings. Node
/// types without a dedicated variant load as [`BlockKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawKind", into = "RawKind")]
pub enum BlockKind {
    /// Regular paragraph
    Paragraph,
    /// Heading with level (1-6)
    Heading { level: u8 },
    BulletList,
    OrderedList,
    TaskList,
    Table,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    /// Any node type the engine has no dedicated rule for
    Other { name: String },
}

/// Wire shape of [`BlockKind`]
#[derive(Serialize, Deserialize)]
struct RawKind {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<RawKind> for BlockKind {
    fn from(raw: RawKind) -> Self {
        let RawKind {
            node_type,
            level,
            name,
        } = raw;
        match node_type.as_str() {
            "paragraph" => BlockKind::Paragraph,
            "heading" => BlockKind::Heading {
                level: level.unwrap_or(1).clamp(1, 6),
            },
            "bulletList" => BlockKind::BulletList,
            "orderedList" => BlockKind::OrderedList,
            "taskList" => BlockKind::TaskList,
            "table" => BlockKind::Table,
            "blockquote" => BlockKind::Blockquote,
            "codeBlock" => BlockKind::CodeBlock,
            "horizontalRule" => BlockKind::HorizontalRule,
            // `{"type": "other", "name": "image"}` names the node explicitly
            "other" if name.is_some() => BlockKind::Other {
                name: name.unwrap_or_default(),
            },
            _ => BlockKind::Other { name: node_type },
        }
    }
}

impl From<BlockKind> for RawKind {
    fn from(kind: BlockKind) -> Self {
        let level = match kind {
            BlockKind::Heading { level } => Some(level),
            _ => None,
        };
        let node_type = match kind {
            BlockKind::Other { name } => name,
            other => other.name().to_string(),
        };
        RawKind {
            node_type,
            level,
            name: None,
        }
    }
}

impl BlockKind {
    /// Node type name as the host framework spells it
    pub fn name(&self) -> &str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading { .. } => "heading",
            BlockKind::BulletList => "bulletList",
            BlockKind::OrderedList => "orderedList",
            BlockKind::TaskList => "taskList",
            BlockKind::Table => "table",
            BlockKind::Blockquote => "blockquote",
            BlockKind::CodeBlock => "codeBlock",
            BlockKind::HorizontalRule => "horizontalRule",
            BlockKind::Other { name } => name,
        }
    }

    /// Check if this is a heading
    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::Heading { .. })
    }

    /// Check if this is any kind of list
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            BlockKind::BulletList | BlockKind::OrderedList | BlockKind::TaskList
        )
    }
}

/// Content carried by a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockContent {
    /// Inline text (paragraphs, headings, quotes, code)
    Text(String),
    /// One text per list item
    Items(Vec<String>),
    /// Table rows of cell texts
    Rows(Vec<Vec<String>>),
    /// Leaf node without content
    Empty,
}

/// A top-level block of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub content: BlockContent,
}

impl Block {
    pub fn new(kind: BlockKind, content: BlockContent) -> Self {
        Self { kind, content }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, BlockContent::Text(text.into()))
    }

    /// Create a heading, clamping the level to 1-6
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(
            BlockKind::Heading {
                level: level.clamp(1, 6),
            },
            BlockContent::Text(text.into()),
        )
    }

    pub fn bullet_list<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::new(BlockKind::BulletList, Self::items(items))
    }

    pub fn ordered_list<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::new(BlockKind::OrderedList, Self::items(items))
    }

    pub fn task_list<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::new(BlockKind::TaskList, Self::items(items))
    }

    pub fn table(rows: Vec<Vec<String>>) -> Self {
        Self::new(BlockKind::Table, BlockContent::Rows(rows))
    }

    pub fn blockquote(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Blockquote, BlockContent::Text(text.into()))
    }

    pub fn code_block(text: impl Into<String>) -> Self {
        Self::new(BlockKind::CodeBlock, BlockContent::Text(text.into()))
    }

    pub fn horizontal_rule() -> Self {
        Self::new(BlockKind::HorizontalRule, BlockContent::Empty)
    }

    pub fn other(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(
            BlockKind::Other { name: name.into() },
            BlockContent::Text(text.into()),
        )
    }

    fn items<S: Into<String>>(items: impl IntoIterator<Item = S>) -> BlockContent {
        BlockContent::Items(items.into_iter().map(Into::into).collect())
    }

    /// Size of this node in the document's position space
    pub fn node_size(&self) -> usize {
        match &self.content {
            BlockContent::Text(text) => text.chars().count() + 2,
            // list > listItem > paragraph
            BlockContent::Items(items) => {
                2 + items.iter().map(|t| t.chars().count() + 4).sum::<usize>()
            }
            // table > row > cell > paragraph
            BlockContent::Rows(rows) => {
                2 + rows
                    .iter()
                    .map(|row| 2 + row.iter().map(|c| c.chars().count() + 4).sum::<usize>())
                    .sum::<usize>()
            }
            BlockContent::Empty => 1,
        }
    }

    /// Inline text, if this block holds text directly
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            BlockContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn text_mut(&mut self) -> Option<&mut String> {
        match &mut self.content {
            BlockContent::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Visible text length in grapheme clusters, over all content
    pub fn text_len(&self) -> usize {
        match &self.content {
            BlockContent::Text(text) => grapheme_len(text),
            BlockContent::Items(items) => items.iter().map(|t| grapheme_len(t)).sum(),
            BlockContent::Rows(rows) => rows.iter().flatten().map(|t| grapheme_len(t)).sum(),
            BlockContent::Empty => 0,
        }
    }

    /// Grapheme length of each list item (empty for non-lists)
    pub fn item_lens(&self) -> impl Iterator<Item = usize> + '_ {
        let items: &[String] = match &self.content {
            BlockContent::Items(items) => items,
            _ => &[],
        };
        items.iter().map(|t| grapheme_len(t))
    }

    /// Number of table rows (zero for non-tables)
    pub fn row_count(&self) -> usize {
        match &self.content {
            BlockContent::Rows(rows) => rows.len(),
            _ => 0,
        }
    }
}

pub(crate) fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}
