//! Document model: ordered top-level blocks in a shared position space

mod block;
pub mod serialize;

pub use block::{Block, BlockContent, BlockKind};

use crate::editing::{Mapping, Step, StepMap, Transaction};
use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

/// The document tree as seen by the pagination engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Top-level blocks in document order
    blocks: Vec<Block>,
    /// Monotonic revision counter, bumped by every applied transaction
    #[serde(default)]
    revision: u64,
}

/// A committed transition between two document snapshots
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub before: Document,
    pub after: Document,
    /// Maps positions of `before` onto `after`; valid for this transition only
    pub mapping: Mapping,
}

impl DocumentChange {
    /// Whether the content actually differs between the two snapshots
    pub fn doc_changed(&self) -> bool {
        self.before.blocks != self.after.blocks
    }
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from initial blocks
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks, revision: 0 }
    }

    /// Get the document revision
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Size of the whole position space; also the document end position
    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(Block::node_size).sum()
    }

    /// Iterate over `(position, block)` pairs in document order
    pub fn positions(&self) -> impl Iterator<Item = (usize, &Block)> + '_ {
        self.blocks.iter().scan(0usize, |pos, block| {
            let start = *pos;
            *pos += block.node_size();
            Some((start, block))
        })
    }

    /// Start position of the block at `index` (document end for `len()`)
    pub fn block_start(&self, index: usize) -> Option<usize> {
        if index > self.blocks.len() {
            return None;
        }
        Some(block_start(&self.blocks, index))
    }

    /// Index and start position of the top-level block covering `pos`
    pub fn block_at(&self, pos: usize) -> Option<(usize, usize)> {
        self.positions()
            .enumerate()
            .find(|(_, (start, block))| pos >= *start && pos < start + block.node_size())
            .map(|(index, (start, _))| (index, start))
    }

    /// Apply a transaction atomically.
    ///
    /// On error the document is left unchanged. A non-empty transaction
    /// bumps the revision even when it leaves the content identical.
    pub fn apply(&mut self, transaction: &Transaction) -> Result<DocumentChange, DocumentError> {
        let mut blocks = self.blocks.clone();
        let mut mapping = Mapping::new();

        for step in &transaction.steps {
            mapping.push(apply_step(&mut blocks, step)?);
        }

        let before = self.clone();
        if !transaction.is_empty() {
            self.blocks = blocks;
            self.revision += 1;
        }

        Ok(DocumentChange {
            before,
            after: self.clone(),
            mapping,
        })
    }

    /// Serialize the persisted content as HTML markup
    pub fn to_html(&self) -> String {
        serialize::to_html(self)
    }
}

fn block_start(blocks: &[Block], index: usize) -> usize {
    blocks[..index].iter().map(Block::node_size).sum()
}

/// Locate the text block whose inline content contains `pos`.
/// Returns `(index, block start)`.
fn text_block_at(blocks: &[Block], pos: usize) -> Option<(usize, usize)> {
    let mut start = 0;
    for (index, block) in blocks.iter().enumerate() {
        let size = block.node_size();
        if pos > start && pos < start + size {
            return block.text().map(|_| (index, start));
        }
        start += size;
    }
    None
}

fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

fn apply_step(blocks: &mut Vec<Block>, step: &Step) -> Result<StepMap, DocumentError> {
    let len = blocks.len();
    let out_of_bounds = |index| DocumentError::BlockIndexOutOfBounds { index, len };

    match step {
        Step::InsertBlock { index, block } => {
            if *index > len {
                return Err(out_of_bounds(*index));
            }
            let start = block_start(blocks, *index);
            blocks.insert(*index, block.clone());
            Ok(StepMap::new(start, 0, block.node_size()))
        }
        Step::RemoveBlock { index } => {
            if *index >= len {
                return Err(out_of_bounds(*index));
            }
            let start = block_start(blocks, *index);
            let removed = blocks.remove(*index);
            Ok(StepMap::new(start, removed.node_size(), 0))
        }
        Step::ReplaceBlock { index, block } => {
            if *index >= len {
                return Err(out_of_bounds(*index));
            }
            let start = block_start(blocks, *index);
            let old_size = blocks[*index].node_size();
            blocks[*index] = block.clone();
            Ok(StepMap::new(start, old_size, block.node_size()))
        }
        Step::InsertText { pos, text } => {
            let (index, start) = text_block_at(blocks, *pos).ok_or(DocumentError::NotInText(*pos))?;
            let content = blocks[index]
                .text_mut()
                .ok_or(DocumentError::NotInText(*pos))?;
            let at = char_to_byte(content, pos - start - 1);
            content.insert_str(at, text);
            Ok(StepMap::new(*pos, 0, text.chars().count()))
        }
        Step::DeleteText { from, to } => {
            let invalid = DocumentError::InvalidRange {
                from: *from,
                to: *to,
            };
            if from > to {
                return Err(invalid);
            }
            let (index, start) = text_block_at(blocks, *from).ok_or(invalid.clone())?;
            let end = start + blocks[index].node_size() - 1;
            if *to > end {
                return Err(invalid);
            }
            let content = blocks[index].text_mut().ok_or(invalid)?;
            let from_byte = char_to_byte(content, from - start - 1);
            let to_byte = char_to_byte(content, to - start - 1);
            content.replace_range(from_byte..to_byte, "");
            Ok(StepMap::new(*from, to - from, 0))
        }
    }
}
