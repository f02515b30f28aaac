//! Edit steps and transactions

use crate::document::Block;
use serde::{Deserialize, Serialize};

/// An atomic edit step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    /// Insert a block before the block at `index` (or append at the end)
    InsertBlock { index: usize, block: Block },
    /// Remove the block at `index`
    RemoveBlock { index: usize },
    /// Replace the block at `index` wholesale
    ReplaceBlock { index: usize, block: Block },
    /// Insert text at a position inside a text block
    InsertText { pos: usize, text: String },
    /// Delete the text between two positions of the same text block
    DeleteText { from: usize, to: usize },
}

impl Step {
    pub fn insert_text(pos: usize, text: impl Into<String>) -> Self {
        Self::InsertText {
            pos,
            text: text.into(),
        }
    }

    pub fn delete_text(from: usize, to: usize) -> Self {
        Self::DeleteText { from, to }
    }
}

/// An ordered group of steps applied atomically
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub steps: Vec<Step>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn insert_block(self, index: usize, block: Block) -> Self {
        self.step(Step::InsertBlock { index, block })
    }

    pub fn remove_block(self, index: usize) -> Self {
        self.step(Step::RemoveBlock { index })
    }

    pub fn replace_block(self, index: usize, block: Block) -> Self {
        self.step(Step::ReplaceBlock { index, block })
    }

    pub fn insert_text(self, pos: usize, text: impl Into<String>) -> Self {
        self.step(Step::insert_text(pos, text))
    }

    pub fn delete_text(self, from: usize, to: usize) -> Self {
        self.step(Step::delete_text(from, to))
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
