//! Error types shared across the engine

use thiserror::Error;

/// Invalid page configuration, surfaced when the configuration is resolved
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown page size '{0}' and no explicit width/height given.")]
    UnknownPageSize(String),
    #[error("Content height {content_height:.2} is not positive (page height {page_height:.2}, margins {margin_top:.2}/{margin_bottom:.2}).")]
    NonPositiveContentHeight {
        content_height: f32,
        page_height: f32,
        margin_top: f32,
        margin_bottom: f32,
    },
    #[error("Content width {0:.2} is not positive.")]
    NonPositiveContentWidth(f32),
    #[error("Margin '{name}' is negative or not finite: {value}")]
    InvalidMargin { name: &'static str, value: f32 },
}

/// Measurement failures. All of them are recoverable by the scheduler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    #[error("Layout surface has not settled yet.")]
    Unavailable,
}

/// Rejected document transactions. The document is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Block index {index} is out of bounds (document has {len} blocks).")]
    BlockIndexOutOfBounds { index: usize, len: usize },
    #[error("Position {0} is not inside the text of a block.")]
    NotInText(usize),
    #[error("Range {from}..{to} does not lie within a single text block.")]
    InvalidRange { from: usize, to: usize },
}

/// Markup that could not be scanned at the serialization boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializeError {
    #[error("Malformed markup at byte {position}: {message}")]
    Markup { position: u64, message: String },
    #[error("Failed to write markup: {0}")]
    Write(String),
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Measure(#[from] MeasureError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
