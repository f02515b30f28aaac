//! Page geometry, block measurement, break calculation and the pagination engine

pub mod breaks;
mod engine;
pub mod geometry;
pub mod measure;
pub mod metrics;
mod pagination;

pub use breaks::{calculate_breaks, MeasuredBlock, PageBreaks};
pub use engine::{FrameOutcome, OverlayCommit, Paginator, PaginatorConfig};
pub use geometry::{PageConfig, PageGeometry, PageSize, Resolved};
pub use measure::{
    measure_document, BlockBox, HeightMeasurer, HeuristicMeasurer, LayoutSurface,
    MeasureStrategy, RenderedMeasurer, SnapshotSurface,
};
pub use metrics::EstimateMetrics;
pub use pagination::{page_for_position, BreakPoint, PageRange, PaginationState};
