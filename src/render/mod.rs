//! Render output: overlay artifacts, keyed diffs and HTML markup

mod diff;
pub mod html;
mod overlay;

pub use diff::{diff_overlays, DiffEngine, OverlayDiff, OverlayPatch};
pub use html::{render_artifact, render_overlay, PRINT_CSS};
pub use overlay::{project, ArtifactKey, ArtifactKind, OverlayArtifact, OverlaySet};
