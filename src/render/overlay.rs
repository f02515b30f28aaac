//! Overlay artifacts: presentation-only descriptors for page boundaries

use crate::editing::{Assoc, Mapping};
use crate::layout::{PageBreaks, PageGeometry};
use serde::Serialize;
use std::fmt;

/// Kind of an overlay artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    PageIndicator,
    PageBreak,
    FinalFooter,
}

/// Stable identity of an artifact across passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactKey {
    pub kind: ArtifactKind,
    pub page: u32,
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ArtifactKind::PageIndicator => write!(f, "page-{}-indicator", self.page),
            ArtifactKind::PageBreak => write!(f, "page-break-{}", self.page),
            ArtifactKind::FinalFooter => write!(f, "page-{}-final", self.page),
        }
    }
}

/// An artifact to render next to document content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OverlayArtifact {
    /// Badge for the first page, at the document start
    PageIndicator { anchor: usize, page: u32 },
    /// End of `ending_page` and start of `next_page`
    #[serde(rename_all = "camelCase")]
    PageBreak {
        anchor: usize,
        ending_page: u32,
        next_page: u32,
        /// Unused content height of the ending page plus its bottom margin
        footer_fill: f32,
        gap: f32,
        /// Top margin of the next page
        header_space: f32,
    },
    /// Footer of the last page, at the document end
    FinalFooter {
        anchor: usize,
        page: u32,
        /// Pads a sparse last page to full height
        spacer: Option<f32>,
    },
}

impl OverlayArtifact {
    pub fn key(&self) -> ArtifactKey {
        match self {
            OverlayArtifact::PageIndicator { page, .. } => ArtifactKey {
                kind: ArtifactKind::PageIndicator,
                page: *page,
            },
            OverlayArtifact::PageBreak { next_page, .. } => ArtifactKey {
                kind: ArtifactKind::PageBreak,
                page: *next_page,
            },
            OverlayArtifact::FinalFooter { page, .. } => ArtifactKey {
                kind: ArtifactKind::FinalFooter,
                page: *page,
            },
        }
    }

    pub fn anchor(&self) -> usize {
        match self {
            OverlayArtifact::PageIndicator { anchor, .. }
            | OverlayArtifact::PageBreak { anchor, .. }
            | OverlayArtifact::FinalFooter { anchor, .. } => *anchor,
        }
    }

    /// Side of the anchor the artifact sticks to when content is inserted there
    pub fn assoc(&self) -> Assoc {
        match self {
            OverlayArtifact::FinalFooter { .. } => Assoc::After,
            _ => Assoc::Before,
        }
    }

    fn with_anchor(&self, pos: usize) -> Self {
        let mut artifact = self.clone();
        match &mut artifact {
            OverlayArtifact::PageIndicator { anchor, .. }
            | OverlayArtifact::PageBreak { anchor, .. }
            | OverlayArtifact::FinalFooter { anchor, .. } => *anchor = pos,
        }
        artifact
    }
}

/// The complete overlay for one document revision
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySet {
    /// Revision the anchors are valid for
    pub revision: u64,
    pub artifacts: Vec<OverlayArtifact>,
}

impl OverlaySet {
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayArtifact> {
        self.artifacts.iter()
    }

    /// Number of page-break artifacts
    pub fn break_count(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|a| matches!(a, OverlayArtifact::PageBreak { .. }))
            .count()
    }

    /// Carry the set across an edit. Artifacts whose anchor was deleted are dropped.
    pub fn map(&self, mapping: &Mapping, revision: u64) -> OverlaySet {
        let artifacts = self
            .artifacts
            .iter()
            .filter_map(|artifact| {
                let result = mapping.map_result(artifact.anchor(), artifact.assoc());
                (!result.deleted).then(|| artifact.with_anchor(result.pos))
            })
            .collect();
        OverlaySet {
            revision,
            artifacts,
        }
    }
}

/// Turn computed breaks into overlay artifacts for `revision`
pub fn project(
    page_breaks: &PageBreaks,
    geometry: &PageGeometry,
    doc_end: usize,
    revision: u64,
) -> OverlaySet {
    let mut artifacts = Vec::with_capacity(page_breaks.breaks.len() + 2);

    artifacts.push(OverlayArtifact::PageIndicator { anchor: 0, page: 1 });

    for bp in &page_breaks.breaks {
        let unused = (geometry.content_height - bp.filled_height).max(0.0);
        artifacts.push(OverlayArtifact::PageBreak {
            anchor: bp.position,
            ending_page: bp.page_number,
            next_page: bp.page_number + 1,
            footer_fill: unused + geometry.margin_bottom,
            gap: geometry.page_gap,
            header_space: geometry.margin_top,
        });
    }

    artifacts.push(OverlayArtifact::FinalFooter {
        anchor: doc_end,
        page: page_breaks.total_pages,
        spacer: (page_breaks.remaining_height > 0.0).then_some(page_breaks.remaining_height),
    });

    OverlaySet {
        revision,
        artifacts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::StepMap;
    use crate::layout::BreakPoint;

    fn two_pages() -> PageBreaks {
        PageBreaks {
            breaks: vec![BreakPoint {
                position: 40,
                page_number: 1,
                filled_height: 900.0,
            }],
            total_pages: 2,
            remaining_height: 331.0,
        }
    }

    #[test]
    fn test_project_two_pages() {
        let geometry = PageGeometry::default();
        let set = project(&two_pages(), &geometry, 60, 3);

        assert_eq!(set.revision, 3);
        assert_eq!(set.len(), 3);
        assert_eq!(set.break_count(), 1);
        assert_eq!(
            set.artifacts[1],
            OverlayArtifact::PageBreak {
                anchor: 40,
                ending_page: 1,
                next_page: 2,
                footer_fill: 31.0 + 96.0,
                gap: 24.0,
                header_space: 96.0,
            }
        );
        assert_eq!(
            set.artifacts[2],
            OverlayArtifact::FinalFooter {
                anchor: 60,
                page: 2,
                spacer: Some(331.0),
            }
        );
    }

    #[test]
    fn test_full_last_page_has_no_spacer() {
        let breaks = PageBreaks {
            breaks: Vec::new(),
            total_pages: 1,
            remaining_height: 0.0,
        };
        let set = project(&breaks, &PageGeometry::default(), 10, 1);
        assert!(matches!(
            set.artifacts.last(),
            Some(OverlayArtifact::FinalFooter { spacer: None, .. })
        ));
    }

    #[test]
    fn test_keys() {
        let set = project(&two_pages(), &PageGeometry::default(), 60, 3);
        let keys: Vec<_> = set.iter().map(|a| a.key().to_string()).collect();
        assert_eq!(keys, vec!["page-1-indicator", "page-break-2", "page-2-final"]);
    }

    #[test]
    fn test_map_through_edit() {
        let set = project(&two_pages(), &PageGeometry::default(), 60, 3);

        // Five characters typed at position 10
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(10, 0, 5));
        let mapped = set.map(&mapping, 4);
        assert_eq!(mapped.revision, 4);
        assert_eq!(mapped.artifacts[0].anchor(), 0);
        assert_eq!(mapped.artifacts[1].anchor(), 45);
        assert_eq!(mapped.artifacts[2].anchor(), 65);

        // Typing at the very end keeps the final footer at the end
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(60, 0, 3));
        assert_eq!(set.map(&mapping, 4).artifacts[2].anchor(), 63);
    }

    #[test]
    fn test_map_drops_deleted_anchors() {
        let set = project(&two_pages(), &PageGeometry::default(), 60, 3);
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(30, 20, 0));
        let mapped = set.map(&mapping, 4);
        assert_eq!(mapped.break_count(), 0);
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped.artifacts[1].anchor(), 40);
    }
}
