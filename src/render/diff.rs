//! Keyed diff between consecutive overlay sets

use crate::render::overlay::{ArtifactKey, OverlayArtifact, OverlaySet};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A single patch operation for the host renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum OverlayPatch {
    /// Render a new artifact
    Insert { artifact: OverlayArtifact },
    /// Replace an artifact that moved or resized
    Update {
        key: String,
        artifact: OverlayArtifact,
    },
    /// Remove an artifact
    Remove { key: String },
}

/// Complete overlay diff to send to the renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayDiff {
    pub revision: u64,
    pub patches: Vec<OverlayPatch>,
}

impl OverlayDiff {
    pub fn new(revision: u64) -> Self {
        Self {
            revision,
            patches: Vec::new(),
        }
    }

    pub fn add_patch(&mut self, patch: OverlayPatch) {
        self.patches.push(patch);
    }

    pub fn has_patches(&self) -> bool {
        !self.patches.is_empty()
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }
}

/// Remembers the last committed overlay and computes patches against it
#[derive(Debug, Default)]
pub struct DiffEngine {
    previous: OverlaySet,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay the renderer currently shows
    pub fn previous(&self) -> &OverlaySet {
        &self.previous
    }

    /// Forget the rendered overlay, so the next diff inserts everything
    pub fn reset(&mut self) {
        self.previous = OverlaySet::default();
    }

    /// Replace the remembered overlay without producing patches
    pub fn rebase(&mut self, overlay: OverlaySet) {
        self.previous = overlay;
    }

    /// Diff `current` against the previous overlay and remember it
    pub fn compute_diff(&mut self, current: &OverlaySet) -> OverlayDiff {
        let diff = diff_overlays(&self.previous, current);
        self.previous = current.clone();
        diff
    }
}

/// Patches turning `previous` into `current`, removals first
pub fn diff_overlays(previous: &OverlaySet, current: &OverlaySet) -> OverlayDiff {
    let mut diff = OverlayDiff::new(current.revision);

    let prev_items: FxHashMap<ArtifactKey, &OverlayArtifact> =
        previous.iter().map(|a| (a.key(), a)).collect();
    let curr_items: FxHashMap<ArtifactKey, &OverlayArtifact> =
        current.iter().map(|a| (a.key(), a)).collect();

    for artifact in previous.iter() {
        let key = artifact.key();
        if !curr_items.contains_key(&key) {
            diff.add_patch(OverlayPatch::Remove {
                key: key.to_string(),
            });
        }
    }

    for artifact in current.iter() {
        let key = artifact.key();
        match prev_items.get(&key) {
            None => diff.add_patch(OverlayPatch::Insert {
                artifact: artifact.clone(),
            }),
            Some(prev) if *prev != artifact => diff.add_patch(OverlayPatch::Update {
                key: key.to_string(),
                artifact: artifact.clone(),
            }),
            Some(_) => {}
        }
    }

    diff
}
