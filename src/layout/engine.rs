//! Pagination engine driving measurement, break calculation and overlay commits

use crate::document::{Document, DocumentChange};
use crate::error::{ConfigError, MeasureError};
use crate::layout::breaks::{calculate_breaks, MeasuredBlock};
use crate::layout::geometry::{PageConfig, PageGeometry};
use crate::layout::measure::{
    measure_document, HeuristicMeasurer, LayoutSurface, MeasureStrategy, RenderedMeasurer,
};
use crate::layout::metrics::EstimateMetrics;
use crate::layout::pagination::{page_for_position, PageRange, PaginationState};
use crate::render::{project, DiffEngine, OverlayDiff, OverlaySet};
use crate::scheduler::{Scheduler, SchedulerAction, SchedulerConfig, SchedulerState};
use serde::{Deserialize, Serialize};

/// Everything the host can configure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginatorConfig {
    pub page: PageConfig,
    pub strategy: MeasureStrategy,
    pub scheduler: SchedulerConfig,
    pub estimate: EstimateMetrics,
}

/// A committed overlay replacement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayCommit {
    pub revision: u64,
    pub total_pages: u32,
    /// Patches from the previously committed overlay
    pub diff: OverlayDiff,
    /// Pagination commits never enter undo history
    pub add_to_history: bool,
}

/// Result of handing a layout frame to the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum FrameOutcome {
    /// Breaks changed and a new overlay was committed
    Committed(OverlayCommit),
    /// Breaks equal the committed ones within tolerance
    Unchanged { revision: u64 },
    /// The frame was for an outdated revision; a fresh pass is pending
    Discarded { stale: u64, current: u64 },
    /// Surface not settled; waiting for another frame
    Deferred { attempts: u32 },
    /// No pass was in flight
    NotRequested,
}

impl FrameOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, FrameOutcome::Committed(_))
    }
}

/// Owns pagination state and the overlay for one editor
pub struct Paginator {
    config: PaginatorConfig,
    geometry: PageGeometry,
    heuristic: HeuristicMeasurer,
    scheduler: Scheduler,
    state: Option<PaginationState>,
    /// Current overlay, mapped across edits since the last commit
    overlay: OverlaySet,
    diff_engine: DiffEngine,
    doc_end: usize,
}

impl Paginator {
    /// Create an engine. An unknown page size key falls back to A4.
    pub fn new(config: PaginatorConfig) -> Result<Self, ConfigError> {
        let resolved = PageGeometry::resolve_or_default(&config.page)?;
        Ok(Self {
            geometry: resolved.geometry,
            heuristic: HeuristicMeasurer::new(config.estimate.clone()),
            scheduler: Scheduler::new(config.scheduler.clone()),
            config,
            state: None,
            overlay: OverlaySet::default(),
            diff_engine: DiffEngine::new(),
            doc_end: 0,
        })
    }

    pub fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Committed state, if a pass has completed
    pub fn state(&self) -> Option<&PaginationState> {
        self.state.as_ref()
    }

    pub fn overlay(&self) -> &OverlaySet {
        &self.overlay
    }

    /// Schedule the initial pass for `document`
    pub fn start(&mut self, document: &Document, now_ms: u64) {
        self.doc_end = document.content_size();
        self.scheduler.start(document.revision(), now_ms);
    }

    /// Feed a committed document change
    pub fn on_document_changed(&mut self, change: &DocumentChange, now_ms: u64) {
        if !change.doc_changed() {
            return;
        }
        let revision = change.after.revision();
        self.overlay = self.overlay.map(&change.mapping, revision);
        self.diff_engine.rebase(self.overlay.clone());
        self.doc_end = change.after.content_size();
        if let Some(state) = &self.state {
            self.state = Some(state.map(
                &change.mapping,
                revision,
                self.doc_end,
                self.overlay.clone(),
            ));
        }
        self.scheduler.notify_change(revision, now_ms);
    }

    pub fn poll(&mut self, now_ms: u64) -> SchedulerAction {
        self.scheduler.poll(now_ms)
    }

    /// Switch to a standard page size, keeping margins. Unknown keys are
    /// rejected and the current geometry stays in effect.
    pub fn set_page_size(&mut self, key: &str, now_ms: u64) -> Result<(), ConfigError> {
        let page = PageConfig {
            page_size: key.to_string(),
            width: None,
            height: None,
            ..self.config.page.clone()
        };
        self.geometry = PageGeometry::resolve(&page)?;
        self.config.page = page;
        log::debug!(
            "Page size set to '{}', content height {}",
            key,
            self.geometry.content_height
        );
        self.scheduler.request_immediate(now_ms);
        Ok(())
    }

    /// Replace the whole configuration. On error nothing changes.
    pub fn set_config(&mut self, config: PaginatorConfig, now_ms: u64) -> Result<(), ConfigError> {
        let resolved = PageGeometry::resolve_or_default(&config.page)?;
        self.geometry = resolved.geometry;
        self.heuristic = HeuristicMeasurer::new(config.estimate.clone());
        self.scheduler.set_config(config.scheduler.clone());
        self.config = config;
        self.scheduler.request_immediate(now_ms);
        Ok(())
    }

    /// Handle a layout frame requested through [`SchedulerAction::RequestLayoutFrame`]
    pub fn on_layout_frame(
        &mut self,
        document: &Document,
        surface: Option<&dyn LayoutSurface>,
        now_ms: u64,
    ) -> FrameOutcome {
        let Some(target) = self.scheduler.measuring_revision() else {
            return FrameOutcome::NotRequested;
        };

        if document.revision() != target {
            log::warn!(
                "Discarding pagination pass for revision {} (document is at {})",
                target,
                document.revision()
            );
            self.scheduler.abort_stale(now_ms);
            return FrameOutcome::Discarded {
                stale: target,
                current: document.revision(),
            };
        }

        let measured = match self.measure(document, surface) {
            Ok(measured) => measured,
            Err(MeasureError::Unavailable) => {
                if self.scheduler.measurement_failed() {
                    let attempts = match self.scheduler.state() {
                        SchedulerState::Measuring { attempts, .. } => attempts,
                        _ => 0,
                    };
                    log::debug!("Layout not settled, retry {}", attempts);
                    return FrameOutcome::Deferred { attempts };
                }
                log::warn!("Layout never settled, estimating block heights");
                self.estimate(document)
            }
        };

        self.scheduler.begin_commit();
        let outcome = self.commit(document, &measured);
        self.scheduler.finish(now_ms);
        outcome
    }

    /// Run a pass right now, outside the scheduler. An unsettled surface
    /// falls back to estimation immediately.
    pub fn recalculate(
        &mut self,
        document: &Document,
        surface: Option<&dyn LayoutSurface>,
    ) -> FrameOutcome {
        let measured = self
            .measure(document, surface)
            .unwrap_or_else(|_| self.estimate(document));
        self.doc_end = document.content_size();
        self.commit(document, &measured)
    }

    fn measure(
        &self,
        document: &Document,
        surface: Option<&dyn LayoutSurface>,
    ) -> Result<Vec<MeasuredBlock>, MeasureError> {
        match (self.config.strategy, surface) {
            (MeasureStrategy::Measured, Some(surface)) => {
                measure_document(document, &RenderedMeasurer::new(surface, &self.heuristic))
            }
            _ => Ok(self.estimate(document)),
        }
    }

    fn estimate(&self, document: &Document) -> Vec<MeasuredBlock> {
        document
            .positions()
            .enumerate()
            .map(|(index, (position, block))| {
                MeasuredBlock::new(index, position, self.heuristic.estimate_height(block))
            })
            .collect()
    }

    fn commit(&mut self, document: &Document, measured: &[MeasuredBlock]) -> FrameOutcome {
        let revision = document.revision();
        let doc_end = document.content_size();
        let page_breaks = calculate_breaks(measured, self.geometry.content_height);
        let overlay = project(&page_breaks, &self.geometry, doc_end, revision);
        let next = PaginationState::new(revision, page_breaks, doc_end, overlay);

        let unchanged = self.state.as_ref().is_some_and(|prev| {
            prev.same_layout(&next, self.config.scheduler.tolerance_px)
                && same_anchors(&self.overlay, &next.overlay)
        });

        if unchanged {
            log::debug!("Pagination unchanged at revision {}", revision);
            self.overlay.revision = revision;
            self.diff_engine.rebase(self.overlay.clone());
            self.state = Some(PaginationState {
                overlay: self.overlay.clone(),
                ..next
            });
            return FrameOutcome::Unchanged { revision };
        }

        let diff = self.diff_engine.compute_diff(&next.overlay);
        log::debug!(
            "Committed {} page(s) at revision {} ({} patches)",
            next.total_pages,
            revision,
            diff.patch_count()
        );
        let commit = OverlayCommit {
            revision,
            total_pages: next.total_pages,
            diff,
            add_to_history: false,
        };
        self.overlay = next.overlay.clone();
        self.doc_end = doc_end;
        self.state = Some(next);
        FrameOutcome::Committed(commit)
    }

    /// Total pages, 1 before the first pass
    pub fn total_pages(&self) -> u32 {
        self.state.as_ref().map_or(1, |s| s.total_pages)
    }

    /// Page holding `position`, 1 before the first pass
    pub fn page_for_position(&self, position: usize) -> u32 {
        self.state
            .as_ref()
            .map_or(1, |s| page_for_position(&s.breaks, position))
    }

    pub fn page_start(&self, page_number: u32) -> Option<usize> {
        match &self.state {
            Some(state) => state.page_start(page_number),
            None => (page_number == 1).then_some(0),
        }
    }

    pub fn page_ranges(&self) -> Vec<PageRange> {
        match &self.state {
            Some(state) => state.page_ranges(),
            None => vec![PageRange {
                page_number: 1,
                start: 0,
                end: self.doc_end,
            }],
        }
    }

    /// Height the editor container needs for all pages
    pub fn container_min_height(&self) -> f32 {
        self.geometry.stack_height(self.total_pages())
    }
}

fn same_anchors(a: &OverlaySet, b: &OverlaySet) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.key() == y.key() && x.anchor() == y.anchor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Block;
    use crate::editing::Transaction;
    use crate::layout::measure::{BlockBox, SnapshotSurface};

    fn heuristic_config() -> PaginatorConfig {
        PaginatorConfig {
            strategy: MeasureStrategy::Heuristic,
            ..Default::default()
        }
    }

    fn two_page_fixture() -> (Document, SnapshotSurface) {
        let mut blocks = vec![Block::heading(1, "Title")];
        blocks.extend((0..10).map(|_| Block::paragraph("p")));
        let doc = Document::from_blocks(blocks);
        let mut boxes = vec![BlockBox::new(92.0, 0.0, 0.0)];
        boxes.extend((0..10).map(|_| BlockBox::new(84.0, 0.0, 16.0)));
        let surface = SnapshotSurface::from_boxes(&doc, boxes);
        (doc, surface)
    }

    fn long_document(paragraphs: usize) -> Document {
        let blocks = (0..paragraphs)
            .map(|i| match i % 5 {
                0 => Block::heading(2, format!("Section {i}")),
                1 => Block::bullet_list(["one", "two", "three"]),
                _ => Block::paragraph("lorem ipsum dolor sit amet ".repeat(i % 9 + 1)),
            })
            .collect();
        Document::from_blocks(blocks)
    }

    #[test]
    fn test_config_from_json() {
        let config: PaginatorConfig = serde_json::from_str(
            r#"{"page": {"pageSize": "letter"}, "strategy": "heuristic", "scheduler": {"debounceMs": 50}}"#,
        )
        .unwrap();
        assert_eq!(config.page.page_size, "letter");
        assert_eq!(config.page.margin_top, 96.0);
        assert_eq!(config.strategy, MeasureStrategy::Heuristic);
        assert_eq!(config.scheduler.debounce_ms, 50);
        assert_eq!(config.estimate.line_height, 24.0);
    }

    #[test]
    fn test_unknown_page_size_falls_back() {
        let config = PaginatorConfig {
            page: PageConfig::with_page_size("tabloid"),
            ..Default::default()
        };
        let paginator = Paginator::new(config).unwrap();
        assert_eq!(paginator.geometry().content_height, 931.0);
    }

    #[test]
    fn test_queries_before_first_pass() {
        let paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        assert!(paginator.state().is_none());
        assert_eq!(paginator.total_pages(), 1);
        assert_eq!(paginator.page_for_position(500), 1);
        assert_eq!(paginator.page_start(1), Some(0));
        assert_eq!(paginator.page_start(2), None);
        assert_eq!(paginator.page_ranges().len(), 1);
        assert_eq!(paginator.container_min_height(), 1123.0);
    }

    #[test]
    fn test_empty_document() {
        let mut paginator = Paginator::new(heuristic_config()).unwrap();
        let outcome = paginator.recalculate(&Document::new(), None);
        assert!(outcome.is_committed());
        let state = paginator.state().unwrap();
        assert_eq!(state.total_pages, 1);
        assert!(state.breaks.is_empty());
        assert_eq!(state.remaining_height, 931.0);
        assert_eq!(paginator.overlay().break_count(), 0);
    }

    #[test]
    fn test_exactly_two_pages() {
        let (doc, surface) = two_page_fixture();
        let mut paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        paginator.recalculate(&doc, Some(&surface));

        let state = paginator.state().unwrap();
        assert_eq!(state.total_pages, 2);
        assert_eq!(state.breaks.len(), 1);
        assert_eq!(Some(state.breaks[0].position), doc.block_start(9));
        assert_eq!(state.remaining_height, 731.0);
        assert_eq!(paginator.page_for_position(0), 1);
        assert_eq!(paginator.page_for_position(state.breaks[0].position), 2);
        assert_eq!(paginator.container_min_height(), 2.0 * 1123.0 + 24.0);
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let (doc, surface) = two_page_fixture();
        let mut paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        assert!(paginator.recalculate(&doc, Some(&surface)).is_committed());
        let overlay = paginator.overlay().clone();

        assert_eq!(
            paginator.recalculate(&doc, Some(&surface)),
            FrameOutcome::Unchanged { revision: 0 }
        );
        assert_eq!(paginator.overlay(), &overlay);
    }

    #[test]
    fn test_height_jitter_within_tolerance_is_unchanged() {
        let (doc, _) = two_page_fixture();
        let mut boxes = vec![BlockBox::new(92.0, 0.0, 0.0)];
        boxes.extend((0..10).map(|_| BlockBox::new(84.0, 0.0, 16.0)));
        let surface = SnapshotSurface::from_boxes(&doc, boxes.clone());

        let mut paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        paginator.recalculate(&doc, Some(&surface));

        boxes[0].height += 0.25;
        let jittered = SnapshotSurface::from_boxes(&doc, boxes);
        assert!(matches!(
            paginator.recalculate(&doc, Some(&jittered)),
            FrameOutcome::Unchanged { .. }
        ));
    }

    #[test]
    fn test_page_size_switch_a4_to_legal() {
        let doc = long_document(120);
        let mut paginator = Paginator::new(heuristic_config()).unwrap();
        paginator.recalculate(&doc, None);
        let a4_breaks = paginator.state().unwrap().breaks.len();
        assert!(a4_breaks > 0);

        paginator.set_page_size("legal", 0).unwrap();
        assert_eq!(paginator.geometry().content_height, 1152.0);
        paginator.recalculate(&doc, None);
        let legal_breaks = paginator.state().unwrap().breaks.len();
        assert!(legal_breaks <= a4_breaks);
    }

    #[test]
    fn test_unknown_page_size_keeps_geometry() {
        let mut paginator = Paginator::new(heuristic_config()).unwrap();
        paginator.set_page_size("letter", 0).unwrap();
        let err = paginator.set_page_size("quarto", 0).unwrap_err();
        assert_eq!(err, ConfigError::UnknownPageSize("quarto".into()));
        assert_eq!(paginator.geometry().content_height, 864.0);
        assert_eq!(paginator.config().page.page_size, "letter");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut paginator = Paginator::new(heuristic_config()).unwrap();
        let mut config = heuristic_config();
        config.page.margin_top = 2000.0;
        assert!(paginator.set_config(config, 0).is_err());
        assert_eq!(paginator.geometry().content_height, 931.0);
    }

    #[test]
    fn test_scheduled_pass_commits_once() {
        let doc = long_document(60);
        let mut paginator = Paginator::new(heuristic_config()).unwrap();
        paginator.start(&doc, 0);

        assert_eq!(paginator.poll(100), SchedulerAction::Wait { until: 150 });
        assert_eq!(
            paginator.poll(150),
            SchedulerAction::RequestLayoutFrame { revision: 0 }
        );
        let outcome = paginator.on_layout_frame(&doc, None, 160);
        match outcome {
            FrameOutcome::Committed(commit) => {
                assert!(!commit.add_to_history);
                assert_eq!(commit.revision, 0);
                assert!(commit.diff.has_patches());
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert_eq!(paginator.poll(200), SchedulerAction::Sleep);
        assert_eq!(paginator.on_layout_frame(&doc, None, 210), FrameOutcome::NotRequested);
    }

    #[test]
    fn test_rapid_edits_coalesce_into_one_pass() {
        let mut doc = long_document(20);
        let mut paginator = Paginator::new(heuristic_config()).unwrap();
        paginator.recalculate(&doc, None);

        for i in 0..5u64 {
            let change = doc.apply(&Transaction::new().insert_text(1, "x")).unwrap();
            paginator.on_document_changed(&change, i * 20);
        }
        assert_eq!(paginator.poll(100), SchedulerAction::Wait { until: 180 });
        assert_eq!(
            paginator.poll(180),
            SchedulerAction::RequestLayoutFrame { revision: 5 }
        );
        assert_eq!(paginator.poll(181), SchedulerAction::AwaitingFrame);
    }

    #[test]
    fn test_stale_frame_is_discarded() {
        let mut doc = long_document(20);
        let mut paginator = Paginator::new(heuristic_config()).unwrap();
        paginator.start(&doc, 0);
        paginator.poll(150);

        let change = doc.apply(&Transaction::new().insert_text(1, "x")).unwrap();
        paginator.on_document_changed(&change, 155);

        assert_eq!(
            paginator.on_layout_frame(&doc, None, 160),
            FrameOutcome::Discarded {
                stale: 0,
                current: 1
            }
        );
        assert!(paginator.state().is_none());
        assert_eq!(
            paginator.poll(160),
            SchedulerAction::RequestLayoutFrame { revision: 1 }
        );
        assert!(paginator.on_layout_frame(&doc, None, 161).is_committed());
        assert_eq!(paginator.state().unwrap().revision, 1);
    }

    #[test]
    fn test_unsettled_surface_retries_then_estimates() {
        let doc = long_document(10);
        let surface = SnapshotSurface::unsettled();
        let mut paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        paginator.start(&doc, 0);
        paginator.poll(150);

        for attempt in 1..=3 {
            assert_eq!(
                paginator.on_layout_frame(&doc, Some(&surface), 150 + attempt as u64),
                FrameOutcome::Deferred { attempts: attempt }
            );
        }
        assert!(paginator
            .on_layout_frame(&doc, Some(&surface), 160)
            .is_committed());
        assert!(paginator.state().is_some());
        assert_eq!(paginator.scheduler_state(), SchedulerState::Idle);
    }

    #[test]
    fn test_overlay_follows_edits_between_passes() {
        let (mut doc, surface) = two_page_fixture();
        let mut paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        paginator.recalculate(&doc, Some(&surface));
        let before = paginator.overlay().artifacts[1].anchor();

        let change = doc.apply(&Transaction::new().insert_text(1, "abc")).unwrap();
        paginator.on_document_changed(&change, 0);
        assert_eq!(paginator.overlay().artifacts[1].anchor(), before + 3);
        assert_eq!(paginator.overlay().revision, 1);
    }

    #[test]
    fn test_queries_follow_edits_between_passes() {
        let (mut doc, surface) = two_page_fixture();
        let mut paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        paginator.recalculate(&doc, Some(&surface));
        // Heading is 0..7, each paragraph 3 wide; page 2 starts at paragraph 9
        assert_eq!(paginator.page_start(2), Some(31));

        let change = doc
            .apply(&Transaction::new().insert_text(1, "x".repeat(500)))
            .unwrap();
        paginator.on_document_changed(&change, 0);

        let state = paginator.state().unwrap();
        assert_eq!(state.revision, 1);
        assert_eq!(state.doc_end, doc.content_size());
        assert_eq!(paginator.page_for_position(31), 1);
        assert_eq!(paginator.page_for_position(531), 2);
        assert_eq!(paginator.page_start(2), Some(531));
        assert_eq!(paginator.page_ranges()[1].range(), 531..doc.content_size());
        assert_eq!(paginator.overlay().artifacts[1].anchor(), 531);
    }

    #[test]
    fn test_break_collapsing_onto_start_merges_pages() {
        let (mut doc, surface) = two_page_fixture();
        let mut paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        paginator.recalculate(&doc, Some(&surface));

        // Remove everything on page 1; the break ends up at the document start
        let tr = (0..9).fold(Transaction::new(), |tr, _| tr.remove_block(0));
        let change = doc.apply(&tr).unwrap();
        paginator.on_document_changed(&change, 0);
        assert_eq!(paginator.total_pages(), 1);
        assert_eq!(paginator.page_ranges()[0].range(), 0..doc.content_size());
    }

    #[test]
    fn test_host_margins_never_panic_the_pass() {
        let doc = Document::from_blocks(vec![Block::paragraph("a"), Block::paragraph("b")]);
        let surface = SnapshotSurface::from_boxes(
            &doc,
            [BlockBox::new(20.0, 0.0, 0.0), BlockBox::new(10.0, -20.0, 0.0)],
        );
        let mut paginator = Paginator::new(PaginatorConfig::default()).unwrap();
        assert!(paginator.recalculate(&doc, Some(&surface)).is_committed());
        assert_eq!(paginator.total_pages(), 1);
        assert_eq!(paginator.state().unwrap().remaining_height, 911.0);
    }

    #[test]
    fn test_edit_that_moves_break_commits_update() {
        let (mut doc, _) = two_page_fixture();
        let mut paginator = Paginator::new(heuristic_config()).unwrap();
        paginator.recalculate(&doc, None);
        let pages = paginator.total_pages();

        let change = doc
            .apply(&Transaction::new().insert_block(1, Block::table(vec![vec!["a".into()]; 30])))
            .unwrap();
        paginator.on_document_changed(&change, 0);
        match paginator.recalculate(&doc, None) {
            FrameOutcome::Committed(commit) => {
                assert_eq!(commit.revision, 1);
                assert!(commit.total_pages > pages);
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }
}
