//! Engine facade
//!
//! Owns the page tracker and the selection tracker, holds the current
//! scale and viewport, and translates tracker effects into
//! [`EngineEvent`]s for the host. The host performs the outward-facing
//! work (scrolling the real viewport, running text extraction, talking
//! to the annotation store) and feeds results back in.

use log::debug;

use crate::geometry::ScreenRect;
use crate::overlay::{self, OverlayDescriptor};
use crate::page_tracker::{Command, Effect, PageObservation, PageTracker, RequestId};
use crate::renderer::{self, PageRenderer, RenderError};
use crate::selection::{
    PendingSelection, RawSelection, SelectionContext, SelectionError, SelectionTracker,
};
use crate::store::AnnotationStore;

/// Notifications the host reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// Authoritative current page changed.
    PageChanged(u32),
    /// The pending selection was published or cleared.
    SelectionChanged(Option<PendingSelection>),
    /// Perform a programmatic scroll, then call
    /// [`AnnotationEngine::scroll_settled`].
    ScrollToPage(u32),
    /// Run text extraction for the page and feed the outcome to
    /// [`AnnotationEngine::resolve_text_check`].
    CheckPageText { page_number: u32, request: RequestId },
}

pub struct AnnotationEngine {
    page_tracker: PageTracker,
    selection: SelectionTracker,
    scale: f32,
    /// The scrollable viewport container, in screen space.
    container: ScreenRect,
}

impl AnnotationEngine {
    #[must_use]
    pub fn new(container: ScreenRect) -> Self {
        Self {
            page_tracker: PageTracker::new(),
            selection: SelectionTracker::new(),
            scale: 1.0,
            container,
        }
    }

    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.page_tracker.current_page()
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Selection/highlight/comment actions are only allowed on pages
    /// with confirmed extractable text. Notes are always allowed.
    #[must_use]
    pub fn can_annotate_current_page(&self) -> bool {
        self.page_tracker.text_available()
    }

    #[must_use]
    pub fn pending_selection(&self) -> Option<&PendingSelection> {
        self.selection.pending()
    }

    /// Change the zoom level. Anchors are scale-independent, so nothing
    /// is invalidated; overlays simply project differently on the next
    /// call.
    pub fn set_scale(&mut self, scale: f32) {
        debug_assert!(scale > 0.0);
        self.scale = scale;
    }

    pub fn set_container(&mut self, container: ScreenRect) {
        self.container = container;
    }

    /// Document (re)loaded.
    pub fn set_document(&mut self, renderer: &dyn PageRenderer) -> Vec<EngineEvent> {
        self.drive(Command::SetPageCount(renderer.page_count()))
    }

    pub fn go_to_page(&mut self, page_number: u32) -> Vec<EngineEvent> {
        self.drive(Command::GoToPage(page_number))
    }

    pub fn next_page(&mut self) -> Vec<EngineEvent> {
        self.drive(Command::NextPage)
    }

    pub fn prev_page(&mut self) -> Vec<EngineEvent> {
        self.drive(Command::PrevPage)
    }

    pub fn scroll_settled(&mut self) -> Vec<EngineEvent> {
        self.drive(Command::ScrollSettled)
    }

    /// Feed raw visibility fractions (host-computed) to the tracker.
    pub fn observe_visibility(&mut self, observations: Vec<PageObservation>) -> Vec<EngineEvent> {
        self.drive(Command::Observe(observations))
    }

    /// Compute visibility fractions from the renderer's page geometry
    /// and feed them to the tracker. Convenience for hosts that do not
    /// run their own intersection bookkeeping.
    pub fn observe_viewport(&mut self, renderer: &dyn PageRenderer) -> Vec<EngineEvent> {
        let mut observations = Vec::new();
        for page_number in 1..=renderer.page_count() {
            let Some(rect) = renderer.page_rect(page_number) else {
                continue;
            };
            if rect.height <= 0.0 {
                continue;
            }
            let fraction = self.container.vertical_overlap(&rect) / rect.height;
            if fraction > 0.0 {
                observations.push(PageObservation {
                    page_number,
                    visible_fraction: fraction.min(1.0),
                });
            }
        }
        self.observe_visibility(observations)
    }

    /// Deliver the outcome of a text-extraction request. Stale results
    /// (superseded request, since-changed page) are dropped inside the
    /// tracker; extraction failure counts as "no text".
    pub fn resolve_text_check(
        &mut self,
        page_number: u32,
        request: RequestId,
        result: Result<Vec<String>, RenderError>,
    ) -> Vec<EngineEvent> {
        let has_text = match result {
            Ok(lines) => Some(!renderer::is_image_only(&lines)),
            Err(err) => {
                debug!("text check for page {page_number} failed: {err}");
                None
            }
        };
        self.drive(Command::TextCheckResolved {
            page_number,
            request,
            has_text,
        })
    }

    /// Handle a selection-end gesture against the current page.
    pub fn selection_ended(
        &mut self,
        raw: &RawSelection,
        renderer: &dyn PageRenderer,
    ) -> Result<PendingSelection, SelectionError> {
        let page_number = self.page_tracker.current_page();
        let page_rect = renderer
            .page_rect(page_number)
            .ok_or(SelectionError::NoPageGeometry { page_number })?;

        let ctx = SelectionContext {
            container: self.container,
            page_rect,
            page_number,
            scale: self.scale,
            text_available: self.page_tracker.text_available(),
        };
        self.selection.selection_ended(raw, &ctx).cloned()
    }

    /// Consume the pending selection for annotation creation.
    pub fn take_pending_selection(&mut self) -> Option<PendingSelection> {
        self.selection.take()
    }

    /// Explicitly discard the pending selection (dialog cancel).
    pub fn discard_selection(&mut self) -> Vec<EngineEvent> {
        if self.selection.has_pending() {
            self.selection.clear();
            vec![EngineEvent::SelectionChanged(None)]
        } else {
            vec![]
        }
    }

    /// Project a document's stored anchors onto one rendered page.
    /// Returns nothing for pages the renderer has not laid out yet.
    #[must_use]
    pub fn overlays_for_page(
        &self,
        store: &dyn AnnotationStore,
        page_number: u32,
        renderer: &dyn PageRenderer,
    ) -> Vec<OverlayDescriptor> {
        let Some(page_rect) = renderer.page_rect(page_number) else {
            return Vec::new();
        };
        let page: Vec<_> = store
            .page_annotations(page_number)
            .into_iter()
            .cloned()
            .collect();
        overlay::overlays_for_page(&page, page_number, page_rect.origin(), self.scale)
    }

    fn drive(&mut self, command: Command) -> Vec<EngineEvent> {
        let effects = self.page_tracker.apply(command);
        let mut events = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::ScrollToPage(page) => events.push(EngineEvent::ScrollToPage(page)),
                Effect::PageChanged(page) => events.push(EngineEvent::PageChanged(page)),
                Effect::ClearPendingSelection => {
                    if self.selection.has_pending() {
                        self.selection.clear();
                        events.push(EngineEvent::SelectionChanged(None));
                    }
                }
                Effect::CheckPageText {
                    page_number,
                    request,
                } => events.push(EngineEvent::CheckPageText {
                    page_number,
                    request,
                }),
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{HighlightColor, NewAnnotation};
    use crate::geometry::ScreenPoint;
    use crate::overlay::OverlayKind;
    use crate::renderer::fake::FakeRenderer;
    use crate::store::FileAnnotationStore;

    fn text_page(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn engine_and_renderer() -> (AnnotationEngine, FakeRenderer) {
        let mut renderer = FakeRenderer::new(5, 600.0, 800.0);
        for page in 1..=5 {
            renderer.set_text(page, text_page(&["lorem ipsum"]));
        }
        let engine = AnnotationEngine::new(ScreenRect::new(0.0, 0.0, 600.0, 700.0));
        (engine, renderer)
    }

    /// Run the text check the way a host would: perform extraction for
    /// every CheckPageText event and feed the outcome back.
    fn settle_text_checks(
        engine: &mut AnnotationEngine,
        renderer: &FakeRenderer,
        events: &[EngineEvent],
    ) {
        for event in events {
            if let EngineEvent::CheckPageText {
                page_number,
                request,
            } = event
            {
                let result = renderer.extract_text(*page_number);
                engine.resolve_text_check(*page_number, *request, result);
            }
        }
    }

    fn open_document(engine: &mut AnnotationEngine, renderer: &FakeRenderer) {
        let events = engine.set_document(renderer);
        settle_text_checks(engine, renderer, &events);
    }

    #[test]
    fn full_annotation_flow_from_selection_to_overlay() {
        let (mut engine, renderer) = engine_and_renderer();
        open_document(&mut engine, &renderer);
        assert!(engine.can_annotate_current_page());

        let raw = RawSelection {
            text: "lorem ipsum".to_string(),
            rect: ScreenRect::new(100.0, 200.0, 120.0, 16.0),
            start: ScreenPoint::new(100.0, 200.0),
        };
        engine.selection_ended(&raw, &renderer).unwrap();

        let pending = engine.take_pending_selection().unwrap();
        let mut store = FileAnnotationStore::ephemeral("doc-1");
        let created = store
            .create(
                NewAnnotation::comment(
                    "doc-1",
                    pending.page_number,
                    pending.anchor,
                    crate::thread_codec::encode(&pending.text, "interesting claim"),
                    HighlightColor::Yellow,
                )
                .unwrap(),
            )
            .unwrap();

        let overlays = engine.overlays_for_page(&store, 1, &renderer);
        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].annotation_id, created.id);
        assert_eq!(overlays[0].kind, OverlayKind::Highlight);
        assert_eq!(overlays[0].rect, ScreenRect::new(100.0, 200.0, 120.0, 16.0));
        assert_eq!(overlays[1].kind, OverlayKind::CommentMarker);
    }

    #[test]
    fn overlays_track_scale_changes_without_restating_anchors() {
        let (mut engine, renderer) = engine_and_renderer();
        open_document(&mut engine, &renderer);

        let mut store = FileAnnotationStore::ephemeral("doc-1");
        store
            .create(
                NewAnnotation::highlight(
                    "doc-1",
                    1,
                    crate::geometry::AnchorRect::new(50.0, 60.0, 40.0, 10.0),
                    "words",
                    HighlightColor::Green,
                )
                .unwrap(),
            )
            .unwrap();

        let at_1x = engine.overlays_for_page(&store, 1, &renderer);
        engine.set_scale(2.0);
        let at_2x = engine.overlays_for_page(&store, 1, &renderer);

        assert_eq!(at_1x[0].rect.width, 40.0);
        assert_eq!(at_2x[0].rect.width, 80.0);
    }

    #[test]
    fn page_change_clears_pending_selection_and_notifies() {
        let (mut engine, renderer) = engine_and_renderer();
        open_document(&mut engine, &renderer);

        let raw = RawSelection {
            text: "lorem ipsum".to_string(),
            rect: ScreenRect::new(100.0, 200.0, 120.0, 16.0),
            start: ScreenPoint::new(100.0, 200.0),
        };
        engine.selection_ended(&raw, &renderer).unwrap();
        assert!(engine.pending_selection().is_some());

        let events = engine.go_to_page(2);
        assert!(events.contains(&EngineEvent::SelectionChanged(None)));
        assert!(events.contains(&EngineEvent::ScrollToPage(2)));
        assert!(engine.pending_selection().is_none());
    }

    #[test]
    fn image_only_page_disables_annotation_actions() {
        let (mut engine, mut renderer) = engine_and_renderer();
        renderer.set_text(2, text_page(&["", "   "]));
        open_document(&mut engine, &renderer);

        let events = engine.go_to_page(2);
        settle_text_checks(&mut engine, &renderer, &events);
        engine.scroll_settled();

        assert!(!engine.can_annotate_current_page());
        let raw = RawSelection {
            text: "ghost".to_string(),
            rect: ScreenRect::new(10.0, 10.0, 50.0, 10.0),
            start: ScreenPoint::new(10.0, 10.0),
        };
        assert!(matches!(
            engine.selection_ended(&raw, &renderer),
            Err(SelectionError::TextUnavailable { page_number: 2 })
        ));
    }

    #[test]
    fn failed_extraction_disables_annotation_actions() {
        let (mut engine, mut renderer) = engine_and_renderer();
        renderer.fail_extraction(1);
        open_document(&mut engine, &renderer);

        assert!(!engine.can_annotate_current_page());
    }

    #[test]
    fn observe_viewport_switches_page_after_scroll() {
        let (mut engine, mut renderer) = engine_and_renderer();
        open_document(&mut engine, &renderer);

        // Scroll so page 2 dominates the viewport.
        renderer.scroll_to(900.0);
        let events = engine.observe_viewport(&renderer);
        assert!(events.contains(&EngineEvent::PageChanged(2)));
        settle_text_checks(&mut engine, &renderer, &events);
        assert_eq!(engine.current_page(), 2);
        assert!(engine.can_annotate_current_page());
    }

    #[test]
    fn overlays_for_unrendered_page_are_empty() {
        let (engine, _) = engine_and_renderer();
        let store = FileAnnotationStore::ephemeral("doc-1");
        let renderer = FakeRenderer::new(0, 600.0, 800.0);
        assert!(engine.overlays_for_page(&store, 9, &renderer).is_empty());
    }
}
