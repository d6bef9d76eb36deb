//! Selection capture
//!
//! Watches selection-end gestures scoped to the document viewport and
//! turns the ones that qualify into a [`PendingSelection`]: the selected
//! text plus an anchor-space rectangle on the current page. Everything
//! else (empty text, zero area, selections leaking off the page or out
//! of the container) is discarded before it can become a bad anchor.

use log::debug;

use crate::geometry::{self, AnchorRect, ScreenRect};

/// A captured selection, held in memory until it is consumed by
/// annotation creation or cleared by a page change / explicit discard.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSelection {
    pub text: String,
    /// Page the anchor belongs to, 1-based.
    pub page_number: u32,
    pub anchor: AnchorRect,
}

/// Raw selection geometry as reported by the host: the selected text,
/// its bounding rectangle, and the point where the selection started.
#[derive(Clone, Debug)]
pub struct RawSelection {
    pub text: String,
    pub rect: ScreenRect,
    pub start: crate::geometry::ScreenPoint,
}

/// Everything the tracker needs to judge and convert a raw selection.
#[derive(Clone, Copy, Debug)]
pub struct SelectionContext {
    /// The scrollable viewport container, in screen space.
    pub container: ScreenRect,
    /// Rendered rectangle of the current page, in screen space.
    pub page_rect: ScreenRect,
    pub page_number: u32,
    pub scale: f32,
    /// From the page tracker: false for image-only pages or while the
    /// availability check is unresolved.
    pub text_available: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("selection is empty")]
    EmptySelection,

    #[error("selection started outside the document viewport")]
    OutsideContainer,

    #[error("selection has zero area")]
    DegenerateRect,

    #[error("selection crosses the boundary of page {page_number}")]
    CrossPage { page_number: u32 },

    #[error("page {page_number} has no extractable text")]
    TextUnavailable { page_number: u32 },

    #[error("no rendered geometry for page {page_number}")]
    NoPageGeometry { page_number: u32 },
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    pending: Option<PendingSelection>,
}

impl SelectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingSelection> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume the pending selection (annotation creation path).
    pub fn take(&mut self) -> Option<PendingSelection> {
        self.pending.take()
    }

    /// Discard the pending selection (dialog cancel, page change).
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Handle a selection-end gesture.
    ///
    /// On success the pending selection is replaced and returned. On any
    /// rejection the previous pending selection is cleared as well: a
    /// gesture happened, so whatever was pending no longer matches what
    /// the user sees.
    pub fn selection_ended(
        &mut self,
        raw: &RawSelection,
        ctx: &SelectionContext,
    ) -> Result<&PendingSelection, SelectionError> {
        self.pending = None;

        if raw.text.trim().is_empty() {
            return Err(SelectionError::EmptySelection);
        }
        if !ctx.container.contains_point(raw.start) {
            return Err(SelectionError::OutsideContainer);
        }
        if !ctx.text_available {
            return Err(SelectionError::TextUnavailable {
                page_number: ctx.page_number,
            });
        }
        if raw.rect.area() <= 0.0 {
            return Err(SelectionError::DegenerateRect);
        }
        if !ctx.page_rect.contains_rect(&raw.rect) {
            // Bounding box spills past the current page: a cross-page
            // selection. Anchoring it against one page's origin would
            // store a lie, so it is refused outright.
            debug!(
                "discarding cross-page selection on page {} ({:?})",
                ctx.page_number, raw.rect
            );
            return Err(SelectionError::CrossPage {
                page_number: ctx.page_number,
            });
        }

        let anchor = geometry::to_anchor_space(raw.rect, ctx.page_rect.origin(), ctx.scale);
        Ok(&*self.pending.insert(PendingSelection {
            text: raw.text.clone(),
            page_number: ctx.page_number,
            anchor,
        }))
    }
}
