//! Page renderer boundary
//!
//! The engine never rasterizes anything itself. Whatever paints glyphs
//! (a PDF.js-style canvas, a native raster worker) sits behind
//! [`PageRenderer`] and only has to answer two questions: where is a
//! page on screen right now, and what text can be extracted from it.

use crate::geometry::ScreenRect;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("page {0} is not loaded")]
    PageNotLoaded(u32),

    #[error("renderer: {detail}")]
    Backend { detail: String },
}

impl RenderError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend { detail: msg.into() }
    }
}

/// Geometry and text access for rendered pages.
///
/// `page_rect` answers in *current* screen space, so its results change
/// with every zoom or scroll and must never be cached by callers.
/// `extract_text` is the slow path; the engine requests it through a
/// [`CheckPageText`](crate::page_tracker::Effect::CheckPageText) effect
/// and receives the outcome via
/// [`resolve_text_check`](crate::engine::AnnotationEngine::resolve_text_check),
/// so a slow renderer never blocks page tracking.
pub trait PageRenderer {
    fn page_count(&self) -> u32;

    /// Screen-space rectangle of a drawn page, `None` until the page has
    /// been laid out.
    fn page_rect(&self, page_number: u32) -> Option<ScreenRect>;

    /// Extractable text lines of a page. An empty or all-blank result
    /// means the page is image-only.
    fn extract_text(&self, page_number: u32) -> Result<Vec<String>, RenderError>;
}

/// Returns true when extracted text amounts to nothing selectable.
#[must_use]
pub fn is_image_only(lines: &[String]) -> bool {
    lines.iter().all(|line| line.trim().is_empty())
}

#[cfg(any(test, feature = "test-utils"))]
pub mod fake {
    //! In-memory renderer for tests: fixed-height pages stacked
    //! vertically with a configurable gap, text per page settable.

    use std::collections::HashMap;

    use super::{PageRenderer, RenderError};
    use crate::geometry::ScreenRect;

    pub struct FakeRenderer {
        page_count: u32,
        page_width: f32,
        page_height: f32,
        gap: f32,
        scroll_offset: f32,
        text: HashMap<u32, Vec<String>>,
        failing_pages: Vec<u32>,
    }

    impl FakeRenderer {
        #[must_use]
        pub fn new(page_count: u32, page_width: f32, page_height: f32) -> Self {
            Self {
                page_count,
                page_width,
                page_height,
                gap: 16.0,
                scroll_offset: 0.0,
                text: HashMap::new(),
                failing_pages: Vec::new(),
            }
        }

        pub fn set_text(&mut self, page_number: u32, lines: Vec<String>) {
            self.text.insert(page_number, lines);
        }

        pub fn fail_extraction(&mut self, page_number: u32) {
            self.failing_pages.push(page_number);
        }

        pub fn scroll_to(&mut self, offset: f32) {
            self.scroll_offset = offset;
        }
    }

    impl PageRenderer for FakeRenderer {
        fn page_count(&self) -> u32 {
            self.page_count
        }

        fn page_rect(&self, page_number: u32) -> Option<ScreenRect> {
            if page_number == 0 || page_number > self.page_count {
                return None;
            }
            let index = (page_number - 1) as f32;
            let top = index * (self.page_height + self.gap) - self.scroll_offset;
            Some(ScreenRect::new(0.0, top, self.page_width, self.page_height))
        }

        fn extract_text(&self, page_number: u32) -> Result<Vec<String>, RenderError> {
            if self.failing_pages.contains(&page_number) {
                return Err(RenderError::backend("extraction failed"));
            }
            if page_number == 0 || page_number > self.page_count {
                return Err(RenderError::PageNotLoaded(page_number));
            }
            Ok(self.text.get(&page_number).cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeRenderer;
    use super::*;

    #[test]
    fn image_only_ignores_whitespace_lines() {
        assert!(is_image_only(&[]));
        assert!(is_image_only(&["".to_string(), "   ".to_string()]));
        assert!(!is_image_only(&["  a word".to_string()]));
    }

    #[test]
    fn fake_renderer_stacks_pages_vertically() {
        let mut renderer = FakeRenderer::new(3, 600.0, 800.0);

        let first = renderer.page_rect(1).unwrap();
        let second = renderer.page_rect(2).unwrap();
        assert_eq!(first.y, 0.0);
        assert_eq!(second.y, 816.0);
        assert!(renderer.page_rect(4).is_none());
        assert!(renderer.page_rect(0).is_none());

        renderer.scroll_to(400.0);
        assert_eq!(renderer.page_rect(1).unwrap().y, -400.0);
    }
}
