//! Overlay projection
//!
//! Projects stored anchors into screen space for one rendered page.
//! Pure: the overlay set for a page is a function of the annotation
//! list, the page origin, and the scale, nothing else. Screen
//! rectangles are derived here on every call and never cached, because
//! any zoom change invalidates them.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, HighlightColor};
use crate::geometry::{self, ScreenPoint, ScreenRect};

/// Side length of the comment marker square, in screen pixels. A UI
/// affordance, so it does not scale with zoom.
pub const COMMENT_MARKER_SIZE: f32 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    /// Translucent rectangle over the anchored region.
    Highlight,
    /// Interactive marker that opens the comment thread.
    CommentMarker,
}

/// One visual element to draw for the current render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayDescriptor {
    pub annotation_id: AnnotationId,
    pub kind: OverlayKind,
    pub rect: ScreenRect,
    pub color: Option<HighlightColor>,
}

/// Build the overlays for one page.
///
/// Highlights and comments each contribute a highlight rectangle;
/// comments additionally contribute exactly one marker at the right
/// edge of their rectangle. Notes draw nothing (they are page-scoped).
/// Output preserves annotation list order, so overlapping highlights
/// render with the last write on top.
#[must_use]
pub fn overlays_for_page(
    annotations: &[Annotation],
    page_number: u32,
    page_origin: ScreenPoint,
    scale: f32,
) -> Vec<OverlayDescriptor> {
    let mut overlays = Vec::new();

    for annotation in annotations {
        if annotation.page_number != page_number || !annotation.is_anchored() {
            continue;
        }
        let Some(anchor) = annotation.anchor else {
            // is_anchored kinds always carry an anchor per the model
            // invariant; a record that lost it is skipped, not drawn
            // at a guessed position.
            continue;
        };

        let rect = geometry::to_screen_space(anchor, page_origin, scale);
        overlays.push(OverlayDescriptor {
            annotation_id: annotation.id,
            kind: OverlayKind::Highlight,
            rect,
            color: annotation.color,
        });

        if annotation.kind == AnnotationKind::Comment {
            overlays.push(OverlayDescriptor {
                annotation_id: annotation.id,
                kind: OverlayKind::CommentMarker,
                rect: marker_rect(rect),
                color: annotation.color,
            });
        }
    }

    overlays
}

/// Marker square hanging off the top-right corner of a highlight rect.
fn marker_rect(highlight: ScreenRect) -> ScreenRect {
    ScreenRect::new(
        highlight.x + highlight.width,
        highlight.y,
        COMMENT_MARKER_SIZE,
        COMMENT_MARKER_SIZE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::NewAnnotation;
    use crate::geometry::AnchorRect;

    fn annotation(id: u64, new: NewAnnotation) -> Annotation {
        Annotation::from_new(new, AnnotationId(id)).unwrap()
    }

    fn sample_list() -> Vec<Annotation> {
        vec![
            annotation(
                1,
                NewAnnotation::highlight(
                    "doc",
                    1,
                    AnchorRect::new(100.0, 50.0, 40.0, 12.0),
                    "quoted",
                    HighlightColor::Yellow,
                )
                .unwrap(),
            ),
            annotation(
                2,
                NewAnnotation::comment(
                    "doc",
                    1,
                    AnchorRect::new(10.0, 200.0, 120.0, 14.0),
                    "\"q\"\n\nhi",
                    HighlightColor::Blue,
                )
                .unwrap(),
            ),
            annotation(
                3,
                NewAnnotation::note("doc", 1, "page note", None).unwrap(),
            ),
            annotation(
                4,
                NewAnnotation::highlight(
                    "doc",
                    2,
                    AnchorRect::new(0.0, 0.0, 10.0, 10.0),
                    "other page",
                    HighlightColor::Pink,
                )
                .unwrap(),
            ),
        ]
    }

    #[test]
    fn notes_and_other_pages_draw_nothing() {
        let overlays = overlays_for_page(&sample_list(), 1, ScreenPoint::new(0.0, 0.0), 1.0);

        // Highlight, comment highlight, comment marker.
        assert_eq!(overlays.len(), 3);
        assert!(
            overlays
                .iter()
                .all(|o| o.annotation_id != AnnotationId(3) && o.annotation_id != AnnotationId(4))
        );
    }

    #[test]
    fn comment_contributes_one_marker_at_right_edge() {
        let overlays = overlays_for_page(&sample_list(), 1, ScreenPoint::new(0.0, 0.0), 1.0);

        let markers: Vec<_> = overlays
            .iter()
            .filter(|o| o.kind == OverlayKind::CommentMarker)
            .collect();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].annotation_id, AnnotationId(2));
        assert_eq!(markers[0].rect.x, 130.0);
        assert_eq!(markers[0].rect.y, 200.0);
        assert_eq!(markers[0].rect.width, COMMENT_MARKER_SIZE);
    }

    #[test]
    fn overlays_scale_with_zoom_but_page_ratios_hold() {
        let annotations = sample_list();
        let origin = ScreenPoint::new(20.0, 30.0);
        let page_width = 600.0;

        let at_1x = overlays_for_page(&annotations, 1, origin, 1.0);
        let at_2x = overlays_for_page(&annotations, 1, origin, 2.0);

        let h1 = &at_1x[0].rect;
        let h2 = &at_2x[0].rect;
        // Ratio of highlight extent to page extent is scale-invariant.
        let ratio_1x = h1.width / (page_width * 1.0);
        let ratio_2x = h2.width / (page_width * 2.0);
        assert!((ratio_1x - ratio_2x).abs() < 1e-6);

        // Offsets relative to the page origin scale linearly.
        assert!(((h2.x - origin.x) - 2.0 * (h1.x - origin.x)).abs() < 1e-4);
    }

    #[test]
    fn list_order_is_preserved_for_stacking() {
        let mut annotations = sample_list();
        // Second highlight over the same region as the first.
        annotations.push(annotation(
            5,
            NewAnnotation::highlight(
                "doc",
                1,
                AnchorRect::new(100.0, 50.0, 40.0, 12.0),
                "quoted",
                HighlightColor::Green,
            )
            .unwrap(),
        ));

        let overlays = overlays_for_page(&annotations, 1, ScreenPoint::new(0.0, 0.0), 1.0);
        assert_eq!(overlays.first().unwrap().annotation_id, AnnotationId(1));
        assert_eq!(overlays.last().unwrap().annotation_id, AnnotationId(5));
    }

    #[test]
    fn projection_is_deterministic() {
        let annotations = sample_list();
        let a = overlays_for_page(&annotations, 1, ScreenPoint::new(5.0, 7.0), 1.5);
        let b = overlays_for_page(&annotations, 1, ScreenPoint::new(5.0, 7.0), 1.5);
        assert_eq!(a, b);
    }
}
