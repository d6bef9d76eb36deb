//! Screen-space and anchor-space geometry
//!
//! Anchors are the only persisted geometry in the engine. A screen
//! rectangle is valid for exactly one `(page_origin, scale)` pair and is
//! recomputed on every render pass.

use serde::{Deserialize, Serialize};

/// A point in current screen space (pixels at the current scale).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in current screen space (pixels at the current scale).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner of this rectangle.
    #[must_use]
    pub fn origin(&self) -> ScreenPoint {
        ScreenPoint::new(self.x, self.y)
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Check whether a point lies inside this rectangle (edges inclusive).
    #[must_use]
    pub fn contains_point(&self, point: ScreenPoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Check whether `other` lies entirely within this rectangle.
    #[must_use]
    pub fn contains_rect(&self, other: &ScreenRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }

    /// Height of the overlap between this rectangle and `other`, in pixels.
    #[must_use]
    pub fn vertical_overlap(&self, other: &ScreenRect) -> f32 {
        let top = self.y.max(other.y);
        let bottom = (self.y + self.height).min(other.y + other.height);
        (bottom - top).max(0.0)
    }
}

/// A scale-independent rectangle relative to the unscaled page origin.
///
/// All four scalars are non-negative; `width`/`height` are zero only for
/// degenerate selections, which the selection step rejects before an
/// anchor is ever stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl AnchorRect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[must_use]
    pub fn is_non_negative(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.width >= 0.0 && self.height >= 0.0
    }
}

/// Convert a screen-space rectangle into anchor space.
///
/// Subtracts the page origin, then divides by the scale factor. The
/// caller guarantees `scale > 0`; a non-positive scale is a contract
/// violation, not a handled condition.
#[must_use]
pub fn to_anchor_space(screen: ScreenRect, page_origin: ScreenPoint, scale: f32) -> AnchorRect {
    debug_assert!(scale > 0.0, "scale must be positive, got {scale}");
    AnchorRect {
        x: (screen.x - page_origin.x) / scale,
        y: (screen.y - page_origin.y) / scale,
        width: screen.width / scale,
        height: screen.height / scale,
    }
}

/// Convert an anchor-space rectangle back into current screen space.
///
/// Inverse of [`to_anchor_space`]: multiplies by the scale factor, then
/// adds the page origin.
#[must_use]
pub fn to_screen_space(anchor: AnchorRect, page_origin: ScreenPoint, scale: f32) -> ScreenRect {
    debug_assert!(scale > 0.0, "scale must be positive, got {scale}");
    ScreenRect {
        x: anchor.x * scale + page_origin.x,
        y: anchor.y * scale + page_origin.y,
        width: anchor.width * scale,
        height: anchor.height * scale,
    }
}
