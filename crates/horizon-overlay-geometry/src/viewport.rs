//! Measured client rectangles and viewport containment.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Rect, Size};

/// The visible area of the host window, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Create a viewport of the given size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The viewport as a rectangle anchored at the origin.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Returns `true` if any edge of `rect` lies outside this viewport.
    ///
    /// An edge exactly on the viewport border counts as inside.
    #[inline]
    pub fn is_out_of_view(&self, rect: &Rect) -> bool {
        rect.bottom() > self.height || rect.top() < 0.0 || rect.left() < 0.0 || rect.right() > self.width
    }
}

impl From<Size> for Viewport {
    fn from(size: Size) -> Self {
        Self::new(size.width, size.height)
    }
}

/// A bounding client rectangle as measured by the host, together with the
/// window size and scroll offsets at measurement time.
///
/// Field names follow the host's camelCase JSON so measurements can be
/// deserialized directly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoundingRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub window_width: f64,
    pub window_height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl BoundingRect {
    /// Create a measurement from a rectangle and the viewport it was taken in.
    pub fn new(rect: Rect, viewport: Viewport) -> Self {
        Self {
            top: rect.top(),
            left: rect.left(),
            width: rect.width(),
            height: rect.height(),
            window_width: viewport.width,
            window_height: viewport.height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// Set the scroll offsets recorded with this measurement.
    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    /// Bottom edge in viewport coordinates.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Right edge in viewport coordinates.
    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Top edge in document coordinates.
    #[inline]
    pub fn absolute_top(&self) -> f64 {
        self.top + self.scroll_y
    }

    /// Left edge in document coordinates.
    #[inline]
    pub fn absolute_left(&self) -> f64 {
        self.left + self.scroll_x
    }

    /// The measured rectangle.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    /// The viewport this measurement was taken in.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.window_width, self.window_height)
    }

    /// The rectangle's bottom edge is below the window.
    #[inline]
    pub fn is_outside_bottom(&self) -> bool {
        self.bottom() > self.window_height
    }

    /// The rectangle's top edge is above the window.
    #[inline]
    pub fn is_outside_top(&self) -> bool {
        self.top < 0.0
    }

    /// The rectangle's left edge is left of the window.
    #[inline]
    pub fn is_outside_left(&self) -> bool {
        self.left < 0.0
    }

    /// The rectangle's right edge is right of the window.
    #[inline]
    pub fn is_outside_right(&self) -> bool {
        self.right() > self.window_width
    }

    /// Move the rectangle by an offset, keeping window and scroll data.
    #[inline]
    pub fn translate(&mut self, offset: Point) {
        self.left += offset.x;
        self.top += offset.y;
    }

    /// Copy of the rectangle moved by an offset.
    #[inline]
    pub fn translated(mut self, offset: Point) -> Self {
        self.translate(offset);
        self
    }
}

/// Returns `true` if `rect` is at least partly outside the window it was measured in.
pub fn is_out_of_view(rect: &BoundingRect) -> bool {
    rect.viewport().is_out_of_view(&rect.rect())
}
