//! Basic geometry types.
//!
//! Coordinates are CSS pixels as reported by the host document, so all
//! values are `f64`.

use serde::{Deserialize, Serialize};

/// A point (or offset) in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin point (0, 0).
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Whether both coordinates are zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A size in 2D space (width and height).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero size.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Check if the size has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl From<(f64, f64)> for Size {
    fn from((width, height): (f64, f64)) -> Self {
        Self { width, height }
    }
}

/// A rectangle defined by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    /// Create a new rectangle from origin and size.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    /// Empty rectangle at origin.
    pub const ZERO: Self = Self {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    /// Left edge x coordinate.
    #[inline]
    pub fn left(&self) -> f64 {
        self.origin.x
    }

    /// Top edge y coordinate.
    #[inline]
    pub fn top(&self) -> f64 {
        self.origin.y
    }

    /// Right edge x coordinate.
    #[inline]
    pub fn right(&self) -> f64 {
        self.origin.x + self.size.width
    }

    /// Bottom edge y coordinate.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Width of the rectangle.
    #[inline]
    pub fn width(&self) -> f64 {
        self.size.width
    }

    /// Height of the rectangle.
    #[inline]
    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// Check if the rectangle is empty (zero or negative size).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.top() >= self.top()
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Offset the rectangle by the given amount.
    #[inline]
    pub fn offset(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            origin: Point {
                x: self.origin.x + dx,
                y: self.origin.y + dy,
            },
            size: self.size,
        }
    }
}
