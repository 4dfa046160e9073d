//! # Geometry
//!
//! Axis-aligned rectangles in world pixels.
//!
//! All tests are half-open: a rectangle at `x` with width `w` covers
//! `x..x + w`, so two rectangles that only touch do not intersect.

/// An axis-aligned rectangle (origin at the top-left corner).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns true if the point lies inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns true if the two rectangles overlap.
    #[inline]
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Returns true if `other` spans this rectangle's full horizontal extent.
    #[inline]
    #[must_use]
    pub const fn spans_horizontally(&self, other: &Self) -> bool {
        other.x <= self.x && other.right() >= self.right()
    }
}
