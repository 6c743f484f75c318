//! Geometric primitives in global compositor space.
//!
//! All coordinates are logical pixels. Sizes are signed so that intermediate
//! arithmetic (margins, reserved bands) cannot wrap; constructors clamp
//! negative extents to zero.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    /// Squared Euclidean distance to another point.
    pub fn distance_squared(&self, other: &Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// A 2D extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size::new(0, 0);

    pub const fn new(width: i32, height: i32) -> Self {
        Size { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Grows the size by `dw`/`dh`, never below zero.
    pub fn grow(&self, dw: i32, dh: i32) -> Size {
        Size::new((self.width + dw).max(0), (self.height + dh).max(0))
    }
}

/// An axis-aligned rectangle. Left/top edges are inclusive, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn from_parts(origin: Point, size: Size) -> Self {
        Rect { origin, size }
    }

    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            origin: Point::new(x, y),
            size: Size::new(width.max(0), height.max(0)),
        }
    }

    pub fn left(&self) -> i32 {
        self.origin.x
    }

    pub fn top(&self) -> i32 {
        self.origin.y
    }

    pub fn right(&self) -> i32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> i32 {
        self.origin.y + self.size.height
    }

    pub fn area(&self) -> i64 {
        self.size.width.max(0) as i64 * self.size.height.max(0) as i64
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2,
            self.origin.y + self.size.height / 2,
        )
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.left() && point.x < self.right() && point.y >= self.top() && point.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Returns the overlapping rectangle, or `None` when the two do not touch.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x1 = self.left().max(other.left());
        let y1 = self.top().max(other.top());
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
    }

    /// Squared distance from `point` to the closest point of this rectangle; zero if inside.
    pub fn distance_squared_to(&self, point: Point) -> i64 {
        let cx = point.x.clamp(self.left(), (self.right() - 1).max(self.left()));
        let cy = point.y.clamp(self.top(), (self.bottom() - 1).max(self.top()));
        point.distance_squared(&Point::new(cx, cy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_rect_new_clamps_negative_extent() {
        let r = Rect::new(10, 10, -5, 20);
        assert_eq!(r.size, Size::new(0, 20));
        assert!(r.size.is_empty());
    }

    #[test]
    fn test_rect_edges_and_contains() {
        let r = Rect::new(0, 0, 1920, 1080);
        assert_eq!((r.right(), r.bottom()), (1920, 1080));
        assert!(r.contains_point(Point::new(0, 0)));
        assert!(!r.contains_point(Point::new(1920, 5)));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 60, 100, 100);
        assert_eq!(a.intersection(&b), Some(Rect::new(50, 60, 50, 40)));
        assert_eq!(a.intersection(&Rect::new(200, 200, 10, 10)), None);
    }

    #[rstest]
    #[case::inside(Point::new(50, 50), 0)]
    #[case::right_of(Point::new(103, 50), 16)]
    #[case::corner(Point::new(-3, -4), 25)]
    fn test_distance_to_rect(#[case] point: Point, #[case] expected: i64) {
        let r = Rect::new(0, 0, 100, 100);
        assert_eq!(r.distance_squared_to(point), expected);
    }
}
