//! Axis-aligned rectangles in image coordinates.

use serde::{Deserialize, Serialize};

/// Integer bounding box `(x, y, width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from inclusive-exclusive corner coordinates.
    pub fn from_corners(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Integer center, rounded toward the origin.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Smallest rectangle enclosing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// True when the interiors overlap after growing both by `padding`.
    pub fn overlaps_padded(&self, other: &Rect, padding: u32) -> bool {
        let (ax0, ay0) = (self.x.saturating_sub(padding), self.y.saturating_sub(padding));
        let (ax1, ay1) = (self.right() + padding, self.bottom() + padding);
        let (bx0, by0) = (other.x.saturating_sub(padding), other.y.saturating_sub(padding));
        let (bx1, by1) = (other.right() + padding, other.bottom() + padding);

        ax0 < bx1 && bx0 < ax1 && ay0 < by1 && by0 < ay1
    }

    /// Euclidean distance between integer centers.
    pub fn center_distance(&self, other: &Rect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        let dx = ax as f64 - bx as f64;
        let dy = ay as f64 - by as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// True when the rectangle lies inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0 && self.right() <= width && self.bottom() <= height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_and_center() {
        let r = Rect::new(10, 20, 40, 30);
        assert_eq!(r.right(), 50);
        assert_eq!(r.bottom(), 50);
        assert_eq!(r.center(), (30, 35));
        assert_eq!(r.area(), 1200);
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 5, 10, 10);
        assert_eq!(a.union(&b), Rect::new(0, 0, 30, 15));
    }

    #[test]
    fn test_overlaps_padded() {
        let a = Rect::new(0, 0, 10, 10);
        let touching = Rect::new(10, 0, 10, 10);
        let one_gap = Rect::new(11, 0, 10, 10);
        let two_gap = Rect::new(12, 0, 10, 10);

        assert!(!a.overlaps_padded(&touching, 0));
        assert!(a.overlaps_padded(&one_gap, 1));
        assert!(!a.overlaps_padded(&two_gap, 1));
    }

    #[test]
    fn test_fits_within() {
        assert!(Rect::new(0, 0, 8, 8).fits_within(8, 8));
        assert!(!Rect::new(1, 0, 8, 8).fits_within(8, 8));
        assert!(!Rect::new(0, 0, 0, 8).fits_within(8, 8));
    }

    #[test]
    fn test_serialized_shape() {
        insta::assert_json_snapshot!(Rect::new(2, 4, 28, 30), @r###"
        {
          "x": 2,
          "y": 4,
          "width": 28,
          "height": 30
        }
        "###);
    }
}
