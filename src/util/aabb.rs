use serde::{Deserialize, Serialize};

use crate::util::vec2::Vec2;

/// Axis-aligned bounding box in arena space (y grows upward, so `bottom < top`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Aabb {
    #[inline]
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Box anchored at its bottom-left corner
    #[inline]
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            left: origin.x,
            bottom: origin.y,
            right: origin.x + size.x,
            top: origin.y + size.y,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Strict overlap on both axes. Boxes that only share an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let horizontal = self.left < other.right && self.right > other.left;
        let vertical = self.bottom < other.top && self.top > other.bottom;
        horizontal && vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_boxes() {
        let a = Aabb::new(10.0, 0.0, 70.0, 50.0);
        let b = Aabb::new(40.0, 0.0, 100.0, 50.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_separated_boxes() {
        let a = Aabb::new(0.0, 0.0, 50.0, 50.0);
        let b = Aabb::new(60.0, 0.0, 110.0, 50.0);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Aabb::new(0.0, 0.0, 50.0, 50.0);
        let right = Aabb::new(50.0, 0.0, 100.0, 50.0);
        let above = Aabb::new(0.0, 50.0, 50.0, 100.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&above));
    }

    #[test]
    fn test_vertical_separation() {
        // Character jumped clear over the obstacle
        let character = Aabb::new(40.0, 61.0, 100.0, 121.0);
        let obstacle = Aabb::new(50.0, 0.0, 110.0, 60.0);
        assert!(!character.overlaps(&obstacle));
    }

    #[test]
    fn test_from_origin_size() {
        let b = Aabb::from_origin_size(Vec2::new(10.0, 5.0), Vec2::new(60.0, 40.0));
        assert_eq!(b, Aabb::new(10.0, 5.0, 70.0, 45.0));
        assert_eq!(b.width(), 60.0);
        assert_eq!(b.height(), 40.0);
    }
}
