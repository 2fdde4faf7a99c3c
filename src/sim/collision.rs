//! Collision detection for the runner
//!
//! Everything collides as axis-aligned boxes in world pixels (y grows down).
//! Overlap is strict: boxes that only share an edge do not touch.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    /// Square box around a circle
    pub fn around_circle(center: Vec2, radius: f32) -> Self {
        Self::new(center - Vec2::splat(radius), Vec2::splat(radius * 2.0))
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Shrink by `margin` on every side
    pub fn inset(&self, margin: f32) -> Self {
        Self::new(
            self.min + Vec2::splat(margin),
            (self.size - Vec2::splat(margin * 2.0)).max(Vec2::ZERO),
        )
    }

    /// Strict AABB overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && a_max.x > other.min.x && self.min.y < b_max.y && a_max.y > other.min.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_basic() {
        let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_xywh(5.0, 5.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let right = Rect::from_xywh(10.0, 0.0, 10.0, 10.0);
        let below = Rect::from_xywh(0.0, 10.0, 10.0, 10.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn test_inset() {
        let r = Rect::from_xywh(10.0, 20.0, 56.0, 48.0).inset(8.0);
        assert_eq!(r, Rect::from_xywh(18.0, 28.0, 40.0, 32.0));
        // Never inverts
        let tiny = Rect::from_xywh(0.0, 0.0, 4.0, 4.0).inset(8.0);
        assert_eq!(tiny.size, Vec2::ZERO);
    }

    #[test]
    fn test_around_circle() {
        let r = Rect::around_circle(Vec2::new(100.0, 50.0), 12.0);
        assert_eq!(r.min, Vec2::new(88.0, 38.0));
        assert_eq!(r.center(), Vec2::new(100.0, 50.0));
    }
}
