//! Axis-Aligned Bounding Boxes
//!
//! World-space AABBs used for broad-phase culling. Every collidable body
//! caches one, refreshed whenever its position or orientation changes, and
//! the cell grid maps it to a range of cells.

use crate::math::Vec3;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Bounds {
    /// Create a bounds from min and max corners.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a bounds from a center point and per-axis half-dimensions.
    #[inline]
    pub fn from_center_dim(center: Vec3, dim: Vec3) -> Self {
        Self {
            min: center - dim,
            max: center + dim,
        }
    }

    /// Create a cube bounds from a point and a radius.
    #[inline]
    pub fn from_point_radius(point: Vec3, radius: f32) -> Self {
        Self::from_center_dim(point, Vec3::splat(radius))
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Per-axis half-dimensions.
    #[inline]
    pub fn dim(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Whether this bounds intersects `other` (closed intervals).
    #[inline]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Whether `point` lies inside this bounds (closed intervals).
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

}

// ============================================================================
// Tests
// ============================================================================
