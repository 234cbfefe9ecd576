//! Collision Shapes
//!
//! Immutable collision-geometry primitives described in body-local space.
//! Shapes are shared: many bodies referencing the same geometry hold clones
//! of one `Arc<Shape>`, and the shape is freed when the last reference drops.
//!
//! # Dispatch
//!
//! Every shape exposes a [`ShapeKind`] discriminant. The narrow phase
//! dispatches on the kind pair through an exhaustive `match`, so adding a
//! shape variant forces handlers for every existing pair at compile time.

use std::sync::Arc;

use crate::bounds::Bounds;
use crate::math::{Mat3, Vec3};

/// Fixed inflation applied to every shape's world bounds, absorbing
/// floating-point and discretization error in the broad phase.
pub const MARGIN: f32 = 0.01;

/// Shared handle to an immutable shape.
pub type ShapeRef = Arc<Shape>;

/// Shape discriminant used for narrow-phase pair dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShapeKind {
    /// Oriented box
    Box = 0,
    /// Capsule (segment with radius, local Z axis)
    Capsule = 1,
}

/// Box geometry: half-extents along the local axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxShape {
    /// Half-extents (half-size on each local axis)
    pub ext: Vec3,
}

/// Capsule geometry: a segment along the local Z axis with a radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleShape {
    /// Half-length of the core segment
    pub half_height: f32,
    /// Capsule radius
    pub radius: f32,
}

/// Polymorphic collision shape, immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Oriented box
    Box(BoxShape),
    /// Capsule along the local Z axis
    Capsule(CapsuleShape),
}

impl Shape {
    /// Create a shared box shape from half-extents.
    pub fn new_box(ext: Vec3) -> ShapeRef {
        Arc::new(Shape::Box(BoxShape { ext }))
    }

    /// Create a shared capsule shape.
    pub fn new_capsule(half_height: f32, radius: f32) -> ShapeRef {
        Arc::new(Shape::Capsule(CapsuleShape {
            half_height,
            radius,
        }))
    }

    /// Discriminant tag for pair dispatch.
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Box(_) => ShapeKind::Box,
            Shape::Capsule(_) => ShapeKind::Capsule,
        }
    }

    /// World-space bounds of the shape at `pos` with rotation `rot`,
    /// inflated by [`MARGIN`].
    ///
    /// For a box the half-dimension on world axis `i` is the sum of the
    /// local half-extents projected through the absolute rotation:
    /// `dim[i] = ext.x*|rot.x[i]| + ext.y*|rot.y[i]| + ext.z*|rot.z[i]|`.
    /// Under identity rotation this degenerates to `ext + MARGIN` exactly.
    pub fn bounds(&self, pos: Vec3, rot: &Mat3) -> Bounds {
        let dim = match *self {
            Shape::Box(BoxShape { ext }) => {
                rot.x.abs() * ext.x + rot.y.abs() * ext.y + rot.z.abs() * ext.z
            }
            Shape::Capsule(CapsuleShape {
                half_height,
                radius,
            }) => (rot.z * half_height).abs() + Vec3::splat(radius),
        };
        Bounds::from_center_dim(pos, dim + Vec3::splat(MARGIN))
    }

}

// ============================================================================
// Tests
// ============================================================================
