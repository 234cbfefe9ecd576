//! Narrow-Phase Collision Detection
//!
//! Exact overlap tests between shape pairs, dispatched on the
//! [`ShapeKind`](crate::shape::ShapeKind) pair through an exhaustive match.
//! Symmetric pairs share one handler invoked with swapped arguments and a
//! flipped contact axis.
//!
//! # Algorithms
//!
//! - **Box–box**: Separating Axis Theorem over the fixed 15-axis enumeration
//!   (3 face normals per box, 9 edge cross products). The first separating
//!   axis short-circuits the test; otherwise the axis of minimum overlap
//!   becomes the contact normal, with face axes preferred over edge axes at
//!   near-equal depth.
//! - **Capsule–capsule**: closest distance between core segments vs summed
//!   radii.
//! - **Box–capsule**: closest point between the capsule segment and the box,
//!   in box-local space.
//!
//! # Numerical Guards
//!
//! Near-parallel edge pairs produce near-zero cross products and are skipped
//! rather than normalized. Any non-finite intermediate reports "no
//! collision"; the result of a successful query is always a unit axis and a
//! strictly positive, finite depth.

use crate::math::{Mat3, Vec3, NORMALIZE_EPSILON};
use crate::shape::{BoxShape, CapsuleShape, Shape};

/// Multiplier handicapping edge-cross axes against face axes: an edge axis
/// replaces the current best only if it is better by this factor. Keeps
/// contact normals stable when face and edge depths are nearly equal.
const EDGE_BIAS: f32 = 1.001;

/// Squared length below which an edge cross product counts as degenerate.
const DEGENERATE_AXIS_EPSILON: f32 = 1.0e-8;

// ============================================================================
// Transform & Overlap
// ============================================================================

/// World placement of a shape: position plus cached rotation matrix.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    /// World position
    pub pos: Vec3,
    /// World rotation (columns are the rotated local axes)
    pub rot: Mat3,
}

impl Transform {
    /// Create a transform from parts.
    #[inline]
    pub const fn new(pos: Vec3, rot: Mat3) -> Self {
        Self { pos, rot }
    }
}

/// Result of a positive overlap query.
///
/// Transient: recomputed every query, no persistent identity. Moving shape 1
/// by `axis * depth` (or shape 0 by the negation) separates the pair.
#[derive(Clone, Copy, Debug)]
pub struct Overlap {
    /// Unit contact axis, pointing from shape 0 toward shape 1
    pub axis: Vec3,
    /// Penetration depth, strictly positive
    pub depth: f32,
}

impl Overlap {
    /// The same overlap seen from the other shape's side.
    #[inline]
    fn flipped(self) -> Self {
        Self {
            axis: -self.axis,
            depth: self.depth,
        }
    }

    /// Whether axis and depth are finite (positive depth is checked by the
    /// individual tests).
    #[inline]
    fn is_finite(&self) -> bool {
        self.axis.is_finite() && self.depth.is_finite()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Test two placed shapes for overlap.
///
/// Returns `None` when the shapes do not intersect; otherwise the unit
/// contact axis (shape 0 toward shape 1) and positive penetration depth.
pub fn overlaps(
    shape0: &Shape,
    tf0: &Transform,
    shape1: &Shape,
    tf1: &Transform,
) -> Option<Overlap> {
    let result = match (shape0, shape1) {
        (Shape::Box(a), Shape::Box(b)) => box_box(a, tf0, b, tf1),
        (Shape::Box(a), Shape::Capsule(c)) => box_capsule(a, tf0, c, tf1),
        (Shape::Capsule(c), Shape::Box(b)) => box_capsule(b, tf1, c, tf0).map(Overlap::flipped),
        (Shape::Capsule(a), Shape::Capsule(b)) => capsule_capsule(a, tf0, b, tf1),
    };
    // A degenerate query must read as "no collision", never as NaN state
    result.filter(|r| r.is_finite() && r.depth > 0.0)
}

// ============================================================================
// Box vs Box (SAT, 15 axes)
// ============================================================================

/// Overlap interval of two boxes projected onto a unit `axis`; negative
/// means separated.
#[inline]
fn projected_overlap(
    axis: Vec3,
    center_delta: Vec3,
    axes0: &[Vec3; 3],
    ext0: Vec3,
    axes1: &[Vec3; 3],
    ext1: Vec3,
) -> f32 {
    let r0 = ext0.x * axes0[0].dot(axis).abs()
        + ext0.y * axes0[1].dot(axis).abs()
        + ext0.z * axes0[2].dot(axis).abs();
    let r1 = ext1.x * axes1[0].dot(axis).abs()
        + ext1.y * axes1[1].dot(axis).abs()
        + ext1.z * axes1[2].dot(axis).abs();
    r0 + r1 - center_delta.dot(axis).abs()
}

fn box_box(b0: &BoxShape, tf0: &Transform, b1: &BoxShape, tf1: &Transform) -> Option<Overlap> {
    let axes0 = [tf0.rot.x, tf0.rot.y, tf0.rot.z];
    let axes1 = [tf1.rot.x, tf1.rot.y, tf1.rot.z];
    let delta = tf1.pos - tf0.pos;

    let mut best_depth = f32::INFINITY;
    let mut best_axis = Vec3::UNIT_X;

    // Face normals of box 0, then box 1. Tested first: at near-equal depth
    // the earliest axis wins, so A faces beat B faces beat edge crosses.
    for axes in [&axes0, &axes1] {
        for i in 0..3 {
            let axis = axes[i];
            let depth = projected_overlap(axis, delta, &axes0, b0.ext, &axes1, b1.ext);
            if depth < 0.0 {
                return None;
            }
            if depth < best_depth {
                best_depth = depth;
                best_axis = axis;
            }
        }
    }

    // Edge cross products, 9 fixed combinations.
    for i in 0..3 {
        for j in 0..3 {
            let cross = axes0[i].cross(axes1[j]);
            let len_sq = cross.length_squared();
            if len_sq < DEGENERATE_AXIS_EPSILON {
                // Near-parallel edges: skip instead of normalizing by ~0
                continue;
            }
            let axis = cross / len_sq.sqrt();
            let depth = projected_overlap(axis, delta, &axes0, b0.ext, &axes1, b1.ext);
            if depth < 0.0 {
                return None;
            }
            if depth * EDGE_BIAS < best_depth {
                best_depth = depth;
                best_axis = axis;
            }
        }
    }

    // Orient the axis from box 0 toward box 1
    if delta.dot(best_axis) < 0.0 {
        best_axis = -best_axis;
    }
    Some(Overlap {
        axis: best_axis,
        depth: best_depth,
    })
}

// ============================================================================
// Capsule vs Capsule
// ============================================================================

/// Closest points between segments `a0..a1` and `b0..b1`.
fn closest_points_segments(a0: Vec3, a1: Vec3, b0: Vec3, b1: Vec3) -> (Vec3, Vec3) {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let r = a0 - b0;
    let len1 = d1.length_squared();
    let len2 = d2.length_squared();
    let f = d2.dot(r);

    let (mut s, mut t);
    if len1 < NORMALIZE_EPSILON && len2 < NORMALIZE_EPSILON {
        return (a0, b0);
    }
    if len1 < NORMALIZE_EPSILON {
        s = 0.0;
        t = (f / len2).clamp(0.0, 1.0);
    } else {
        let c = d1.dot(r);
        if len2 < NORMALIZE_EPSILON {
            t = 0.0;
            s = (-c / len1).clamp(0.0, 1.0);
        } else {
            let b = d1.dot(d2);
            let denom = len1 * len2 - b * b;
            s = if denom > NORMALIZE_EPSILON {
                ((b * f - c * len2) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            t = (b * s + f) / len2;
            if t < 0.0 {
                t = 0.0;
                s = (-c / len1).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / len1).clamp(0.0, 1.0);
            }
        }
    }
    (a0 + d1 * s, b0 + d2 * t)
}

fn capsule_capsule(
    c0: &CapsuleShape,
    tf0: &Transform,
    c1: &CapsuleShape,
    tf1: &Transform,
) -> Option<Overlap> {
    let axis0 = tf0.rot.z * c0.half_height;
    let axis1 = tf1.rot.z * c1.half_height;

    let (p, q) = closest_points_segments(
        tf0.pos - axis0,
        tf0.pos + axis0,
        tf1.pos - axis1,
        tf1.pos + axis1,
    );

    let sum_r = c0.radius + c1.radius;
    let diff = q - p;
    let dist_sq = diff.length_squared();
    if dist_sq >= sum_r * sum_r {
        return None;
    }

    // Axis from capsule 0 toward capsule 1; when the core segments touch,
    // fall back to the center offset
    let axis = diff
        .try_normalize()
        .or_else(|| (tf1.pos - tf0.pos).try_normalize())?;
    Some(Overlap {
        axis,
        depth: sum_r - dist_sq.sqrt(),
    })
}

// ============================================================================
// Box vs Capsule
// ============================================================================

/// Clamp a box-local point onto the box surface/volume.
#[inline]
fn clamp_to_box(p: Vec3, ext: Vec3) -> Vec3 {
    Vec3::new(
        p.x.clamp(-ext.x, ext.x),
        p.y.clamp(-ext.y, ext.y),
        p.z.clamp(-ext.z, ext.z),
    )
}

fn box_capsule(
    b: &BoxShape,
    tf_box: &Transform,
    c: &CapsuleShape,
    tf_cap: &Transform,
) -> Option<Overlap> {
    // Capsule core segment expressed in box-local space
    let inv = tf_box.rot.transposed();
    let cap_axis = tf_cap.rot.z * c.half_height;
    let a = inv * (tf_cap.pos - cap_axis - tf_box.pos);
    let d = inv * (cap_axis * 2.0);

    // Closest segment point to the box: alternate clamping to the box and
    // projecting back onto the segment. Fixed iteration count keeps the
    // query deterministic; convergence is fast for convex targets.
    let seg_len_sq = d.length_squared();
    let mut t = 0.5;
    if seg_len_sq < NORMALIZE_EPSILON {
        t = 0.0;
    } else {
        for _ in 0..8 {
            let p = a + d * t;
            let q = clamp_to_box(p, b.ext);
            t = ((q - a).dot(d) / seg_len_sq).clamp(0.0, 1.0);
        }
    }
    let p = a + d * t;
    let q = clamp_to_box(p, b.ext);
    let delta = p - q;
    let dist_sq = delta.length_squared();

    if dist_sq > NORMALIZE_EPSILON {
        // Segment outside the box volume
        let dist = dist_sq.sqrt();
        if dist >= c.radius {
            return None;
        }
        let axis_local = delta / dist;
        Some(Overlap {
            axis: tf_box.rot * axis_local,
            depth: c.radius - dist,
        })
    } else {
        // Segment point inside the box: exit through the nearest face
        let dx = b.ext.x - p.x.abs();
        let dy = b.ext.y - p.y.abs();
        let dz = b.ext.z - p.z.abs();
        let (face_depth, axis_local) = if dx <= dy && dx <= dz {
            (dx, Vec3::UNIT_X * p.x.signum())
        } else if dy <= dz {
            (dy, Vec3::UNIT_Y * p.y.signum())
        } else {
            (dz, Vec3::UNIT_Z * p.z.signum())
        };
        Some(Overlap {
            axis: tf_box.rot * axis_local,
            depth: c.radius + face_depth,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    const EPS: f32 = 1.0e-4;

    fn ident(pos: Vec3) -> Transform {
        Transform::new(pos, Mat3::IDENTITY)
    }

    fn rotated(pos: Vec3, axis: Vec3, angle: f32) -> Transform {
        Transform::new(pos, Mat3::from_quat(Quat::from_axis_angle(axis, angle)))
    }

    #[test]
    fn test_box_box_separated_single_axis() {
        let a = Shape::new_box(Vec3::ONE);
        let b = Shape::new_box(Vec3::ONE);
        // Separated by more than the summed half-extents on X
        let r = overlaps(&a, &ident(Vec3::ZERO), &b, &ident(Vec3::new(2.5, 0.0, 0.0)));
        assert!(r.is_none());
    }

    #[test]
    fn test_box_box_reference_scenario() {
        // Unit boxes at origin and (1.5, 0, 0): overlap on X, depth 0.5,
        // axis is box A's face normal oriented toward B
        let a = Shape::new_box(Vec3::ONE);
        let b = Shape::new_box(Vec3::ONE);
        let r = overlaps(&a, &ident(Vec3::ZERO), &b, &ident(Vec3::new(1.5, 0.0, 0.0)))
            .expect("boxes overlap");

        assert!((r.depth - 0.5).abs() < EPS, "depth {}", r.depth);
        assert!((r.axis - Vec3::UNIT_X).length() < EPS, "axis {:?}", r.axis);
    }

    #[test]
    fn test_box_box_axis_points_toward_shape1() {
        let a = Shape::new_box(Vec3::ONE);
        let b = Shape::new_box(Vec3::ONE);
        // B on the negative X side: axis flips
        let r = overlaps(
            &a,
            &ident(Vec3::ZERO),
            &b,
            &ident(Vec3::new(-1.5, 0.0, 0.0)),
        )
        .unwrap();
        assert!((r.axis - -Vec3::UNIT_X).length() < EPS);
    }

    #[test]
    fn test_box_box_min_axis_selected() {
        let a = Shape::new_box(Vec3::ONE);
        let b = Shape::new_box(Vec3::ONE);
        // Offset on X and Y, deeper on X: the Y face has the smaller overlap
        let r = overlaps(&a, &ident(Vec3::ZERO), &b, &ident(Vec3::new(0.5, 1.8, 0.0)))
            .unwrap();
        assert!((r.axis - Vec3::UNIT_Y).length() < EPS);
        assert!((r.depth - 0.2).abs() < EPS);
    }

    #[test]
    fn test_box_box_correction_separates() {
        // Moving B along the axis by the reported depth must clear the
        // overlap (idempotence modulo margin)
        let a = Shape::new_box(Vec3::ONE);
        let b = Shape::new_box(Vec3::new(0.8, 1.2, 1.0));
        let tf_a = rotated(Vec3::ZERO, Vec3::UNIT_Z, 0.4);
        let mut pos_b = Vec3::new(1.2, 0.6, 0.3);

        let r = overlaps(&a, &tf_a, &b, &ident(pos_b)).expect("initial overlap");
        pos_b += r.axis * (r.depth + 1.0e-3);

        assert!(overlaps(&a, &tf_a, &b, &ident(pos_b)).is_none());
    }

    #[test]
    fn test_box_box_rotated_edge_case() {
        // 45-degree box corner pressed into an axis-aligned box: the SAT
        // still reports a positive depth and a unit axis
        let a = Shape::new_box(Vec3::ONE);
        let b = Shape::new_box(Vec3::ONE);
        let tf_b = rotated(
            Vec3::new(2.2, 0.0, 0.0),
            Vec3::UNIT_Z,
            core::f32::consts::FRAC_PI_4,
        );
        let r = overlaps(&a, &ident(Vec3::ZERO), &b, &tf_b).expect("corner contact");
        assert!(r.depth > 0.0);
        assert!((r.axis.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_box_box_face_bias_over_edge() {
        // Aligned boxes degenerate the parallel edge crosses; they must be
        // skipped and the result must still be a face axis
        let a = Shape::new_box(Vec3::ONE);
        let b = Shape::new_box(Vec3::ONE);
        let r = overlaps(
            &a,
            &ident(Vec3::ZERO),
            &b,
            &ident(Vec3::new(1.9, 0.05, 0.0)),
        )
        .unwrap();
        assert!((r.axis - Vec3::UNIT_X).length() < EPS);
    }

    #[test]
    fn test_capsule_capsule_crossed() {
        // Perpendicular capsules, cores 0.8 apart on Y at closest approach
        let a = Shape::new_capsule(2.0, 0.5);
        let b = Shape::new_capsule(2.0, 0.5);
        let tf_b = rotated(
            Vec3::new(0.0, 0.8, 0.0),
            Vec3::UNIT_Y,
            core::f32::consts::FRAC_PI_2,
        );
        let r = overlaps(&a, &ident(Vec3::ZERO), &b, &tf_b).expect("crossed capsules");
        assert!((r.depth - 0.2).abs() < EPS);
        assert!((r.axis - Vec3::UNIT_Y).length() < EPS);
    }

    #[test]
    fn test_capsule_capsule_separated() {
        let a = Shape::new_capsule(1.0, 0.5);
        let b = Shape::new_capsule(1.0, 0.5);
        let r = overlaps(&a, &ident(Vec3::ZERO), &b, &ident(Vec3::new(1.1, 0.0, 0.0)));
        assert!(r.is_none());
    }

    #[test]
    fn test_capsule_capsule_coincident_segments_no_nan() {
        // Fully coincident cores: the guarded normalize falls back to the
        // center offset, and identical centers yield "no collision"
        let a = Shape::new_capsule(1.0, 0.5);
        let b = Shape::new_capsule(1.0, 0.5);
        let r = overlaps(&a, &ident(Vec3::ZERO), &b, &ident(Vec3::ZERO));
        if let Some(r) = r {
            assert!(r.axis.is_finite());
            assert!(r.depth.is_finite());
        }
    }

    #[test]
    fn test_box_capsule_side_contact() {
        let b = Shape::new_box(Vec3::ONE);
        // Vertical capsule grazing the +X face of the box
        let c = Shape::new_capsule(1.0, 0.5);
        let r = overlaps(&b, &ident(Vec3::ZERO), &c, &ident(Vec3::new(1.3, 0.0, 0.0)))
            .expect("capsule touches face");
        assert!((r.depth - 0.2).abs() < EPS);
        assert!((r.axis - Vec3::UNIT_X).length() < EPS);
    }

    #[test]
    fn test_box_capsule_separated() {
        let b = Shape::new_box(Vec3::ONE);
        let c = Shape::new_capsule(1.0, 0.5);
        let r = overlaps(&b, &ident(Vec3::ZERO), &c, &ident(Vec3::new(1.6, 0.0, 0.0)));
        assert!(r.is_none());
    }

    #[test]
    fn test_capsule_box_swapped_axis_flips() {
        let b = Shape::new_box(Vec3::ONE);
        let c = Shape::new_capsule(1.0, 0.5);
        let tf_box = ident(Vec3::ZERO);
        let tf_cap = ident(Vec3::new(1.3, 0.0, 0.0));

        let bc = overlaps(&b, &tf_box, &c, &tf_cap).unwrap();
        let cb = overlaps(&c, &tf_cap, &b, &tf_box).unwrap();
        assert!((bc.axis + cb.axis).length() < EPS);
        assert!((bc.depth - cb.depth).abs() < EPS);
    }

    #[test]
    fn test_overlap_never_non_finite() {
        // Pathological transform: zero rotation columns would break the
        // projections; the dispatcher must filter any non-finite result
        let a = Shape::new_box(Vec3::ONE);
        let b = Shape::new_box(Vec3::ONE);
        let broken = Transform::new(
            Vec3::new(f32::NAN, 0.0, 0.0),
            Mat3::IDENTITY,
        );
        let r = overlaps(&a, &broken, &b, &ident(Vec3::ZERO));
        assert!(r.is_none());
    }
}
