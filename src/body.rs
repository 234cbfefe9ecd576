//! Rigid Bodies and the Body Arena
//!
//! A [`Body`] is a positioned, oriented instance of a shared [`Shape`] in
//! world space, plus the dynamic state the tick driver integrates. Bodies
//! live in a generational [`BodyArena`]; a [`BodyId`] handle stays cheap to
//! copy and goes stale (instead of dangling) when the slot is reused.
//!
//! # Cache Refresh Contract
//!
//! Position and rotation mutation never refreshes the cached rotation matrix
//! or world bounds. Callers mutate freely, then call [`Body::update_rotation`]
//! after any orientation change and [`Body::update_bounds`] before the next
//! spatial query. This avoids redundant recomputation when several attributes
//! change between two queries; the tick driver re-validates every dynamic
//! body once per tick.

use crate::bounds::Bounds;
use crate::filter::CollisionFilter;
use crate::math::{Mat3, Quat, Vec3};
use crate::shape::{Shape, ShapeRef};
use crate::space::CellRange;

/// Status bit: the body never moves and has infinite mass.
pub const STATIC_BIT: u32 = 1 << 0;
/// Status bit: the body is excluded from simulation entirely.
pub const DISABLED_BIT: u32 = 1 << 1;

// ============================================================================
// BodyId
// ============================================================================

/// Generational handle to a body slot in a [`BodyArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId {
    /// Slot index
    pub index: u32,
    /// Slot generation at the time the handle was issued
    pub generation: u32,
}

// ============================================================================
// Body
// ============================================================================

/// A rigid, collidable entity.
#[derive(Clone, Debug)]
pub struct Body {
    /// World position
    pub pos: Vec3,
    /// World orientation (authoritative)
    pub rot: Quat,
    /// Cached rotation matrix of `rot` (refresh via [`Body::update_rotation`])
    pub rot_mat: Mat3,
    /// Cached world bounds (refresh via [`Body::update_bounds`])
    pub bb: Bounds,
    /// Shared collision geometry, if any
    pub shape: Option<ShapeRef>,
    /// Collision layer filter
    pub filter: CollisionFilter,
    /// Status bits (`STATIC_BIT`, `DISABLED_BIT`)
    pub flags: u32,
    /// Linear velocity
    pub velocity: Vec3,
    /// Inverse mass (0 = static/infinite mass)
    pub inv_mass: f32,
    /// Coefficient of restitution in [0, 1]
    pub elasticity: f32,
    /// Tick stamp for broad-phase query deduplication
    pub(crate) stamp: u64,
    /// Cell range recorded at the last grid insert; removal must use this,
    /// never a range recomputed from possibly stale bounds
    pub(crate) grid_range: Option<CellRange>,
}

impl Body {
    /// Create a dynamic body of the given mass at `pos`, with no shape.
    pub fn new(pos: Vec3, mass: f32) -> Self {
        let inv_mass = if mass <= 0.0 { 0.0 } else { 1.0 / mass };
        Self {
            pos,
            rot: Quat::IDENTITY,
            rot_mat: Mat3::IDENTITY,
            bb: Bounds::from_center_dim(pos, Vec3::ZERO),
            shape: None,
            filter: CollisionFilter::DEFAULT,
            flags: 0,
            velocity: Vec3::ZERO,
            inv_mass,
            elasticity: 0.5,
            stamp: 0,
            grid_range: None,
        }
    }

    /// Create a static (immovable, infinite-mass) body at `pos`.
    pub fn new_static(pos: Vec3) -> Self {
        let mut body = Self::new(pos, 0.0);
        body.flags |= STATIC_BIT;
        body.elasticity = 0.0;
        body
    }

    /// Attach a shape (builder style).
    #[must_use]
    pub fn with_shape(mut self, shape: ShapeRef) -> Self {
        self.set_shape(Some(shape));
        self
    }

    /// Set the collision filter (builder style).
    #[must_use]
    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the coefficient of restitution (builder style).
    #[must_use]
    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    /// Replace the referenced shape. The old shape's reference is released;
    /// it is destroyed when the last body referencing it drops its handle.
    pub fn set_shape(&mut self, shape: Option<ShapeRef>) {
        self.shape = shape;
        if self.shape.is_some() {
            self.update_bounds();
        }
    }

    /// Shorthand for the attached shape, if any.
    #[inline]
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_deref()
    }

    /// Recompute the cached rotation matrix from the quaternion. Must be
    /// called after any change to `rot` and before bounds or narrow-phase
    /// queries depend on it.
    #[inline]
    pub fn update_rotation(&mut self) {
        self.rot_mat = Mat3::from_quat(self.rot);
    }

    /// Recompute the cached world bounds from shape, position and rotation
    /// matrix. A shape must be attached.
    pub fn update_bounds(&mut self) {
        debug_assert!(self.shape.is_some(), "update_bounds on body without shape");
        if let Some(shape) = self.shape.as_deref() {
            self.bb = shape.bounds(self.pos, &self.rot_mat);
        }
    }

    /// Cached world bounds. A shape must be attached; in release builds a
    /// body without a shape reports its last cached value.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        debug_assert!(self.shape.is_some(), "bounds queried on body without shape");
        self.bb
    }

    /// Whether this body has the static flag or infinite mass.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags & STATIC_BIT != 0 || self.inv_mass == 0.0
    }

    /// Whether this body participates in simulation.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.flags & DISABLED_BIT == 0
    }
}

// ============================================================================
// BodyArena
// ============================================================================

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Generational slot arena owning all bodies in a world.
///
/// Replaces intrusive sibling pointers with indexed handles: O(1) insert,
/// removal and lookup, and a stale [`BodyId`] resolves to `None` rather than
/// to whatever body reused the slot.
#[derive(Clone, Debug, Default)]
pub struct BodyArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodyArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no live bodies.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a body, returning its handle.
    pub fn insert(&mut self, body: Body) -> BodyId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            BodyId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                body: Some(body),
            });
            BodyId {
                index,
                generation: 0,
            }
        }
    }

    /// Remove a body, invalidating all copies of its handle.
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation || slot.body.is_none() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        slot.body.take()
    }

    /// Resolve a handle to a body.
    #[inline]
    pub fn get(&self, id: BodyId) -> Option<&Body> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.body.as_ref()
    }

    /// Resolve a handle to a mutable body.
    #[inline]
    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.body.as_mut()
    }

    /// Fetch two distinct bodies mutably.
    ///
    /// Returns `None` if either handle is stale or both refer to the same
    /// slot.
    pub fn get_pair_mut(&mut self, a: BodyId, b: BodyId) -> Option<(&mut Body, &mut Body)> {
        if a.index == b.index {
            return None;
        }
        let (ai, bi) = (a.index as usize, b.index as usize);
        if ai >= self.slots.len() || bi >= self.slots.len() {
            return None;
        }
        let (lo, hi) = if ai < bi { (ai, bi) } else { (bi, ai) };
        let (first, second) = self.slots.split_at_mut(hi);
        let slot_lo = &mut first[lo];
        let slot_hi = &mut second[0];
        let (slot_a, slot_b) = if ai < bi {
            (slot_lo, slot_hi)
        } else {
            (slot_hi, slot_lo)
        };
        if slot_a.generation != a.generation || slot_b.generation != b.generation {
            return None;
        }
        Some((slot_a.body.as_mut()?, slot_b.body.as_mut()?))
    }

    /// Iterate over live bodies with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.body.as_ref().map(|body| {
                (
                    BodyId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    body,
                )
            })
        })
    }

    /// Handles of all live bodies.
    pub fn ids(&self) -> Vec<BodyId> {
        self.iter().map(|(id, _)| id).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_new_dynamic() {
        let body = Body::new(Vec3::new(1.0, 2.0, 3.0), 2.0);
        assert_eq!(body.inv_mass, 0.5);
        assert!(!body.is_static());
        assert!(body.is_enabled());
    }

    #[test]
    fn test_body_new_static() {
        let body = Body::new_static(Vec3::ZERO);
        assert!(body.is_static());
        assert_eq!(body.inv_mass, 0.0);
    }

    #[test]
    fn test_manual_refresh_policy() {
        let mut body = Body::new(Vec3::ZERO, 1.0).with_shape(Shape::new_box(Vec3::ONE));
        let before = body.bounds();

        // Moving the body does not touch the cached bounds...
        body.pos = Vec3::new(10.0, 0.0, 0.0);
        assert_eq!(body.bounds(), before);

        // ...until the caller refreshes them.
        body.update_bounds();
        assert!(body.bounds().contains_point(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_update_rotation_refreshes_matrix() {
        let mut body = Body::new(Vec3::ZERO, 1.0).with_shape(Shape::new_box(Vec3::ONE));
        body.rot = Quat::from_axis_angle(Vec3::UNIT_Z, core::f32::consts::FRAC_PI_4);
        assert_eq!(body.rot_mat, Mat3::IDENTITY);

        body.update_rotation();
        body.update_bounds();
        // Rotated unit cube must now reach past 1.0 on X
        assert!(body.bounds().max.x > 1.2);
    }

    #[test]
    fn test_set_shape_swaps_reference() {
        let first = Shape::new_box(Vec3::ONE);
        let second = Shape::new_box(Vec3::splat(2.0));
        let mut body = Body::new(Vec3::ZERO, 1.0).with_shape(std::sync::Arc::clone(&first));
        assert_eq!(std::sync::Arc::strong_count(&first), 2);

        body.set_shape(Some(std::sync::Arc::clone(&second)));
        // Old shape reference released
        assert_eq!(std::sync::Arc::strong_count(&first), 1);
        assert_eq!(std::sync::Arc::strong_count(&second), 2);
    }

    #[test]
    #[should_panic(expected = "update_bounds on body without shape")]
    #[cfg(debug_assertions)]
    fn test_update_bounds_without_shape_asserts() {
        let mut body = Body::new(Vec3::ZERO, 1.0);
        body.update_bounds();
    }

    #[test]
    fn test_arena_insert_get_remove() {
        let mut arena = BodyArena::new();
        let id = arena.insert(Body::new(Vec3::ZERO, 1.0));
        assert_eq!(arena.len(), 1);
        assert!(arena.get(id).is_some());

        let removed = arena.remove(id);
        assert!(removed.is_some());
        assert!(arena.get(id).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_arena_stale_handle() {
        let mut arena = BodyArena::new();
        let id = arena.insert(Body::new(Vec3::ZERO, 1.0));
        arena.remove(id);

        // Slot reused by a new body; the old handle must not resolve to it
        let id2 = arena.insert(Body::new(Vec3::UNIT_X, 1.0));
        assert_eq!(id.index, id2.index);
        assert!(arena.get(id).is_none());
        assert!(arena.get(id2).is_some());
        assert!(arena.remove(id).is_none());
    }

    #[test]
    fn test_arena_pair_access() {
        let mut arena = BodyArena::new();
        let a = arena.insert(Body::new(Vec3::ZERO, 1.0));
        let b = arena.insert(Body::new(Vec3::UNIT_X, 1.0));

        let (body_a, body_b) = arena.get_pair_mut(a, b).unwrap();
        body_a.velocity = Vec3::UNIT_X;
        body_b.velocity = -Vec3::UNIT_X;

        assert_eq!(arena.get(a).unwrap().velocity, Vec3::UNIT_X);
        assert!(arena.get_pair_mut(a, a).is_none());
    }

    #[test]
    fn test_arena_iter() {
        let mut arena = BodyArena::new();
        let a = arena.insert(Body::new(Vec3::ZERO, 1.0));
        let _b = arena.insert(Body::new(Vec3::UNIT_X, 1.0));
        arena.remove(a);

        let ids = arena.ids();
        assert_eq!(ids.len(), 1);
    }
}
