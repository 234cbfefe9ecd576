//! Collision Filtering (Flags/Mask System)
//!
//! Bitmask-based collision filtering for controlling which bodies can
//! interact. The broad phase rejects a pair unless both directions agree:
//! each side's `mask` must select at least one of the other side's `flags`.
//!
//! # Usage
//!
//! ```
//! use ozdyn::filter::{layers, CollisionFilter};
//!
//! let structure = CollisionFilter::new(layers::STRUCTURE, layers::ALL);
//! let debris = CollisionFilter::new(layers::DEBRIS, layers::STRUCTURE);
//! let ghost = CollisionFilter::new(layers::UNIT, 0); // collides with nothing
//!
//! assert!(CollisionFilter::can_collide(&structure, &debris));
//! assert!(!CollisionFilter::can_collide(&structure, &ghost));
//! ```

/// Collision filter using flags/mask bitmasks.
///
/// Two bodies are narrow-phase tested iff:
///   `(a.mask & b.flags) != 0 && (b.mask & a.flags) != 0`
///
/// This gives fine-grained bidirectional control: a body only meets
/// candidates it asked for and that asked for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CollisionFilter {
    /// Which collision layer(s) this body belongs to (bitmask)
    pub flags: u32,
    /// Which layers this body collides with (bitmask)
    pub mask: u32,
    /// Collision group ID (bodies in the same non-zero group never collide)
    pub group: u32,
}

impl CollisionFilter {
    /// Default filter: first layer, collides with everything.
    pub const DEFAULT: Self = Self {
        flags: 1,
        mask: u32::MAX,
        group: 0,
    };

    /// Filter that collides with nothing.
    pub const NONE: Self = Self {
        flags: 0,
        mask: 0,
        group: 0,
    };

    /// Create a new collision filter.
    #[inline]
    pub const fn new(flags: u32, mask: u32) -> Self {
        Self {
            flags,
            mask,
            group: 0,
        }
    }

    /// Attach a collision group.
    #[inline]
    pub const fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    /// Check whether two filters allow collision.
    #[inline]
    pub fn can_collide(a: &Self, b: &Self) -> bool {
        // Same non-zero group => never collide
        if a.group != 0 && a.group == b.group {
            return false;
        }
        // Symmetric bitmask agreement
        (a.mask & b.flags) != 0 && (b.mask & a.flags) != 0
    }
}

impl Default for CollisionFilter {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Predefined collision layers for the world model.
pub mod layers {
    /// Terrain and other immovable structure
    pub const STRUCTURE: u32 = 1 << 0;
    /// Mobile units
    pub const UNIT: u32 = 1 << 1;
    /// Projectiles
    pub const PROJECTILE: u32 = 1 << 2;
    /// Free-flying debris
    pub const DEBRIS: u32 = 1 << 3;
    /// Trigger volumes
    pub const TRIGGER: u32 = 1 << 4;
    /// All layers combined
    pub const ALL: u32 = u32::MAX;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let a = CollisionFilter::DEFAULT;
        let b = CollisionFilter::DEFAULT;
        assert!(CollisionFilter::can_collide(&a, &b));
    }

    #[test]
    fn test_none_filter() {
        let a = CollisionFilter::NONE;
        let b = CollisionFilter::DEFAULT;
        assert!(!CollisionFilter::can_collide(&a, &b));
    }

    #[test]
    fn test_symmetric_agreement_required() {
        // A wants to hit B, but B's mask excludes A
        let a = CollisionFilter::new(layers::UNIT, layers::PROJECTILE);
        let b = CollisionFilter::new(layers::PROJECTILE, 0);
        assert!(!CollisionFilter::can_collide(&a, &b));
        assert!(!CollisionFilter::can_collide(&b, &a));
    }

    #[test]
    fn test_layer_routing() {
        let unit = CollisionFilter::new(layers::UNIT, layers::STRUCTURE | layers::UNIT);
        let wall = CollisionFilter::new(layers::STRUCTURE, layers::ALL);
        let trigger = CollisionFilter::new(layers::TRIGGER, layers::UNIT);

        assert!(CollisionFilter::can_collide(&unit, &wall));
        // Unit's mask does not include TRIGGER
        assert!(!CollisionFilter::can_collide(&unit, &trigger));
    }

    #[test]
    fn test_collision_group() {
        let a = CollisionFilter::new(layers::ALL, layers::ALL).with_group(1);
        let b = CollisionFilter::new(layers::ALL, layers::ALL).with_group(1);
        let c = CollisionFilter::new(layers::ALL, layers::ALL).with_group(2);

        // Same group => no collision
        assert!(!CollisionFilter::can_collide(&a, &b));
        // Different group => collision allowed
        assert!(CollisionFilter::can_collide(&a, &c));
    }

    #[test]
    fn test_group_zero_always_checks_mask() {
        let a = CollisionFilter::new(layers::ALL, layers::ALL).with_group(0);
        let b = CollisionFilter::new(layers::ALL, layers::ALL).with_group(0);
        assert!(CollisionFilter::can_collide(&a, &b));
    }
}
