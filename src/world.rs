//! World Tick Driver
//!
//! Owns the authoritative simulation state and advances it one fixed tick at
//! a time. Single-threaded and deterministic: the same body setup, pool
//! table, seed and tick count always produce the same state.
//!
//! # Tick Stages
//!
//! 1. Integrate dynamic bodies (gravity, drag, Euler position), refresh
//!    their cached bounds and re-home grid membership
//! 2. Broad phase: grid query per dynamic body, stamp deduplication,
//!    collision filter check
//! 3. Narrow phase: resolve each surviving pair, apply mass-weighted
//!    positional correction and elasticity-scaled velocity response,
//!    then diff contact pairs into begin/persist/end events
//! 4. Integrate fragments (rayon-parallel behind the `parallel` feature)
//! 5. Advance the tick counter
//!
//! Contact resolution is symmetric: body A's correction is the negation of
//! body B's, weighted by inverse mass. Static bodies never move.

use tracing::warn;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::body::{Body, BodyArena, BodyId};
use crate::collider::{overlaps, Transform};
use crate::error::DynamicsError;
use crate::event::{ContactEvent, EventCollector};
use crate::filter::CollisionFilter;
use crate::frag::{load_pools, Frag, FragPool};
use crate::math::Vec3;
use crate::rng::DeterministicRng;
use crate::space::{CellRange, Space};
use crate::state_io::{
    self, SerializedBody, SerializedFrag, WorldSnapshot, CURRENT_VERSION,
};

// ============================================================================
// Configuration
// ============================================================================

/// Fixed-tick simulation parameters.
#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    /// Gravity acceleration along the world Z axis (negative pulls down)
    pub gravity: f32,
    /// Per-tick velocity retention factor, in (0, 1]
    pub drag: f32,
    /// Tick duration in seconds
    pub tick_duration: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            drag: 0.98,
            tick_duration: 1.0 / 60.0,
        }
    }
}

impl WorldConfig {
    /// Reject parameter combinations that cannot produce a valid simulation.
    pub fn validate(&self) -> Result<(), DynamicsError> {
        if !self.gravity.is_finite() {
            return Err(DynamicsError::InvalidConfiguration {
                reason: "gravity must be finite",
            });
        }
        if !(self.drag > 0.0 && self.drag <= 1.0) {
            return Err(DynamicsError::InvalidConfiguration {
                reason: "drag must be in (0, 1]",
            });
        }
        if !(self.tick_duration > 0.0 && self.tick_duration.is_finite()) {
            return Err(DynamicsError::InvalidConfiguration {
                reason: "tick duration must be positive",
            });
        }
        Ok(())
    }
}

// ============================================================================
// World
// ============================================================================

/// The simulation world: bodies, spatial grid, fragment pools, live
/// fragments, contact events and the deterministic RNG.
pub struct World {
    config: WorldConfig,
    bodies: BodyArena,
    space: Space,
    pools: Vec<FragPool>,
    frags: Vec<Frag>,
    free_frags: Vec<usize>,
    events: EventCollector,
    rng: DeterministicRng,
    tick: u64,
    /// Broad-phase deduplication generation, bumped per driver query
    stamp: u64,
    query_buf: Vec<BodyId>,
}

impl World {
    /// Create a world with the given configuration.
    pub fn new(config: WorldConfig) -> Result<Self, DynamicsError> {
        config.validate()?;
        Ok(Self {
            config,
            bodies: BodyArena::new(),
            space: Space::new(),
            pools: Vec::new(),
            frags: Vec::new(),
            free_frags: Vec::new(),
            events: EventCollector::new(),
            rng: DeterministicRng::new(0),
            tick: 0,
            stamp: 0,
            query_buf: Vec::new(),
        })
    }

    /// Reseed the RNG driving fragment spread sampling.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = DeterministicRng::new(seed);
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Tick counter, advanced at the end of each [`tick`](Self::tick).
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    // ------------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------------

    /// Add a body to the simulation. Its rotation matrix and bounds are
    /// refreshed and, if it carries a shape, it is inserted into the grid.
    pub fn add_body(&mut self, mut body: Body) -> BodyId {
        body.update_rotation();
        let has_shape = body.shape.is_some();
        if has_shape {
            body.update_bounds();
        }
        let bb = body.bb;
        let id = self.bodies.insert(body);
        if has_shape {
            let range = CellRange::from_bounds(&bb);
            self.space.insert(id, range);
            if let Some(body) = self.bodies.get_mut(id) {
                body.grid_range = Some(range);
            }
        }
        id
    }

    /// Remove a body. Grid membership is released using the range recorded
    /// at insert time, so removal stays correct even with stale bounds.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, DynamicsError> {
        let body = self
            .bodies
            .remove(id)
            .ok_or(DynamicsError::InvalidBodyId {
                index: id.index,
                generation: id.generation,
            })?;
        if let Some(range) = body.grid_range {
            self.space.remove(id, range);
        }
        self.events.forget_body(id);
        Ok(body)
    }

    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    /// Mutable body access. After changing position, rotation or shape,
    /// call [`refresh_body`](Self::refresh_body) before relying on spatial
    /// queries.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Recompute a body's cached rotation matrix and bounds and re-home its
    /// grid membership. Call after external position or rotation changes.
    pub fn refresh_body(&mut self, id: BodyId) -> Result<(), DynamicsError> {
        let body = self
            .bodies
            .get_mut(id)
            .ok_or(DynamicsError::InvalidBodyId {
                index: id.index,
                generation: id.generation,
            })?;
        body.update_rotation();
        if body.shape.is_some() {
            body.update_bounds();
            let new_range = CellRange::from_bounds(&body.bb);
            let old_range = body.grid_range;
            body.grid_range = Some(new_range);
            match old_range {
                Some(old) => self.space.update(id, old, new_range),
                None => self.space.insert(id, new_range),
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Fragment pools and fragments
    // ------------------------------------------------------------------------

    /// Load fragment pool templates from a JSON document, replacing any
    /// previously loaded table. Fails on the first malformed template.
    pub fn load_frag_pools(&mut self, json: &str) -> Result<(), DynamicsError> {
        self.pools = load_pools(json)?;
        Ok(())
    }

    #[must_use]
    pub fn pool(&self, pool_id: u32) -> Option<&FragPool> {
        self.pools.get(pool_id as usize)
    }

    #[must_use]
    pub fn pools(&self) -> &[FragPool] {
        &self.pools
    }

    /// Spawn a burst of fragments from a pool, all at `pos` with the given
    /// base velocity plus per-fragment randomized spread. Dead fragment
    /// slots are recycled before the list grows.
    pub fn add_frags(
        &mut self,
        pool_id: u32,
        count: usize,
        pos: Vec3,
        velocity: Vec3,
    ) -> Result<(), DynamicsError> {
        let pool = self
            .pools
            .get(pool_id as usize)
            .ok_or(DynamicsError::InvalidConfiguration {
                reason: "fragment pool id out of range",
            })?
            .clone();

        for _ in 0..count {
            let index = if pool.models.is_empty() {
                0
            } else {
                (self.rng.next_u32() % pool.models.len() as u32) as i32
            };
            let frag = pool.spawn(index, pos, velocity, &mut self.rng);
            match self.free_frags.pop() {
                Some(slot) => self.frags[slot] = frag,
                None => self.frags.push(frag),
            }
        }
        Ok(())
    }

    /// Live fragments, in slot order.
    pub fn frags(&self) -> impl Iterator<Item = &Frag> {
        self.frags.iter().filter(|f| f.alive)
    }

    #[must_use]
    pub fn frag_count(&self) -> usize {
        self.frags.len() - self.free_frags.len()
    }

    /// Contact events from the most recent tick.
    #[must_use]
    pub fn events(&self) -> &[ContactEvent] {
        self.events.events()
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance the simulation one fixed tick.
    pub fn tick(&mut self) {
        let dt = self.config.tick_duration;
        let ids = self.bodies.ids();

        // Stage 1: integrate dynamic bodies and refresh broad-phase state
        for &id in &ids {
            let Some(body) = self.bodies.get_mut(id) else {
                continue;
            };
            if body.is_static() || !body.is_enabled() {
                continue;
            }

            let prev_pos = body.pos;
            body.velocity.z += self.config.gravity * dt;
            body.velocity *= self.config.drag;
            body.pos += body.velocity * dt;

            // A non-finite position must never reach the grid or collider
            if !body.pos.is_finite() || !body.velocity.is_finite() {
                warn!(
                    index = id.index,
                    "body integrated to non-finite state, halting it"
                );
                body.pos = prev_pos;
                body.velocity = Vec3::ZERO;
            }

            if body.shape.is_some() {
                body.update_bounds();
                let new_range = CellRange::from_bounds(&body.bb);
                let old_range = body.grid_range;
                body.grid_range = Some(new_range);
                match old_range {
                    Some(old) => self.space.update(id, old, new_range),
                    None => self.space.insert(id, new_range),
                }
            }
        }

        // Stages 2 and 3: broad phase, narrow phase, resolution
        let mut query_buf = std::mem::take(&mut self.query_buf);
        for &driver_id in &ids {
            let Some(driver) = self.bodies.get(driver_id) else {
                continue;
            };
            if driver.is_static() || !driver.is_enabled() || driver.shape.is_none() {
                continue;
            }
            let Some(range) = driver.grid_range else {
                continue;
            };
            let driver_bb = driver.bb;
            let driver_filter = driver.filter;

            self.stamp += 1;
            let stamp = self.stamp;
            query_buf.clear();
            self.space.query(range, &mut query_buf);

            for i in 0..query_buf.len() {
                let other_id = query_buf[i];
                if other_id == driver_id {
                    continue;
                }
                let Some(other) = self.bodies.get_mut(other_id) else {
                    continue;
                };
                // Spanning bodies appear once per covered cell
                if other.stamp == stamp {
                    continue;
                }
                other.stamp = stamp;

                if !other.is_enabled() || other.shape.is_none() {
                    continue;
                }
                // A dynamic pair is handled once, from the lower-index side
                if !other.is_static() && other_id.index < driver_id.index {
                    continue;
                }
                if !CollisionFilter::can_collide(&driver_filter, &other.filter) {
                    continue;
                }
                if !driver_bb.overlaps(&other.bb) {
                    continue;
                }

                self.resolve_pair(driver_id, other_id);
            }
        }
        self.query_buf = query_buf;
        self.events.finish_tick();

        // Stage 4: fragments, independent of body resolution
        let gravity = self.config.gravity;
        let drag = self.config.drag;
        #[cfg(feature = "parallel")]
        self.frags.par_iter_mut().for_each(|frag| {
            if frag.alive {
                frag.integrate(gravity, drag, dt);
            }
        });
        #[cfg(not(feature = "parallel"))]
        for frag in &mut self.frags {
            if frag.alive {
                frag.integrate(gravity, drag, dt);
            }
        }
        self.free_frags.clear();
        self.free_frags.extend(
            self.frags
                .iter()
                .enumerate()
                .filter(|(_, f)| !f.alive)
                .map(|(i, _)| i),
        );

        // Stage 5
        self.tick += 1;
    }

    /// Narrow-phase test and symmetric resolution for one candidate pair.
    fn resolve_pair(&mut self, id_a: BodyId, id_b: BodyId) {
        let Some((a, b)) = self.bodies.get_pair_mut(id_a, id_b) else {
            return;
        };
        let (Some(shape_a), Some(shape_b)) = (a.shape.as_deref(), b.shape.as_deref()) else {
            return;
        };

        let tf_a = Transform::new(a.pos, a.rot_mat);
        let tf_b = Transform::new(b.pos, b.rot_mat);
        let Some(overlap) = overlaps(shape_a, &tf_a, shape_b, &tf_b) else {
            return;
        };

        self.events.report(id_a, id_b, overlap.axis, overlap.depth);

        let w_a = if a.is_static() { 0.0 } else { a.inv_mass };
        let w_b = if b.is_static() { 0.0 } else { b.inv_mass };
        let w_sum = w_a + w_b;
        if w_sum <= 0.0 {
            return;
        }

        // Positional correction, split by inverse mass
        let correction = overlap.axis * overlap.depth;
        a.pos -= correction * (w_a / w_sum);
        b.pos += correction * (w_b / w_sum);

        // Velocity response along the contact axis, scaled by combined
        // elasticity, only while the pair is closing
        let closing = (b.velocity - a.velocity).dot(overlap.axis);
        if closing < 0.0 {
            let restitution = a.elasticity * b.elasticity;
            let impulse = -(1.0 + restitution) * closing / w_sum;
            a.velocity -= overlap.axis * (impulse * w_a);
            b.velocity += overlap.axis * (impulse * w_b);
        }

        // Re-home whichever bodies moved
        if w_a > 0.0 {
            a.update_bounds();
            let new_range = CellRange::from_bounds(&a.bb);
            let old_range = a.grid_range;
            a.grid_range = Some(new_range);
            if let Some(old) = old_range {
                self.space.update(id_a, old, new_range);
            }
        }
        if w_b > 0.0 {
            b.update_bounds();
            let new_range = CellRange::from_bounds(&b.bb);
            let old_range = b.grid_range;
            b.grid_range = Some(new_range);
            if let Some(old) = old_range {
                self.space.update(id_b, old, new_range);
            }
        }
    }

    // ------------------------------------------------------------------------
    // State snapshots
    // ------------------------------------------------------------------------

    /// Capture the dynamic state of the world: body kinematics plus live
    /// fragments. Shapes and pool tables are configuration and not captured.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            version: CURRENT_VERSION,
            tick: self.tick,
            gravity: self.config.gravity,
            drag: self.config.drag,
            tick_duration: self.config.tick_duration,
            bodies: self
                .bodies
                .iter()
                .map(|(id, body)| SerializedBody {
                    index: id.index,
                    generation: id.generation,
                    pos: body.pos,
                    rot: body.rot,
                    velocity: body.velocity,
                })
                .collect(),
            frags: self
                .frags()
                .map(|frag| SerializedFrag {
                    pool_id: frag.pool_id,
                    index: frag.index,
                    pos: frag.pos,
                    velocity: frag.velocity,
                    life: frag.life,
                })
                .collect(),
        }
    }

    /// Restore dynamic state from a snapshot taken against the same body
    /// setup and pool table.
    ///
    /// Fragment mass and elasticity are re-derived from the current pool
    /// table, not restored: a pool edit between save and load retroactively
    /// applies to reloaded fragments.
    pub fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> Result<(), DynamicsError> {
        for sb in &snapshot.bodies {
            let id = BodyId {
                index: sb.index,
                generation: sb.generation,
            };
            let body = self.bodies.get_mut(id).ok_or(DynamicsError::InvalidBodyId {
                index: sb.index,
                generation: sb.generation,
            })?;
            body.pos = sb.pos;
            body.rot = sb.rot;
            body.velocity = sb.velocity;
            self.refresh_body(id)?;
        }

        self.frags.clear();
        self.free_frags.clear();
        for sf in &snapshot.frags {
            let pool = self.pools.get(sf.pool_id as usize).ok_or(
                DynamicsError::Malformed {
                    reason: "snapshot references an unknown fragment pool",
                },
            )?;
            self.frags.push(Frag {
                pool_id: sf.pool_id,
                index: sf.index,
                pos: sf.pos,
                velocity: sf.velocity,
                life: sf.life,
                mass: pool.mass,
                elasticity: pool.elasticity,
                alive: true,
            });
        }

        // Contact history belongs to the abandoned timeline; without this a
        // pair touching before the rewind emits an End event for a contact
        // that never began in the restored one.
        self.events.clear();

        self.tick = snapshot.tick;
        Ok(())
    }

    /// Write the current dynamic state to a binary file.
    pub fn save_state(&self, path: &std::path::Path) -> Result<(), DynamicsError> {
        state_io::save_snapshot(&self.snapshot(), path)
    }

    /// Restore dynamic state from a binary file.
    pub fn load_state(&mut self, path: &std::path::Path) -> Result<(), DynamicsError> {
        let snapshot = state_io::load_snapshot(path)?;
        self.apply_snapshot(&snapshot)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ContactKind;
    use crate::filter::layers;
    use crate::shape::Shape;

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    const POOLS_JSON: &str = r#"{
        "shards": {
            "velocitySpread": 0.0,
            "life": 2.0,
            "mass": 0.5,
            "elasticity": 0.4,
            "models": ["shard"]
        }
    }"#;

    #[test]
    fn test_config_validation() {
        assert!(WorldConfig::default().validate().is_ok());
        assert!(WorldConfig {
            drag: 0.0,
            ..WorldConfig::default()
        }
        .validate()
        .is_err());
        assert!(WorldConfig {
            drag: 1.5,
            ..WorldConfig::default()
        }
        .validate()
        .is_err());
        assert!(WorldConfig {
            tick_duration: 0.0,
            ..WorldConfig::default()
        }
        .validate()
        .is_err());
        assert!(WorldConfig {
            gravity: f32::NAN,
            ..WorldConfig::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_add_remove_body() {
        let mut w = world();
        let shape = Shape::new_box(Vec3::new(0.5, 0.5, 0.5));
        let id = w.add_body(Body::new(Vec3::ZERO, 1.0).with_shape(shape));

        assert_eq!(w.body_count(), 1);
        assert!(w.body(id).is_some());

        w.remove_body(id).unwrap();
        assert_eq!(w.body_count(), 0);
        // Stale handle is rejected, not silently reused
        assert!(w.remove_body(id).is_err());
    }

    #[test]
    fn test_gravity_pulls_dynamic_body() {
        let mut w = world();
        let shape = Shape::new_box(Vec3::new(0.5, 0.5, 0.5));
        let id = w.add_body(Body::new(Vec3::new(0.0, 0.0, 10.0), 1.0).with_shape(shape));

        for _ in 0..10 {
            w.tick();
        }
        let body = w.body(id).unwrap();
        assert!(body.pos.z < 10.0);
        assert!(body.velocity.z < 0.0);
        assert_eq!(w.current_tick(), 10);
    }

    #[test]
    fn test_static_body_never_moves() {
        let mut w = world();
        let shape = Shape::new_box(Vec3::new(10.0, 10.0, 0.5));
        let floor = w.add_body(Body::new_static(Vec3::ZERO).with_shape(shape));

        // Dynamic box resting just above, pulled into the floor by gravity
        let ball = w.add_body(
            Body::new(Vec3::new(0.0, 0.0, 1.0), 1.0)
                .with_shape(Shape::new_box(Vec3::new(0.5, 0.5, 0.5))),
        );

        for _ in 0..60 {
            w.tick();
        }
        assert_eq!(w.body(floor).unwrap().pos, Vec3::ZERO);
        // The dynamic body is held near the floor surface, not falling through
        assert!(w.body(ball).unwrap().pos.z > 0.5);
    }

    #[test]
    fn test_overlapping_pair_emits_contact_event() {
        let mut w = world();
        let shape = Shape::new_box(Vec3::new(0.5, 0.5, 0.5));
        let a = w.add_body(Body::new(Vec3::ZERO, 1.0).with_shape(shape.clone()));
        let b = w.add_body(Body::new(Vec3::new(0.8, 0.0, 0.0), 1.0).with_shape(shape));

        w.tick();
        let events = w.events();
        assert_eq!(events.len(), 1);
        let pair = (events[0].body_a, events[0].body_b);
        assert!(pair == (a, b) || pair == (b, a));
        assert!(events[0].depth > 0.0);
    }

    #[test]
    fn test_rewind_discards_contact_history() {
        let mut w = world();
        w.add_body(Body::new_static(Vec3::ZERO).with_shape(Shape::new_box(Vec3::new(
            10.0, 10.0, 0.5,
        ))));
        w.add_body(
            Body::new(Vec3::new(0.0, 0.0, 5.0), 1.0)
                .with_shape(Shape::new_box(Vec3::new(0.5, 0.5, 0.5))),
        );

        // Snapshot before any contact, then run well into resting contact
        let snapshot = w.snapshot();
        for _ in 0..240 {
            w.tick();
        }
        assert!(w
            .events()
            .iter()
            .any(|e| e.kind == ContactKind::Persist));

        // In the restored timeline the pair never touched, so the first
        // tick after the rewind must not report the contact ending
        w.apply_snapshot(&snapshot).unwrap();
        w.tick();
        assert!(w.events().iter().all(|e| e.kind != ContactKind::End));
    }

    #[test]
    fn test_resolution_separates_equal_masses_symmetrically() {
        let mut w = World::new(WorldConfig {
            gravity: 0.0,
            drag: 1.0,
            tick_duration: 1.0 / 60.0,
        })
        .unwrap();
        let shape = Shape::new_box(Vec3::new(0.5, 0.5, 0.5));
        let a = w.add_body(Body::new(Vec3::ZERO, 1.0).with_shape(shape.clone()));
        let b = w.add_body(Body::new(Vec3::new(0.8, 0.0, 0.0), 1.0).with_shape(shape));

        w.tick();
        let pa = w.body(a).unwrap().pos;
        let pb = w.body(b).unwrap().pos;
        // Equal masses split the correction evenly, in opposite directions
        assert!(pa.x < 0.0);
        assert!(pb.x > 0.8);
        assert!((pa.x.abs() - (pb.x - 0.8)).abs() < 1.0e-4);
    }

    #[test]
    fn test_filtered_pair_not_tested() {
        let mut w = World::new(WorldConfig {
            gravity: 0.0,
            drag: 1.0,
            tick_duration: 1.0 / 60.0,
        })
        .unwrap();
        let shape = Shape::new_box(Vec3::new(0.5, 0.5, 0.5));
        let filter_a = CollisionFilter::new(layers::UNIT, layers::UNIT);
        let filter_b = CollisionFilter::new(layers::DEBRIS, layers::DEBRIS);
        let a = w.add_body(
            Body::new(Vec3::ZERO, 1.0)
                .with_shape(shape.clone())
                .with_filter(filter_a),
        );
        let b = w.add_body(
            Body::new(Vec3::new(0.5, 0.0, 0.0), 1.0)
                .with_shape(shape)
                .with_filter(filter_b),
        );

        w.tick();
        assert!(w.events().is_empty());
        // Overlapping but never resolved
        assert_eq!(w.body(a).unwrap().pos, Vec3::ZERO);
        assert_eq!(w.body(b).unwrap().pos, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_frag_burst_and_expiry() {
        let mut w = World::new(WorldConfig {
            gravity: 0.0,
            drag: 1.0,
            tick_duration: 0.1,
        })
        .unwrap();
        w.load_frag_pools(POOLS_JSON).unwrap();
        w.add_frags(0, 8, Vec3::ZERO, Vec3::ZERO).unwrap();
        assert_eq!(w.frag_count(), 8);

        // Pool life 2.0 at dt 0.1: alive through tick 19, gone on tick 20
        for _ in 0..19 {
            w.tick();
        }
        assert_eq!(w.frag_count(), 8);
        w.tick();
        assert_eq!(w.frag_count(), 0);
    }

    #[test]
    fn test_frag_slots_recycled() {
        let mut w = World::new(WorldConfig {
            gravity: 0.0,
            drag: 1.0,
            tick_duration: 0.1,
        })
        .unwrap();
        w.load_frag_pools(POOLS_JSON).unwrap();
        w.add_frags(0, 4, Vec3::ZERO, Vec3::ZERO).unwrap();
        for _ in 0..20 {
            w.tick();
        }
        assert_eq!(w.frag_count(), 0);

        // Respawn reuses the dead slots instead of growing the list
        w.add_frags(0, 4, Vec3::ZERO, Vec3::ZERO).unwrap();
        assert_eq!(w.frag_count(), 4);
        assert_eq!(w.frags.len(), 4);
    }

    #[test]
    fn test_add_frags_rejects_unknown_pool() {
        let mut w = world();
        assert!(w.add_frags(5, 1, Vec3::ZERO, Vec3::ZERO).is_err());
    }

    #[test]
    fn test_determinism_across_worlds() {
        let build = || {
            let mut w = World::new(WorldConfig::default()).unwrap();
            w.reseed(1234);
            w.load_frag_pools(POOLS_JSON).unwrap();
            let shape = Shape::new_box(Vec3::new(0.5, 0.5, 0.5));
            w.add_body(Body::new(Vec3::new(0.0, 0.0, 5.0), 1.0).with_shape(shape.clone()));
            w.add_body(Body::new_static(Vec3::ZERO).with_shape(Shape::new_box(Vec3::new(
                10.0, 10.0, 0.5,
            ))));
            w.add_frags(0, 16, Vec3::new(0.0, 0.0, 2.0), Vec3::UNIT_Z)
                .unwrap();
            w
        };

        let mut w1 = build();
        let mut w2 = build();
        for _ in 0..120 {
            w1.tick();
            w2.tick();
        }

        let s1 = w1.snapshot();
        let s2 = w2.snapshot();
        assert_eq!(s1.bodies, s2.bodies);
        assert_eq!(s1.frags, s2.frags);
    }

    #[test]
    fn test_snapshot_roundtrip_through_world() {
        let mut w = world();
        w.load_frag_pools(POOLS_JSON).unwrap();
        let shape = Shape::new_box(Vec3::new(0.5, 0.5, 0.5));
        let id = w.add_body(Body::new(Vec3::new(0.0, 0.0, 5.0), 1.0).with_shape(shape));
        w.add_frags(0, 3, Vec3::ZERO, Vec3::UNIT_X).unwrap();
        for _ in 0..30 {
            w.tick();
        }

        let snapshot = w.snapshot();
        let saved_pos = w.body(id).unwrap().pos;

        // Keep simulating, then rewind
        for _ in 0..30 {
            w.tick();
        }
        assert_ne!(w.body(id).unwrap().pos, saved_pos);

        w.apply_snapshot(&snapshot).unwrap();
        assert_eq!(w.body(id).unwrap().pos, saved_pos);
        assert_eq!(w.current_tick(), 30);
        assert_eq!(w.frag_count(), 3);
    }

    #[test]
    fn test_reloaded_frags_rederive_pool_parameters() {
        let mut w = World::new(WorldConfig {
            gravity: 0.0,
            drag: 1.0,
            tick_duration: 0.1,
        })
        .unwrap();
        w.load_frag_pools(POOLS_JSON).unwrap();
        w.add_frags(0, 1, Vec3::ZERO, Vec3::ZERO).unwrap();
        let snapshot = w.snapshot();

        // New pool table with a different mass between save and load
        let edited = POOLS_JSON.replace("\"mass\": 0.5", "\"mass\": 2.0");
        w.load_frag_pools(&edited).unwrap();
        w.apply_snapshot(&snapshot).unwrap();

        let frag = w.frags().next().unwrap();
        assert_eq!(frag.mass, 2.0);
    }
}
