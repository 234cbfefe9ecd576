//! Fragment (Debris) Simulation
//!
//! Transient free-flying debris: explosion shards, gibs, rubble. Fragments
//! are fire-and-forget kinematic particles, never part of collision and
//! only subject to gravity/drag integration, spawned in bursts from
//! shared, read-only [`FragPool`] templates.
//!
//! # Snapshot Semantics
//!
//! A fragment copies `mass` and `elasticity` out of its pool at spawn time.
//! Changing pool parameters afterwards does not affect already-live
//! fragments. Serialized fragment state however carries only
//! `(pool_id, index, position, velocity, life)`; mass and elasticity are
//! re-derived from the pool table on load, so a pool edit between save and
//! load *does* retroactively affect reloaded fragments. That asymmetry is
//! inherited behavior, preserved deliberately (see DESIGN.md).

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::error::DynamicsError;
use crate::math::Vec3;
use crate::rng::DeterministicRng;

/// Pool flag: fragments fade out visually over their last second of life.
pub const FADEOUT_BIT: u32 = 1 << 0;

// ============================================================================
// FragPool
// ============================================================================

/// Raw pool parameters as they appear in configuration documents.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FragPoolConfig {
    /// Maximum magnitude of the random velocity perturbation
    pub velocity_spread: f32,
    /// Base lifetime in seconds
    pub life: f32,
    /// Half-width of the random lifetime perturbation
    #[serde(default)]
    pub life_spread: f32,
    /// Fragment mass
    pub mass: f32,
    /// Coefficient of restitution in [0, 1]
    pub elasticity: f32,
    /// Whether fragments fade out near end of life
    #[serde(default)]
    pub fadeout: bool,
    /// Renderable model names, one picked per fragment index
    #[serde(default)]
    pub models: Vec<String>,
}

/// Immutable fragment template shared by all fragments spawned from it.
///
/// Loaded once from configuration, read-only during simulation.
#[derive(Clone, Debug)]
pub struct FragPool {
    /// Template name (configuration key)
    pub name: String,
    /// Pool id, the index into the world's pool table
    pub id: u32,
    /// Pool flags (`FADEOUT_BIT`)
    pub flags: u32,
    /// Maximum magnitude of the random velocity perturbation
    pub velocity_spread: f32,
    /// Base lifetime in seconds
    pub life: f32,
    /// Half-width of the random lifetime perturbation
    pub life_spread: f32,
    /// Fragment mass
    pub mass: f32,
    /// Coefficient of restitution in [0, 1]
    pub elasticity: f32,
    /// Renderable model names
    pub models: Vec<String>,
}

impl FragPool {
    /// Validate a raw config and build the pool. Malformed templates can
    /// never produce a valid simulation, so this fails hard at load time.
    pub fn from_config(
        name: &str,
        id: u32,
        config: &FragPoolConfig,
    ) -> Result<Self, DynamicsError> {
        let invalid = |reason: &'static str| DynamicsError::InvalidPool {
            name: name.to_string(),
            reason,
        };

        if !(config.life > 0.0) {
            return Err(invalid("life must be positive"));
        }
        if config.life_spread < 0.0 || config.life_spread >= config.life {
            return Err(invalid("lifeSpread must be in [0, life)"));
        }
        if config.mass < 0.0 {
            return Err(invalid("mass must be non-negative"));
        }
        if config.velocity_spread < 0.0 {
            return Err(invalid("velocitySpread must be non-negative"));
        }
        if !(0.0..=1.0).contains(&config.elasticity) {
            return Err(invalid("elasticity must be in [0, 1]"));
        }

        Ok(Self {
            name: name.to_string(),
            id,
            flags: if config.fadeout { FADEOUT_BIT } else { 0 },
            velocity_spread: config.velocity_spread,
            life: config.life,
            life_spread: config.life_spread,
            mass: config.mass,
            elasticity: config.elasticity,
            models: config.models.clone(),
        })
    }

    /// Spawn one fragment. Pool parameters are snapshotted into the
    /// fragment; velocity and life perturbations come from the world RNG so
    /// bursts replay identically per seed.
    ///
    /// The velocity perturbation is isotropic: a random unit direction
    /// scaled by a magnitude in `[0, velocity_spread)`.
    pub fn spawn(
        &self,
        index: i32,
        pos: Vec3,
        velocity: Vec3,
        rng: &mut DeterministicRng,
    ) -> Frag {
        let spread = rng.next_direction() * (rng.next_f32() * self.velocity_spread);
        Frag {
            pool_id: self.id,
            index,
            pos,
            velocity: velocity + spread,
            life: self.life + rng.next_spread(self.life_spread),
            mass: self.mass,
            elasticity: self.elasticity,
            alive: true,
        }
    }
}

/// Parse a JSON configuration document into a pool table.
///
/// The document is a map of template name to parameters; ids are assigned in
/// name order so a given document always produces the same table.
pub fn load_pools(json: &str) -> Result<Vec<FragPool>, DynamicsError> {
    let configs: BTreeMap<String, FragPoolConfig> = serde_json::from_str(json)?;

    let mut pools = Vec::with_capacity(configs.len());
    for (id, (name, config)) in configs.iter().enumerate() {
        let pool = FragPool::from_config(name, id as u32, config)?;
        debug!(
            pool = %pool.name,
            id = pool.id,
            life = pool.life,
            models = pool.models.len(),
            "loaded fragment pool"
        );
        pools.push(pool);
    }
    Ok(pools)
}

// ============================================================================
// Frag
// ============================================================================

/// A single live fragment.
#[derive(Clone, Copy, Debug)]
pub struct Frag {
    /// Id of the pool this fragment was spawned from
    pub pool_id: u32,
    /// Model index within the pool's model list
    pub index: i32,
    /// Current position
    pub pos: Vec3,
    /// Current velocity
    pub velocity: Vec3,
    /// Remaining life in seconds
    pub life: f32,
    /// Mass, snapshotted from the pool at spawn
    pub mass: f32,
    /// Elasticity, snapshotted from the pool at spawn
    pub elasticity: f32,
    /// Whether this slot holds a live fragment
    pub alive: bool,
}

impl Frag {
    /// Advance one fixed tick: gravity, exponential drag, Euler position
    /// update, life countdown. The fragment dies on the first tick that
    /// drives `life` to zero or below.
    pub fn integrate(&mut self, gravity: f32, drag: f32, dt: f32) {
        self.velocity.z += gravity * dt;
        self.velocity *= drag;
        self.pos += self.velocity * dt;
        self.life -= dt;

        if self.life <= 0.0 {
            self.alive = false;
        }
    }

    /// Visual fade factor for pools carrying [`FADEOUT_BIT`]: remaining life
    /// clamped to `[0, 1]`. Pools without the flag render at full opacity.
    pub fn fade(&self, pool: &FragPool) -> f32 {
        if pool.flags & FADEOUT_BIT != 0 {
            self.life.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
