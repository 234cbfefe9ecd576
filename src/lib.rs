//! # ozdyn
//!
//! **Collision and Rigid-Body Dynamics Core for the OpenZone Engine**
//!
//! A fixed-tick, deterministic collision and dynamics library: box and
//! capsule shapes, a uniform cell grid broad phase, SAT narrow phase, and
//! pooled debris fragments.
//!
//! ## Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | **Shape** | Immutable box/capsule geometry, shared via `Arc` |
//! | **Body** | Rigid collidable entity with cached rotation matrix and AABB |
//! | **Space** | 2D uniform cell grid for broad-phase candidate queries |
//! | **Collider** | SAT overlap tests (box-box 15-axis, capsule variants) |
//! | **Frag/FragPool** | Fire-and-forget debris spawned from JSON templates |
//! | **World** | Fixed-tick driver: integrate, broad, narrow, resolve |
//!
//! ## Design Principles
//!
//! - **Deterministic**: fixed tick, seeded RNG, stable iteration order
//! - **Manual cache refresh**: rotation matrix and bounds are recomputed
//!   explicitly, never behind the caller's back
//! - **Degenerate-safe**: zero-length normalizations and non-finite
//!   intermediates read as "no collision", never NaN in body state
//!
//! ## Quick Start
//!
//! ```rust
//! use ozdyn::prelude::*;
//!
//! let mut world = World::new(WorldConfig::default()).unwrap();
//!
//! // A static floor and a falling crate
//! world.add_body(
//!     Body::new_static(Vec3::ZERO).with_shape(Shape::new_box(Vec3::new(20.0, 20.0, 0.5))),
//! );
//! let crate_id = world.add_body(
//!     Body::new(Vec3::new(0.0, 0.0, 5.0), 10.0)
//!         .with_shape(Shape::new_box(Vec3::new(0.6, 0.6, 0.6))),
//! );
//!
//! for _ in 0..120 {
//!     world.tick();
//! }
//!
//! // The crate has landed on the floor
//! let body = world.body(crate_id).unwrap();
//! assert!(body.pos.z > 0.5 && body.pos.z < 5.0);
//! ```
//!
//! ## Debris Fragments
//!
//! ```rust
//! use ozdyn::prelude::*;
//!
//! let mut world = World::new(WorldConfig::default()).unwrap();
//! world
//!     .load_frag_pools(
//!         r#"{ "shards": { "velocitySpread": 4.0, "life": 2.0,
//!              "mass": 0.2, "elasticity": 0.5, "models": ["shard"] } }"#,
//!     )
//!     .unwrap();
//!
//! world.add_frags(0, 32, Vec3::new(0.0, 0.0, 2.0), Vec3::UNIT_Z).unwrap();
//! world.tick();
//! assert_eq!(world.frags().count(), 32);
//! ```

pub mod body;
pub mod bounds;
pub mod collider;
pub mod error;
pub mod event;
pub mod filter;
pub mod frag;
pub mod math;
pub mod rng;
pub mod shape;
pub mod space;
pub mod state_io;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::body::{Body, BodyArena, BodyId, DISABLED_BIT, STATIC_BIT};
    pub use crate::bounds::Bounds;
    pub use crate::collider::{overlaps, Overlap, Transform};
    pub use crate::error::DynamicsError;
    pub use crate::event::{ContactEvent, ContactKind, EventCollector};
    pub use crate::filter::{layers, CollisionFilter};
    pub use crate::frag::{load_pools, Frag, FragPool, FragPoolConfig, FADEOUT_BIT};
    pub use crate::math::{Mat3, Quat, Vec3};
    pub use crate::rng::DeterministicRng;
    pub use crate::shape::{BoxShape, CapsuleShape, Shape, ShapeKind, ShapeRef, MARGIN};
    pub use crate::space::{CellRange, Space, CELL_SIZE, GRID_CELLS, WORLD_DIM};
    pub use crate::state_io::{
        load_snapshot, save_snapshot, SerializedBody, SerializedFrag, WorldSnapshot,
    };
    pub use crate::world::{World, WorldConfig};
}

pub use prelude::*;
