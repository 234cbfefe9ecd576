#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ozdyn::prelude::*;

#[derive(Debug, Arbitrary)]
struct TickInput {
    /// Number of bodies to add (capped)
    body_count: u8,
    /// Positions in raw fuzz units
    positions: Vec<(i16, i16, i16)>,
    /// Per-body mass selector (0 becomes static)
    masses: Vec<u8>,
    /// Fragment burst size (capped)
    frag_count: u8,
    /// RNG seed
    seed: u64,
    /// Ticks to run (capped)
    ticks: u8,
}

const POOLS: &str = r#"{
    "debris": {
        "velocitySpread": 8.0,
        "life": 1.5,
        "mass": 0.2,
        "elasticity": 0.5
    }
}"#;

// Fuzz the world tick loop: arbitrary body soup plus a fragment burst.
// Must never panic, and body state must stay finite.
fuzz_target!(|input: TickInput| {
    let mut world = match World::new(WorldConfig::default()) {
        Ok(world) => world,
        Err(_) => return,
    };
    world.reseed(input.seed);
    world.load_frag_pools(POOLS).expect("static pool table");

    let shape = Shape::new_box(Vec3::new(0.5, 0.5, 0.5));
    let body_count = (input.body_count as usize).min(16);
    let mut ids = Vec::new();
    for i in 0..body_count {
        let (px, py, pz) = input.positions.get(i).copied().unwrap_or((0, 0, 0));
        let pos = Vec3::new(px as f32 / 16.0, py as f32 / 16.0, pz as f32 / 16.0);
        let mass = input.masses.get(i).copied().unwrap_or(1) as f32;
        let body = if mass == 0.0 {
            Body::new_static(pos)
        } else {
            Body::new(pos, mass)
        };
        ids.push(world.add_body(body.with_shape(shape.clone())));
    }

    let frag_count = (input.frag_count as usize).min(64);
    world
        .add_frags(0, frag_count, Vec3::ZERO, Vec3::UNIT_Z)
        .expect("pool 0 exists");

    for _ in 0..(input.ticks as usize).min(32) {
        world.tick();
    }

    for id in ids {
        let body = world.body(id).expect("bodies are never removed here");
        assert!(body.pos.is_finite(), "non-finite position leaked into body");
        assert!(body.velocity.is_finite());
    }
});
