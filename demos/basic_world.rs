//! A falling crate, a resting capsule and a debris burst.
//!
//! Run with: `cargo run --example basic_world`

use ozdyn::prelude::*;

fn main() -> Result<(), DynamicsError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ozdyn=debug".into()),
        )
        .init();

    let mut world = World::new(WorldConfig::default())?;
    world.reseed(7);
    world.load_frag_pools(
        r#"{
            "shards": {
                "velocitySpread": 5.0,
                "life": 3.0,
                "lifeSpread": 0.5,
                "mass": 0.2,
                "elasticity": 0.4,
                "fadeout": true,
                "models": ["shard0", "shard1", "shard2"]
            }
        }"#,
    )?;

    world.add_body(
        Body::new_static(Vec3::ZERO).with_shape(Shape::new_box(Vec3::new(30.0, 30.0, 0.5))),
    );
    let crate_id = world.add_body(
        Body::new(Vec3::new(0.0, 0.0, 6.0), 10.0)
            .with_shape(Shape::new_box(Vec3::new(0.6, 0.6, 0.6))),
    );
    let barrel = world.add_body(
        Body::new(Vec3::new(2.0, 0.5, 4.0), 4.0).with_shape(Shape::new_capsule(0.7, 0.4)),
    );

    world.add_frags(0, 40, Vec3::new(-1.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 4.0))?;

    for second in 1..=5 {
        for _ in 0..60 {
            world.tick();
            for event in world.events() {
                if event.kind == ContactKind::Begin {
                    println!(
                        "  contact begin: {:?} vs {:?} (depth {:.4})",
                        event.body_a, event.body_b, event.depth
                    );
                }
            }
        }
        let crate_pos = world.body(crate_id).unwrap().pos;
        let barrel_pos = world.body(barrel).unwrap().pos;
        println!(
            "t={second}s  crate z={:.2}  barrel z={:.2}  live frags={}",
            crate_pos.z,
            barrel_pos.z,
            world.frags().count()
        );
    }

    Ok(())
}
