#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ozdyn::prelude::*;

#[derive(Debug, Arbitrary)]
struct CollisionInput {
    /// Shape selectors: even = box, odd = capsule
    kind0: u8,
    kind1: u8,
    /// Extents / dimensions, mapped into small positive floats
    dims0: (u16, u16, u16),
    dims1: (u16, u16, u16),
    /// Positions and rotation axis-angles, in raw fuzz units
    pos0: (i16, i16, i16),
    pos1: (i16, i16, i16),
    rot0: (i8, i8, i8, u8),
    rot1: (i8, i8, i8, u8),
}

fn small_positive(raw: u16) -> f32 {
    0.01 + (raw as f32) / 1024.0
}

fn make_shape(kind: u8, dims: (u16, u16, u16)) -> ShapeRef {
    if kind % 2 == 0 {
        Shape::new_box(Vec3::new(
            small_positive(dims.0),
            small_positive(dims.1),
            small_positive(dims.2),
        ))
    } else {
        Shape::new_capsule(small_positive(dims.0), small_positive(dims.1))
    }
}

fn make_transform(pos: (i16, i16, i16), rot: (i8, i8, i8, u8)) -> Transform {
    let axis = Vec3::new(rot.0 as f32, rot.1 as f32, rot.2 as f32);
    let quat = match axis.try_normalize() {
        Some(a) => Quat::from_axis_angle(a, rot.3 as f32 / 40.0),
        None => Quat::IDENTITY,
    };
    Transform::new(
        Vec3::new(pos.0 as f32 / 8.0, pos.1 as f32 / 8.0, pos.2 as f32 / 8.0),
        Mat3::from_quat(quat),
    )
}

// Fuzz the narrow phase with arbitrary shape pairs and placements.
// Must never panic, and any reported overlap must be finite with
// positive depth and a unit-length axis.
fuzz_target!(|input: CollisionInput| {
    let shape0 = make_shape(input.kind0, input.dims0);
    let shape1 = make_shape(input.kind1, input.dims1);
    let tf0 = make_transform(input.pos0, input.rot0);
    let tf1 = make_transform(input.pos1, input.rot1);

    if let Some(overlap) = overlaps(&shape0, &tf0, &shape1, &tf1) {
        assert!(overlap.depth > 0.0 && overlap.depth.is_finite());
        assert!(overlap.axis.is_finite());
        let len = overlap.axis.length();
        assert!((len - 1.0).abs() < 1.0e-3, "axis not unit: {}", len);
    }
});
