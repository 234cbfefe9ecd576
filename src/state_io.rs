//! Simulation State Serialization
//!
//! Save and restore the dynamic state of a world: body kinematics and live
//! fragments. Shapes and fragment pools are configuration, not state, so
//! they are never written; a snapshot is applied on top of a world that has
//! already been set up with the same bodies and pool table.
//!
//! # Binary Format
//!
//! ```text
//! Magic:       "OZDYN\0" (6 bytes)
//! Version:     u32 LE
//! Tick:        u64 LE
//! Config:      gravity(f32), drag(f32), tick_duration(f32)
//! Body count:  u32 LE
//! Bodies:      [index(u32), generation(u32), pos(3xf32),
//!               rot(4xf32), velocity(3xf32); body_count]
//! Frag count:  u32 LE
//! Frags:       [pool_id(u32), index(i32), pos(3xf32),
//!               velocity(3xf32), life(f32); frag_count]
//! ```
//!
//! Fragment records carry only `(pool_id, index, pos, velocity, life)`.
//! Mass and elasticity are re-derived from the pool table when the snapshot
//! is applied, so they reflect the pool parameters at load time rather than
//! the values the fragment was spawned with.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::DynamicsError;
use crate::math::{Quat, Vec3};

/// Magic bytes for the binary format header.
const MAGIC: &[u8; 6] = b"OZDYN\0";

/// Current format version.
pub const CURRENT_VERSION: u32 = 1;

// ============================================================================
// Snapshot Types
// ============================================================================

/// Complete dynamic state of a world at the end of a tick.
#[derive(Clone, Debug)]
pub struct WorldSnapshot {
    /// Format version
    pub version: u32,
    /// Tick counter at capture time
    pub tick: u64,
    /// Gravity acceleration along the world Z axis
    pub gravity: f32,
    /// Per-tick velocity retention factor
    pub drag: f32,
    /// Fixed tick duration in seconds
    pub tick_duration: f32,
    /// Kinematic state per live body
    pub bodies: Vec<SerializedBody>,
    /// Live fragments
    pub frags: Vec<SerializedFrag>,
}

/// Kinematic state of one body, keyed by its arena handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SerializedBody {
    pub index: u32,
    pub generation: u32,
    pub pos: Vec3,
    pub rot: Quat,
    pub velocity: Vec3,
}

/// One live fragment. Mass and elasticity are intentionally absent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SerializedFrag {
    pub pool_id: u32,
    pub index: i32,
    pub pos: Vec3,
    pub velocity: Vec3,
    pub life: f32,
}

// ============================================================================
// Binary I/O Helpers
// ============================================================================

fn write_u32(w: &mut dyn Write, v: u32) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u64(w: &mut dyn Write, v: u64) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_i32(w: &mut dyn Write, v: i32) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_f32(w: &mut dyn Write, v: f32) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_vec3(w: &mut dyn Write, v: Vec3) -> std::io::Result<()> {
    write_f32(w, v.x)?;
    write_f32(w, v.y)?;
    write_f32(w, v.z)
}

fn write_quat(w: &mut dyn Write, q: Quat) -> std::io::Result<()> {
    write_f32(w, q.x)?;
    write_f32(w, q.y)?;
    write_f32(w, q.z)?;
    write_f32(w, q.w)
}

fn read_u32(r: &mut dyn Read) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut dyn Read) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i32(r: &mut dyn Read) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32(r: &mut dyn Read) -> std::io::Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

fn read_vec3(r: &mut dyn Read) -> std::io::Result<Vec3> {
    Ok(Vec3::new(read_f32(r)?, read_f32(r)?, read_f32(r)?))
}

fn read_quat(r: &mut dyn Read) -> std::io::Result<Quat> {
    Ok(Quat {
        x: read_f32(r)?,
        y: read_f32(r)?,
        z: read_f32(r)?,
        w: read_f32(r)?,
    })
}

// ============================================================================
// Binary Format
// ============================================================================

/// Save a snapshot to a binary file.
pub fn save_snapshot(snapshot: &WorldSnapshot, path: &Path) -> Result<(), DynamicsError> {
    let mut file = std::fs::File::create(path)?;
    write_snapshot(&mut file, snapshot)
}

/// Load a snapshot from a binary file.
pub fn load_snapshot(path: &Path) -> Result<WorldSnapshot, DynamicsError> {
    let mut file = std::fs::File::open(path)?;
    read_snapshot(&mut file)
}

/// Write a snapshot to any writer.
pub fn write_snapshot(w: &mut dyn Write, snapshot: &WorldSnapshot) -> Result<(), DynamicsError> {
    w.write_all(MAGIC)?;
    write_u32(w, snapshot.version)?;
    write_u64(w, snapshot.tick)?;

    write_f32(w, snapshot.gravity)?;
    write_f32(w, snapshot.drag)?;
    write_f32(w, snapshot.tick_duration)?;

    write_u32(w, snapshot.bodies.len() as u32)?;
    for body in &snapshot.bodies {
        write_u32(w, body.index)?;
        write_u32(w, body.generation)?;
        write_vec3(w, body.pos)?;
        write_quat(w, body.rot)?;
        write_vec3(w, body.velocity)?;
    }

    write_u32(w, snapshot.frags.len() as u32)?;
    for frag in &snapshot.frags {
        write_u32(w, frag.pool_id)?;
        write_i32(w, frag.index)?;
        write_vec3(w, frag.pos)?;
        write_vec3(w, frag.velocity)?;
        write_f32(w, frag.life)?;
    }

    Ok(())
}

/// Read a snapshot from any reader.
pub fn read_snapshot(r: &mut dyn Read) -> Result<WorldSnapshot, DynamicsError> {
    let mut magic = [0u8; 6];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(DynamicsError::Malformed {
            reason: "bad magic bytes, expected OZDYN\\0",
        });
    }

    let version = read_u32(r)?;
    if version != CURRENT_VERSION {
        return Err(DynamicsError::Malformed {
            reason: "unsupported snapshot version",
        });
    }

    let tick = read_u64(r)?;
    let gravity = read_f32(r)?;
    let drag = read_f32(r)?;
    let tick_duration = read_f32(r)?;

    let body_count = read_u32(r)? as usize;
    let mut bodies = Vec::with_capacity(body_count);
    for _ in 0..body_count {
        bodies.push(SerializedBody {
            index: read_u32(r)?,
            generation: read_u32(r)?,
            pos: read_vec3(r)?,
            rot: read_quat(r)?,
            velocity: read_vec3(r)?,
        });
    }

    let frag_count = read_u32(r)? as usize;
    let mut frags = Vec::with_capacity(frag_count);
    for _ in 0..frag_count {
        frags.push(SerializedFrag {
            pool_id: read_u32(r)?,
            index: read_i32(r)?,
            pos: read_vec3(r)?,
            velocity: read_vec3(r)?,
            life: read_f32(r)?,
        });
    }

    Ok(WorldSnapshot {
        version,
        tick,
        gravity,
        drag,
        tick_duration,
        bodies,
        frags,
    })
}

// ============================================================================
// Tests
// ============================================================================
