//! Deterministic Random Number Generator
//!
//! PCG (Permuted Congruential Generator) with `f32` output. Fragment bursts
//! draw their velocity and life spread from this generator, so a world seeded
//! identically replays identical debris trajectories tick for tick.
//!
//! # Example
//!
//! ```
//! use ozdyn::rng::DeterministicRng;
//!
//! let mut rng = DeterministicRng::new(42);
//! let val = rng.next_f32(); // [0, 1), same sequence for the same seed
//! assert!((0.0..1.0).contains(&val));
//! ```

use crate::math::Vec3;

/// Deterministic RNG using PCG-XSH-RR (32-bit output).
///
/// Produces identical sequences given the same seed. Only the low 24 bits of
/// each output feed the `f32` conversion, so every sample is exact.
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    state: u64,
    inc: u64,
}

impl DeterministicRng {
    /// PCG multiplier
    const MULTIPLIER: u64 = 6364136223846793005;

    /// Create RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: 0,
            inc: (seed << 1) | 1, // Must be odd
        };
        // Advance state twice for initialization
        rng.next_u32();
        rng.state = rng.state.wrapping_add(seed);
        rng.next_u32();
        rng
    }

    /// Generate next u32 value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let old_state = self.state;
        // Advance state
        self.state = old_state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(self.inc);
        // XSH-RR output function
        let xorshifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Generate `f32` in `[0, 1)` from the top 24 bits of a u32 draw.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / (1 << 24) as f32)
    }

    /// Generate `f32` in `[-spread, spread]`.
    #[inline]
    pub fn next_spread(&mut self, spread: f32) -> f32 {
        (self.next_f32() * 2.0 - 1.0) * spread
    }

    /// Generate a random unit direction vector.
    pub fn next_direction(&mut self) -> Vec3 {
        // Marsaglia method: sample in [-1,1]^2, reject outside the unit disk
        for _ in 0..64 {
            let u = self.next_spread(1.0);
            let v = self.next_spread(1.0);
            let s = u * u + v * v;
            if s >= 1.0 || s == 0.0 {
                continue;
            }
            let factor = (1.0 - s).sqrt();
            return Vec3::new(2.0 * u * factor, 2.0 * v * factor, 1.0 - 2.0 * s);
        }
        Vec3::UNIT_Z
    }
}

// ============================================================================
// Tests
// ============================================================================
