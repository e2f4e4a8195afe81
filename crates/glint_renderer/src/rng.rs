//! Deterministic per-worker random numbers.
//!
//! A multiplicative congruential generator (Park-Miller multiplier 16807)
//! over a wrapping 32-bit signed seed. Floats are built directly from the
//! seed's upper 23 bits by OR-ing in an exponent, so draws are bit-identical
//! on every platform and thread.

use glint_math::Vec3;
use std::f32::consts::TAU;

/// Base value every worker seed is derived from.
pub const BASE_SEED: i32 = 0x0026_9ec3;

const EXPONENT_ONE: u32 = 0x3f80_0000; // 1.0f32
const EXPONENT_TWO: u32 = 0x4000_0000; // 2.0f32

/// Random stream state. One per worker thread, never shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seed(pub i32);

impl Default for Seed {
    fn default() -> Self {
        Seed(BASE_SEED)
    }
}

impl Seed {
    /// Seed for worker `index`: the base value XOR `index * 1321`.
    pub fn for_worker(index: usize) -> Self {
        Seed(BASE_SEED ^ (index as i32).wrapping_mul(1321))
    }

    #[inline]
    fn advance(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(16807);
        self.0 as u32
    }

    /// Uniform draw in [-1, 1).
    #[inline]
    pub fn signed(&mut self) -> f32 {
        f32::from_bits((self.advance() >> 9) | EXPONENT_TWO) - 3.0
    }

    /// Uniform draw in [0, 1).
    #[inline]
    pub fn unsigned(&mut self) -> f32 {
        f32::from_bits((self.advance() >> 9) | EXPONENT_ONE) - 1.0
    }

    /// Uniform direction on the hemisphere around +Y.
    pub fn hemisphere(&mut self) -> Vec3 {
        let cos_theta = (TAU * self.unsigned()).cos();
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

        let cos_phi = self.signed();
        let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();

        Vec3::new(sin_phi * cos_theta, sin_phi * sin_theta, cos_phi)
    }

    /// Uniform direction on the unit sphere.
    ///
    /// A hemisphere sample whose Y sign bit is taken from bit 24 of the
    /// advanced seed, so no extra draw is spent on the flip.
    pub fn unit_sphere(&mut self) -> Vec3 {
        let mut v = self.hemisphere();
        let sign = ((self.0 as u32) & (1 << 24)) << 7;
        v.y = f32::from_bits(v.y.to_bits() | sign);
        v
    }

    /// Uniform direction on the hemisphere around `normal`.
    pub fn hemisphere_around(&mut self, normal: Vec3) -> Vec3 {
        let v = self.unit_sphere();
        if v.dot(normal) < 0.0 {
            -v
        } else {
            v
        }
    }
}
