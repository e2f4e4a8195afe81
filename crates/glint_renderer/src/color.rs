//! Display transform applied to the accumulated radiance.

use glint_math::Vec3;

use crate::material::Color;

// ACES fitted matrices, applied as row dot products (sRGB -> ACES -> sRGB)
const ACES_INPUT: [Vec3; 3] = [
    Vec3::new(0.59719, 0.35458, 0.04823),
    Vec3::new(0.07600, 0.90834, 0.01566),
    Vec3::new(0.02840, 0.13383, 0.83777),
];

const ACES_OUTPUT: [Vec3; 3] = [
    Vec3::new(1.60475, -0.53108, -0.07367),
    Vec3::new(-0.10208, 1.10813, -0.00605),
    Vec3::new(-0.00327, -0.07276, 1.07602),
];

/// Gamma 2.2 encode. Negative channels clamp to zero.
#[inline]
pub fn rgb_to_srgb(color: Color) -> Color {
    color.max(Color::ZERO).powf(1.0 / 2.2)
}

#[inline]
fn mul_rows(rows: &[Vec3; 3], v: Vec3) -> Vec3 {
    Vec3::new(rows[0].dot(v), rows[1].dot(v), rows[2].dot(v))
}

fn rrt_and_odt_fit(v: Vec3) -> Vec3 {
    let a = v * (v + 0.0245786) - 0.000090537;
    let b = v * (0.983729 * v + 0.4329510) + 0.238081;
    a / b
}

/// Stephen Hill's fit of the ACES RRT+ODT, output clamped to [0, 1].
pub fn aces_fitted(color: Color) -> Color {
    let color = mul_rows(&ACES_INPUT, color);
    let color = rrt_and_odt_fit(color);
    mul_rows(&ACES_OUTPUT, color).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Full display transform for one accumulated color.
#[inline]
pub fn tonemap(color: Color) -> Color {
    aces_fitted(rgb_to_srgb(color))
}
