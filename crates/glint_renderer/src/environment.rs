//! Backdrop seen by rays that leave the scene.

use std::f32::consts::{FRAC_1_PI, PI};

use glint_core::Texture;
use glint_math::Vec3;

use crate::material::Color;

/// 1 / (2 pi), the equirectangular longitude scale
const INV_TWO_PI: f32 = 0.5 / PI;

/// What a ray sees when it hits nothing. Evaluated only from the ray
/// direction, so it is deterministic.
#[derive(Debug, Clone)]
pub enum Environment {
    /// Same color in every direction
    Solid(Color),
    /// Lerp from `horizon` (straight down) to `zenith` (straight up)
    Gradient { horizon: Color, zenith: Color },
    /// Equirectangular map, scaled by `intensity`
    Map { texture: Texture, intensity: f32 },
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Gradient {
            horizon: Color::ONE,
            zenith: Color::new(0.5, 0.7, 1.0),
        }
    }
}

impl Environment {
    /// Radiance arriving from `direction`.
    pub fn sample(&self, direction: Vec3) -> Color {
        match self {
            Environment::Solid(color) => *color,
            Environment::Gradient { horizon, zenith } => {
                let unit_direction = direction.normalize_or_zero();
                let a = 0.5 * (unit_direction.y + 1.0);
                *horizon * (1.0 - a) + *zenith * a
            }
            Environment::Map { texture, intensity } => {
                let (u, v) = equirect_uv(direction);
                texture.sample(u, v) * *intensity
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Environment::Solid(_) => "solid",
            Environment::Gradient { .. } => "gradient",
            Environment::Map { .. } => "map",
        }
    }
}

/// Longitude/latitude of a direction mapped to [0, 1]^2, v = 1 straight up.
pub fn equirect_uv(direction: Vec3) -> (f32, f32) {
    let d = direction.normalize_or_zero();
    let u = d.z.atan2(d.x) * INV_TWO_PI + 0.5;
    let v = d.y.clamp(-1.0, 1.0).asin() * FRAC_1_PI + 0.5;
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gradient_endpoints() {
        let sky = Environment::default();
        assert!((sky.sample(Vec3::Y) - Color::new(0.5, 0.7, 1.0)).length() < 1e-6);
        assert!((sky.sample(Vec3::NEG_Y) - Color::ONE).length() < 1e-6);
        assert!((sky.sample(Vec3::X) - Color::new(0.75, 0.85, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_solid_ignores_direction() {
        let env = Environment::Solid(Color::new(0.2, 0.3, 0.4));
        assert_eq!(env.sample(Vec3::X), env.sample(Vec3::new(-0.3, 0.9, 0.1)));
    }

    #[test]
    fn test_equirect_uv_poles_and_seam() {
        let (_, v_up) = equirect_uv(Vec3::Y);
        let (_, v_down) = equirect_uv(Vec3::NEG_Y);
        assert!((v_up - 1.0).abs() < 1e-6);
        assert!(v_down.abs() < 1e-6);

        let (u_x, v_x) = equirect_uv(Vec3::X);
        assert!((u_x - 0.5).abs() < 1e-6);
        assert!((v_x - 0.5).abs() < 1e-6);

        let (u_z, _) = equirect_uv(Vec3::Z);
        assert!((u_z - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_map_sky_on_top() {
        // 1x2 map: top row bright sky, bottom row dark ground
        let texture = Texture::new(1, 2, vec![Color::ONE, Color::ZERO], "<test>").unwrap();
        let env = Environment::Map {
            texture,
            intensity: 2.0,
        };
        assert_eq!(env.sample(Vec3::new(0.1, 0.9, 0.0)), Color::splat(2.0));
        assert_eq!(env.sample(Vec3::new(0.1, -0.9, 0.0)), Color::ZERO);
    }
}
