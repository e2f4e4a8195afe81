//! Surface responses.
//!
//! A material turns a hit into an attenuation color and at most one
//! scattered ray, and may emit light of its own. Randomness comes only
//! from the caller's [`Seed`], so a trace is reproducible from its seed.

use glint_math::{Mat4, Ray, Transform, Vec3};

use crate::rng::Seed;

/// Color type alias (linear RGB, unbounded)
pub type Color = Vec3;

/// Shading inputs at a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingPoint {
    /// World-space hit position
    pub position: Vec3,
    /// Unit normal facing the side the ray came from
    pub normal: Vec3,
    /// Direction of the incoming ray
    pub incoming: Vec3,
    pub front_facing: bool,
}

/// Result of [`Material::shade`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shade {
    /// Multiplier for light arriving along `scattered`, or the direct color
    /// for terminal materials
    pub attenuation: Color,
    /// Continuation ray; `None` ends the path here
    pub scattered: Option<Ray>,
}

impl Shade {
    pub fn scatter(attenuation: Color, scattered: Ray) -> Self {
        Self {
            attenuation,
            scattered: Some(scattered),
        }
    }

    pub fn terminal(color: Color) -> Self {
        Self {
            attenuation: color,
            scattered: None,
        }
    }
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter (or absorb) an incoming ray.
    fn shade(&self, point: &ShadingPoint, seed: &mut Seed) -> Shade;

    /// Light emitted at the hit. Most materials return black.
    fn emission(&self, _point: &ShadingPoint, _seed: &mut Seed) -> Color {
        Color::ZERO
    }
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Material for Lambertian {
    fn shade(&self, point: &ShadingPoint, seed: &mut Seed) -> Shade {
        let mut direction = point.normal + seed.unit_sphere();

        // Catch degenerate scatter direction
        if direction.length_squared() < 1e-8 {
            direction = point.normal;
        }

        Shade::scatter(self.albedo, Ray::new(point.position, direction.normalize()))
    }
}

/// Metallic (specular) material.
#[derive(Debug, Clone)]
pub struct Metallic {
    albedo: Color,
    roughness: f32,
}

impl Metallic {
    /// - `albedo`: The color of the metal
    /// - `roughness`: 0.0 = perfect mirror
    pub fn new(albedo: Color, roughness: f32) -> Self {
        Self {
            albedo,
            roughness: roughness.max(0.0),
        }
    }
}

impl Material for Metallic {
    fn shade(&self, point: &ShadingPoint, seed: &mut Seed) -> Shade {
        let reflected = reflect(point.incoming.normalize(), point.normal);
        let direction = if self.roughness > 0.0 {
            reflected + self.roughness * seed.hemisphere_around(point.normal)
        } else {
            reflected
        };

        Shade::scatter(self.albedo, Ray::new(point.position, direction.normalize_or_zero()))
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }
}

impl Material for Dielectric {
    fn shade(&self, point: &ShadingPoint, seed: &mut Seed) -> Shade {
        let refraction_ratio = if point.front_facing {
            1.0 / self.ior
        } else {
            self.ior
        };

        let unit_direction = point.incoming.normalize();
        let cos_theta = (-unit_direction).dot(point.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

        // Total internal reflection decides without consuming a draw
        let cannot_refract = refraction_ratio * sin_theta > 1.0;
        let direction =
            if cannot_refract || seed.unsigned() < reflectance(cos_theta, self.ior) {
                reflect(unit_direction, point.normal)
            } else {
                refract(unit_direction, point.normal, refraction_ratio)
            };

        Shade::scatter(Color::ONE, Ray::new(point.position, direction.normalize()))
    }
}

/// Light source: never scatters, emits a constant radiance.
#[derive(Debug, Clone)]
pub struct Emissive {
    radiance: Color,
}

impl Emissive {
    pub fn new(color: Color, strength: f32) -> Self {
        Self {
            radiance: color * strength,
        }
    }
}

impl Material for Emissive {
    fn shade(&self, _point: &ShadingPoint, _seed: &mut Seed) -> Shade {
        Shade::terminal(Color::ZERO)
    }

    fn emission(&self, _point: &ShadingPoint, _seed: &mut Seed) -> Color {
        self.radiance
    }
}

/// Teleports rays from one pose's frame into another's.
///
/// Deterministic: no draws, unit attenuation.
#[derive(Debug, Clone)]
pub struct Portal {
    remap: Mat4,
}

impl Portal {
    pub fn new(from: &Transform, to: &Transform) -> Self {
        Self {
            remap: to.matrix() * from.inverse_matrix(),
        }
    }

    pub fn remap(&self) -> Mat4 {
        self.remap
    }
}

impl Material for Portal {
    fn shade(&self, point: &ShadingPoint, _seed: &mut Seed) -> Shade {
        let ray = Ray::new(point.position, point.incoming)
            .transformed(&self.remap)
            .normalized();
        Shade::scatter(Color::ONE, ray)
    }
}

/// Colors surfaces by their world normal, `0.5 * (n + 1)`.
#[derive(Debug, Clone, Default)]
pub struct NormalDebug;

impl Material for NormalDebug {
    fn shade(&self, point: &ShadingPoint, _seed: &mut Seed) -> Shade {
        Shade::terminal(0.5 * (point.normal + Vec3::ONE))
    }
}

/// Draws unit grid lines: a channel is lit where that coordinate is within
/// 0.1 of an integer.
#[derive(Debug, Clone, Default)]
pub struct GridDebug;

impl Material for GridDebug {
    fn shade(&self, point: &ShadingPoint, _seed: &mut Seed) -> Shade {
        let f = point.position.abs().fract();
        let line = |v: f32| if v >= 0.9 || v <= 0.1 { 1.0 } else { 0.0 };
        Shade::terminal(Color::new(line(f.x), line(f.y), line(f.z)))
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface (Snell's law).
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation, with `f0` from the material's index of refraction.
#[inline]
pub fn reflectance(cosine: f32, ior: f32) -> f32 {
    let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
