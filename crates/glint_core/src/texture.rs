//! Environment map loading.
//!
//! Equirectangular images are decoded with the `image` crate into linear RGB
//! floats. HDR sources are kept as-is, 8-bit sources are linearized.

use std::path::Path;

use glint_math::Vec3;
use image::DynamicImage;
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Texture {0} has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A loaded RGB texture in linear float format.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Row-major, first row is the top of the image
    pub pixels: Vec<Vec3>,

    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Create a texture from pixel data.
    ///
    /// Fails when the buffer is empty or does not match the dimensions.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<Vec3>,
        path: impl Into<String>,
    ) -> TextureResult<Self> {
        let path = path.into();
        if width == 0 || height == 0 || pixels.len() != (width as usize) * (height as usize) {
            return Err(TextureError::Empty(path));
        }
        Ok(Self {
            width,
            height,
            pixels,
            path,
        })
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
            path: "<solid>".to_string(),
        }
    }

    /// Load an image file as a linear RGB texture.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let display = path.to_string_lossy().to_string();

        let img = image::open(path).map_err(|source| TextureError::Load {
            path: display.clone(),
            source,
        })?;

        let texture = match img {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                let rgb = img.into_rgb32f();
                let (width, height) = rgb.dimensions();
                let pixels = rgb.pixels().map(|p| Vec3::new(p[0], p[1], p[2])).collect();
                Self::new(width, height, pixels, display)?
            }
            _ => {
                let rgb = img.to_rgb8();
                let (width, height) = rgb.dimensions();
                let pixels = rgb
                    .pixels()
                    .map(|p| {
                        Vec3::new(
                            srgb_to_linear(p[0]),
                            srgb_to_linear(p[1]),
                            srgb_to_linear(p[2]),
                        )
                    })
                    .collect();
                Self::new(width, height, pixels, display)?
            }
        };

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            texture.path,
            texture.width,
            texture.height,
            texture.size_bytes() as f32 / 1024.0
        );

        Ok(texture)
    }

    /// Nearest-texel lookup.
    ///
    /// UV coordinates are in [0, 1] range, with (0, 0) at bottom-left.
    /// Out-of-range coordinates clamp to the edge texel.
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = (((1.0 - v) * self.height as f32) as u32).min(self.height - 1);
        self.get_pixel(x, y)
    }

    /// Get pixel at integer coordinates.
    fn get_pixel(&self, x: u32, y: u32) -> Vec3 {
        let idx = (y * self.width + x) as usize;
        self.pixels.get(idx).copied().unwrap_or(Vec3::ZERO)
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Vec3>()
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> Texture {
        // Top row red, green; bottom row blue, white
        Texture::new(
            2,
            2,
            vec![Vec3::X, Vec3::Y, Vec3::Z, Vec3::ONE],
            "<test>",
        )
        .unwrap()
    }

    #[test]
    fn test_solid_color_texture() {
        let tex = Texture::solid_color(Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(tex.width, 1);
        assert_eq!(tex.height, 1);

        let sample = tex.sample(0.5, 0.5);
        assert!((sample - Vec3::new(1.0, 0.5, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_sample_nearest_orientation() {
        let tex = two_by_two();
        assert_eq!(tex.sample(0.25, 0.75), Vec3::X, "top-left");
        assert_eq!(tex.sample(0.75, 0.75), Vec3::Y, "top-right");
        assert_eq!(tex.sample(0.25, 0.25), Vec3::Z, "bottom-left");
        assert_eq!(tex.sample(0.75, 0.25), Vec3::ONE, "bottom-right");
    }

    #[test]
    fn test_sample_clamps_edges() {
        let tex = two_by_two();
        assert_eq!(tex.sample(1.0, 1.0), Vec3::Y);
        assert_eq!(tex.sample(-3.0, 0.0), Vec3::Z);
        assert_eq!(tex.sample(5.0, -2.0), Vec3::ONE);
    }

    #[test]
    fn test_new_rejects_mismatched_buffer() {
        let result = Texture::new(3, 3, vec![Vec3::ZERO; 4], "<bad>");
        assert!(matches!(result, Err(TextureError::Empty(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Texture::load("does/not/exist.hdr");
        assert!(result.is_err());
    }

    #[test]
    fn test_srgb_to_linear() {
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }
}
