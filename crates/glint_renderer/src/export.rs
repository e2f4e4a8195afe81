//! Saving renders to disk.
//!
//! Formats live in a small static registry keyed by file extension. LDR
//! formats encode the tonemapped display pixels; Radiance HDR writes the
//! linear accumulation buffer.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::hdr::HdrEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, Rgb};
use rayon::prelude::*;
use thiserror::Error;

use crate::framebuffer::Snapshot;

/// JPEG quality used for every export
const JPEG_QUALITY: u8 = 100;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No image format registered for extension {0:?}")]
    UnsupportedExtension(String),

    #[error("Nothing to save: the image is empty")]
    Empty,

    #[error("Failed to encode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// One entry of the format registry.
pub struct ImageFormat {
    pub friendly_name: &'static str,
    /// Lowercase extensions without the dot
    pub extensions: &'static [&'static str],
    pub write: fn(&Path, &Snapshot) -> ExportResult<()>,
}

impl std::fmt::Debug for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFormat")
            .field("friendly_name", &self.friendly_name)
            .field("extensions", &self.extensions)
            .finish()
    }
}

pub static FORMATS: &[ImageFormat] = &[
    ImageFormat {
        friendly_name: "Portable Network Graphics",
        extensions: &["png"],
        write: write_png,
    },
    ImageFormat {
        friendly_name: "Bitmap",
        extensions: &["bmp", "dib"],
        write: write_bmp,
    },
    ImageFormat {
        friendly_name: "TARGA",
        extensions: &["tga", "icb", "vda", "vst"],
        write: write_tga,
    },
    ImageFormat {
        friendly_name: "RGBE",
        extensions: &["hdr"],
        write: write_hdr,
    },
    ImageFormat {
        friendly_name: "JPEG",
        extensions: &["jpg", "jpeg", "jpe", "jif", "jfif", "jfi"],
        write: write_jpeg,
    },
];

/// Look up the format for `path` by its extension, ignoring case.
pub fn format_for_path(path: &Path) -> ExportResult<&'static ImageFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    FORMATS
        .iter()
        .find(|format| format.extensions.contains(&extension.as_str()))
        .ok_or(ExportError::UnsupportedExtension(extension))
}

/// Encode `snapshot` to `path` in the format its extension names.
pub fn save(path: impl AsRef<Path>, snapshot: &Snapshot) -> ExportResult<()> {
    let path = path.as_ref();
    let format = format_for_path(path)?;
    if snapshot.width == 0 || snapshot.height == 0 {
        return Err(ExportError::Empty);
    }

    (format.write)(path, snapshot)?;
    log::info!(
        "Saved {}x{} {} to {}",
        snapshot.width,
        snapshot.height,
        format.friendly_name,
        path.display()
    );
    Ok(())
}

fn image_error(path: &Path) -> impl FnOnce(image::ImageError) -> ExportError + '_ {
    move |source| ExportError::Image {
        path: path.to_path_buf(),
        source,
    }
}

/// BGRA display pixels to tightly packed RGBA.
fn to_rgba8(snapshot: &Snapshot) -> Vec<u8> {
    let mut bytes = vec![0u8; snapshot.pixels.len() * 4];
    bytes
        .par_chunks_mut(4)
        .zip(snapshot.pixels.par_iter())
        .for_each(|(out, pixel)| out.copy_from_slice(&pixel.to_rgba()));
    bytes
}

fn to_rgb8(snapshot: &Snapshot) -> Vec<u8> {
    let mut bytes = vec![0u8; snapshot.pixels.len() * 3];
    bytes
        .par_chunks_mut(3)
        .zip(snapshot.pixels.par_iter())
        .for_each(|(out, pixel)| out.copy_from_slice(&[pixel.r, pixel.g, pixel.b]));
    bytes
}

fn write_ldr(path: &Path, snapshot: &Snapshot, format: image::ImageFormat) -> ExportResult<()> {
    image::save_buffer_with_format(
        path,
        &to_rgba8(snapshot),
        snapshot.width as u32,
        snapshot.height as u32,
        ColorType::Rgba8,
        format,
    )
    .map_err(image_error(path))
}

fn write_png(path: &Path, snapshot: &Snapshot) -> ExportResult<()> {
    write_ldr(path, snapshot, image::ImageFormat::Png)
}

fn write_bmp(path: &Path, snapshot: &Snapshot) -> ExportResult<()> {
    write_ldr(path, snapshot, image::ImageFormat::Bmp)
}

fn write_tga(path: &Path, snapshot: &Snapshot) -> ExportResult<()> {
    write_ldr(path, snapshot, image::ImageFormat::Tga)
}

fn write_jpeg(path: &Path, snapshot: &Snapshot) -> ExportResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
        .encode(
            &to_rgb8(snapshot),
            snapshot.width as u32,
            snapshot.height as u32,
            ColorType::Rgb8,
        )
        .map_err(image_error(path))
}

fn write_hdr(path: &Path, snapshot: &Snapshot) -> ExportResult<()> {
    let data: Vec<Rgb<f32>> = snapshot
        .radiance
        .par_iter()
        .map(|c| Rgb([c.x.max(0.0), c.y.max(0.0), c.z.max(0.0)]))
        .collect();

    let writer = BufWriter::new(File::create(path)?);
    HdrEncoder::new(writer)
        .encode(&data, snapshot.width, snapshot.height)
        .map_err(image_error(path))
}

/// Picks where the next save goes without asking: the base path first, then
/// `stem_0001.ext`, `stem_0002.ext` and so on, skipping files that exist.
#[derive(Debug, Clone)]
pub struct SaveTarget {
    base: PathBuf,
    counter: u32,
}

impl SaveTarget {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            counter: 0,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Next path that does not exist yet.
    pub fn next_path(&mut self) -> PathBuf {
        loop {
            let candidate = self.candidate(self.counter);
            self.counter += 1;
            if !candidate.exists() {
                return candidate;
            }
        }
    }

    fn candidate(&self, index: u32) -> PathBuf {
        if index == 0 {
            return self.base.clone();
        }
        let stem = self
            .base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "render".to_string());
        let name = match self.base.extension() {
            Some(ext) => format!("{}_{:04}.{}", stem, index, ext.to_string_lossy()),
            None => format!("{}_{:04}", stem, index),
        };
        self.base.with_file_name(name)
    }

    /// Save to the next free path and return it.
    pub fn save(&mut self, snapshot: &Snapshot) -> ExportResult<PathBuf> {
        let path = self.next_path();
        save(&path, snapshot)?;
        Ok(path)
    }
}

impl Default for SaveTarget {
    fn default() -> Self {
        Self::new("render.png")
    }
}
