//! Glint Core - scene description and shared configuration.
//!
//! This crate provides:
//!
//! - **Scene files**: JSON scene descriptions (`SceneDescription`) with
//!   materials, objects, camera and environment
//! - **Settings**: `RenderSettings` shared by the renderer and the viewer
//! - **Textures**: equirectangular environment maps loaded with `image`
//!
//! # Example
//!
//! ```ignore
//! use glint_core::SceneDescription;
//!
//! let scene = SceneDescription::load("scenes/showcase.json")?;
//! println!("{} objects, {} materials", scene.objects.len(), scene.materials.len());
//! ```

pub mod scene;
pub mod settings;
pub mod texture;

// Re-export commonly used types
pub use scene::{
    CameraDescription, EnvironmentDescription, Facing, MaterialDescription, ObjectDescription,
    PoseDescription, SceneDescription, SceneError, ShapeKind,
};
pub use settings::RenderSettings;
pub use texture::{Texture, TextureError};
