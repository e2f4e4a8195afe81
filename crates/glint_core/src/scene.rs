//! JSON scene descriptions.
//!
//! A scene file names its materials once and lets objects refer to them by
//! name. Everything except `objects` has a default, so the smallest useful
//! file is a material map and a list of shapes.
//!
//! ```json
//! {
//!   "camera": { "position": [0, 1, 5], "rotation": [-10, 0, 0] },
//!   "environment": { "type": "gradient" },
//!   "materials": {
//!     "floor": { "type": "lambertian", "albedo": [0.8, 0.8, 0.8] },
//!     "lamp": { "type": "emissive", "color": [4, 4, 4] }
//!   },
//!   "objects": [
//!     { "shape": "plane", "material": "floor", "rotation": [180, 0, 0] },
//!     { "shape": "sphere", "material": "lamp", "position": [0, 1, 0] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glint_math::{Transform, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::RenderSettings;
use crate::texture::TextureError;

/// Errors raised while reading or validating a scene description.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scene description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Object {index} references unknown material '{name}'")]
    UnknownMaterial { index: usize, name: String },

    #[error("Material '{name}' is invalid: {reason}")]
    InvalidMaterial { name: String, reason: String },

    #[error("Object {index} has a zero scale component")]
    DegenerateScale { index: usize },

    #[error("Environment map: {0}")]
    Texture(#[from] TextureError),
}

/// Position, Euler rotation in degrees (pitch, yaw, roll) and scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseDescription {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for PoseDescription {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl PoseDescription {
    pub fn to_transform(&self) -> Transform {
        let euler = Vec3::from(self.rotation) * std::f32::consts::PI / 180.0;
        Transform::from_euler(Vec3::from(self.position), euler, Vec3::from(self.scale))
    }

    fn has_zero_scale(&self) -> bool {
        self.scale.iter().any(|s| *s == 0.0)
    }
}

/// Camera placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDescription {
    #[serde(flatten)]
    pub pose: PoseDescription,

    /// Vertical field of view in degrees, overrides the settings value
    pub fov: Option<f32>,
}

impl Default for CameraDescription {
    fn default() -> Self {
        Self {
            pose: PoseDescription {
                position: [0.0, 1.0, 5.0],
                ..Default::default()
            },
            fov: None,
        }
    }
}

/// What a ray sees when it leaves the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvironmentDescription {
    Solid {
        color: [f32; 3],
    },
    Gradient {
        #[serde(default = "default_horizon")]
        horizon: [f32; 3],
        #[serde(default = "default_zenith")]
        zenith: [f32; 3],
    },
    /// Equirectangular map; relative paths resolve against the scene file
    Hdri {
        path: PathBuf,
        #[serde(default = "default_strength")]
        intensity: f32,
    },
}

fn default_horizon() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_zenith() -> [f32; 3] {
    [0.5, 0.7, 1.0]
}

fn default_strength() -> f32 {
    1.0
}

/// Surface response, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialDescription {
    Lambertian {
        albedo: [f32; 3],
    },
    Metallic {
        albedo: [f32; 3],
        #[serde(default)]
        roughness: f32,
    },
    Dielectric {
        ior: f32,
    },
    Emissive {
        color: [f32; 3],
        #[serde(default = "default_strength")]
        strength: f32,
    },
    Portal {
        from: PoseDescription,
        to: PoseDescription,
    },
    NormalDebug,
    GridDebug,
}

impl MaterialDescription {
    fn validate(&self, name: &str) -> Result<(), SceneError> {
        let invalid = |reason: &str| SceneError::InvalidMaterial {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        match self {
            MaterialDescription::Dielectric { ior } if !(*ior > 0.0) => {
                Err(invalid("index of refraction must be positive"))
            }
            MaterialDescription::Metallic { roughness, .. } if *roughness < 0.0 => {
                Err(invalid("roughness must not be negative"))
            }
            MaterialDescription::Portal { from, to } if from.has_zero_scale() || to.has_zero_scale() => {
                Err(invalid("portal poses need non-zero scale"))
            }
            _ => Ok(()),
        }
    }
}

/// Canonical local-space shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Unit sphere at the origin
    Sphere,
    /// Infinite Y=0 plane facing -Y
    Plane,
    /// Y=0 plane clipped to [-1, 1] on X and Z
    Rectangle,
}

/// Which sides of a shape can be hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    #[default]
    Double,
    Single,
    /// Front and back swapped, for the inside of hollow shells
    Inverted,
}

/// One placed shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub shape: ShapeKind,
    #[serde(default)]
    pub facing: Facing,
    pub material: String,
    #[serde(flatten)]
    pub pose: PoseDescription,
}

/// A complete scene file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub settings: RenderSettings,
    pub camera: CameraDescription,
    pub environment: Option<EnvironmentDescription>,
    pub materials: BTreeMap<String, MaterialDescription>,
    pub objects: Vec<ObjectDescription>,
}

impl SceneDescription {
    /// Parse and validate a scene from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let scene: SceneDescription = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Read a scene file. Relative environment paths are rewritten against
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut scene = Self::from_json(&json)?;
        if let Some(base) = path.parent() {
            scene.resolve_paths(base);
        }

        log::info!(
            "Loaded scene {}: {} objects, {} materials",
            path.display(),
            scene.objects.len(),
            scene.materials.len()
        );
        Ok(scene)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(EnvironmentDescription::Hdri { path, .. }) = &mut self.environment {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Check material parameters, material references and scales.
    pub fn validate(&self) -> Result<(), SceneError> {
        for (name, material) in &self.materials {
            material.validate(name)?;
        }
        for (index, object) in self.objects.iter().enumerate() {
            if !self.materials.contains_key(&object.material) {
                return Err(SceneError::UnknownMaterial {
                    index,
                    name: object.material.clone(),
                });
            }
            if object.pose.has_zero_scale() {
                return Err(SceneError::DegenerateScale { index });
            }
        }
        Ok(())
    }
}
