//! Turning a [`SceneDescription`] into a renderable [`World`].

use std::collections::HashMap;
use std::sync::Arc;

use glint_core::{
    EnvironmentDescription, Facing, MaterialDescription, RenderSettings, SceneDescription,
    SceneError, ShapeKind, Texture,
};
use glint_math::Vec3;

use crate::camera::Camera;
use crate::environment::Environment;
use crate::material::{
    Dielectric, Emissive, GridDebug, Lambertian, Material, Metallic, NormalDebug, Portal,
};
use crate::object::Object;
use crate::shape::{Inverted, Plane, Rectangle, Shape, SingleSided, Sphere};
use crate::world::World;

/// Everything needed to start a render.
pub struct SceneSetup {
    pub world: World,
    pub camera: Camera,
    pub settings: RenderSettings,
}

/// Build the world, camera and settings from a validated description.
///
/// Materials are created once and shared by every object naming them.
pub fn build_scene(description: &SceneDescription) -> Result<SceneSetup, SceneError> {
    description.validate()?;
    let settings = description.settings.clone();

    let materials: HashMap<&str, Arc<dyn Material>> = description
        .materials
        .iter()
        .map(|(name, material)| (name.as_str(), build_material(material)))
        .collect();

    let mut world = World::new();
    world.set_ray_epsilon(settings.ray_epsilon);
    if let Some(environment) = &description.environment {
        world.set_environment(build_environment(environment)?);
    }

    for (index, object) in description.objects.iter().enumerate() {
        let material = materials
            .get(object.material.as_str())
            .cloned()
            .ok_or_else(|| SceneError::UnknownMaterial {
                index,
                name: object.material.clone(),
            })?;
        world.add(Object::new(
            build_shape(object.shape, object.facing),
            material,
            object.pose.to_transform(),
        ));
    }

    let fov = description.camera.fov.unwrap_or(settings.vertical_fov);
    let aspect = settings.width.max(1) as f32 / settings.height.max(1) as f32;
    let camera = Camera::new(description.camera.pose.to_transform(), fov, aspect);

    log::debug!(
        "Built world: {} objects, {} materials, {} environment",
        world.len(),
        materials.len(),
        world.environment().kind()
    );

    Ok(SceneSetup {
        world,
        camera,
        settings,
    })
}

fn build_material(description: &MaterialDescription) -> Arc<dyn Material> {
    match description {
        MaterialDescription::Lambertian { albedo } => Arc::new(Lambertian::new(Vec3::from(*albedo))),
        MaterialDescription::Metallic { albedo, roughness } => {
            Arc::new(Metallic::new(Vec3::from(*albedo), *roughness))
        }
        MaterialDescription::Dielectric { ior } => Arc::new(Dielectric::new(*ior)),
        MaterialDescription::Emissive { color, strength } => {
            Arc::new(Emissive::new(Vec3::from(*color), *strength))
        }
        MaterialDescription::Portal { from, to } => {
            Arc::new(Portal::new(&from.to_transform(), &to.to_transform()))
        }
        MaterialDescription::NormalDebug => Arc::new(NormalDebug),
        MaterialDescription::GridDebug => Arc::new(GridDebug),
    }
}

fn build_shape(kind: ShapeKind, facing: Facing) -> Box<dyn Shape> {
    fn with_facing<S: Shape + 'static>(shape: S, facing: Facing) -> Box<dyn Shape> {
        match facing {
            Facing::Double => Box::new(shape),
            Facing::Single => Box::new(SingleSided(shape)),
            Facing::Inverted => Box::new(Inverted(shape)),
        }
    }

    match kind {
        ShapeKind::Sphere => with_facing(Sphere, facing),
        ShapeKind::Plane => with_facing(Plane, facing),
        ShapeKind::Rectangle => with_facing(Rectangle, facing),
    }
}

fn build_environment(description: &EnvironmentDescription) -> Result<Environment, SceneError> {
    Ok(match description {
        EnvironmentDescription::Solid { color } => Environment::Solid(Vec3::from(*color)),
        EnvironmentDescription::Gradient { horizon, zenith } => Environment::Gradient {
            horizon: Vec3::from(*horizon),
            zenith: Vec3::from(*zenith),
        },
        EnvironmentDescription::Hdri { path, intensity } => Environment::Map {
            texture: Texture::load(path)?,
            intensity: *intensity,
        },
    })
}
