//! Glint renderer - progressive multithreaded CPU path tracing.
//!
//! The image is refined every tick while the camera holds still: each
//! worker thread owns a band of scanlines and blends one jittered sample
//! per pixel into a running mean. A lockstep [`Scheduler`] keeps camera
//! and resize handling on the control thread from ever overlapping a
//! worker tick, and relaxes into free-running mode once the image has
//! converged.
//!
//! Geometry is a handful of canonical shapes (unit sphere, plane,
//! rectangle) placed by a [`Transform`]; rays are intersected in the
//! shape's local frame.

mod barrier;
mod camera;
mod color;
mod controller;
pub mod demo;
mod display;
mod environment;
pub mod export;
mod framebuffer;
mod handshake;
mod input;
mod material;
mod object;
mod progressive;
mod rng;
mod scene;
mod scheduler;
mod shape;
mod world;

pub use barrier::FrameBarrier;
pub use camera::Camera;
pub use color::{aces_fitted, rgb_to_srgb, tonemap};
pub use controller::OrbitController;
pub use display::{Display, HeadlessDisplay, Pixel};
pub use environment::{equirect_uv, Environment};
pub use export::{save, ExportError, ImageFormat, SaveTarget, FORMATS};
pub use framebuffer::{band_rows, Band, Framebuffer, Snapshot};
pub use handshake::{ControlTurn, Handshake};
pub use input::{InputState, Key, MouseButton};
pub use material::{
    reflect, reflectance, refract, Color, Dielectric, Emissive, GridDebug, Lambertian, Material,
    Metallic, NormalDebug, Portal, Shade, ShadingPoint,
};
pub use object::{HitInfo, Object};
pub use progressive::{ProgressiveRenderer, RenderShared, View};
pub use rng::{Seed, BASE_SEED};
pub use scene::{build_scene, SceneSetup};
pub use scheduler::{Host, Scheduler, Workload};
pub use shape::{Inverted, LocalHit, Plane, Rectangle, Shape, SingleSided, Sphere};
pub use world::{TraceResult, World, DEFAULT_RAY_EPSILON};

/// Re-export common math types from glint_math
pub use glint_math::{Interval, Ray, Transform, Vec3};
