//! Orbit/fly camera controller.
//!
//! Maps an [`InputState`] onto a camera [`Transform`] and tracks how many
//! ticks the camera has been still, which drives progressive accumulation.

use glint_math::{Transform, Vec2, Vec3};

use crate::input::{InputState, Key, MouseButton};

/// Pitch limit in radians, just short of straight up/down
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

#[derive(Debug, Clone)]
pub struct OrbitController {
    pub look_speed: f32,
    pub zoom_speed: f32,
    /// Pan speed, multiplied by the real tick time
    pub drag_speed: f32,
    /// Fly distance per tick while a movement key is held
    pub fly_speed: f32,

    yaw: f32,
    pitch: f32,
    last_cursor: Option<Vec2>,
    frames_still: u32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            look_speed: 400.0,
            zoom_speed: 0.1,
            drag_speed: 170_000.0,
            fly_speed: 0.3,
            yaw: 0.0,
            pitch: 0.0,
            last_cursor: None,
            frames_still: 0,
        }
    }
}

impl OrbitController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing pose so the first drag does not snap the view.
    pub fn sync_from(&mut self, transform: &Transform) {
        let (yaw, pitch, _roll) = transform.orientation().to_euler(glint_math::EulerRot::YXZ);
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// Ticks since the last camera-affecting input.
    pub fn frames_still(&self) -> u32 {
        self.frames_still
    }

    /// Restart accumulation, e.g. after a resize.
    pub fn reset(&mut self) {
        self.frames_still = 0;
    }

    /// Apply one tick of input to `camera`. Returns true if it moved.
    ///
    /// `size` is the display size in pixels; pointer deltas are normalized
    /// by its height. `dt` is the real tick time in seconds.
    pub fn update(
        &mut self,
        input: &InputState,
        size: (usize, usize),
        dt: f32,
        camera: &mut Transform,
    ) -> bool {
        let mut moved = false;

        let cursor = input.cursor();
        let raw = match self.last_cursor.replace(cursor) {
            Some(last) => cursor - last,
            None => Vec2::ZERO,
        };
        let height = size.1.max(1) as f32;
        let delta = Vec2::new(shape_delta(raw.x, height), shape_delta(raw.y, height));

        if input.is_pressed(MouseButton::Middle) && delta != Vec2::ZERO {
            camera.translate_local(Vec3::new(-delta.x, -delta.y, 0.0) * dt * self.drag_speed);
            moved = true;
        }

        if input.is_pressed(MouseButton::Right) && delta != Vec2::ZERO {
            self.yaw -= self.look_speed * delta.x;
            self.pitch = (self.pitch + self.look_speed * delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
            camera.set_euler(Vec3::new(self.pitch, self.yaw, 0.0));
            moved = true;
        }

        let scroll = input.scroll();
        if scroll != 0.0 {
            camera.translate_local(Vec3::NEG_Z * scroll * self.zoom_speed);
            moved = true;
        }

        let mut fly = Vec3::ZERO;
        for (key, direction) in [
            (Key::W, Vec3::NEG_Z),
            (Key::S, Vec3::Z),
            (Key::A, Vec3::NEG_X),
            (Key::D, Vec3::X),
            (Key::R, Vec3::Y),
            (Key::F, Vec3::NEG_Y),
        ] {
            if input.is_key_down(key) {
                fly += direction * self.fly_speed;
            }
        }
        if fly != Vec3::ZERO {
            camera.translate_local(fly);
            moved = true;
        }

        if moved {
            self.frames_still = 0;
        } else {
            self.frames_still = self.frames_still.saturating_add(1);
        }
        moved
    }
}

/// `sign(d) * (d / h)^2`: fine control for small motions.
fn shape_delta(d: f32, height: f32) -> f32 {
    let n = d / height;
    n * n.abs()
}
