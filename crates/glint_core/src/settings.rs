//! Render settings shared by scene files, the command line and the renderer.

use serde::{Deserialize, Serialize};

/// Tunables for a progressive render.
///
/// Every field has a default, so a scene file only needs to list the ones
/// it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Maximum number of bounces per camera ray
    pub max_depth: i32,

    /// Ticks without camera motion after which workers stop synchronizing
    /// with the control thread
    pub converge_after: u32,

    /// Distance a scattered ray's origin is pushed along its direction
    pub ray_epsilon: f32,

    /// Worker thread count; `None` uses the available hardware parallelism
    pub worker_count: Option<usize>,

    /// Initial image width in pixels
    pub width: u32,

    /// Initial image height in pixels
    pub height: u32,

    /// Vertical field of view in degrees
    pub vertical_fov: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_depth: 4,
            converge_after: 20,
            ray_epsilon: 0.005,
            worker_count: None,
            width: 800,
            height: 608,
            vertical_fov: 70.0,
        }
    }
}

impl RenderSettings {
    /// Resolve the worker count against the machine.
    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count
            .filter(|&count| count > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = RenderSettings::default();
        assert_eq!(settings.max_depth, 4);
        assert_eq!(settings.converge_after, 20);
        assert!((settings.ray_epsilon - 0.005).abs() < 1e-9);
        assert_eq!((settings.width, settings.height), (800, 608));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: RenderSettings = serde_json::from_str(r#"{ "max_depth": 32 }"#).unwrap();
        assert_eq!(settings.max_depth, 32);
        assert_eq!(settings.converge_after, 20);
        assert_eq!(settings.worker_count, None);
    }

    #[test]
    fn test_worker_count_resolution() {
        let explicit = RenderSettings {
            worker_count: Some(3),
            ..Default::default()
        };
        assert_eq!(explicit.resolved_worker_count(), 3);

        let zero = RenderSettings {
            worker_count: Some(0),
            ..Default::default()
        };
        assert!(zero.resolved_worker_count() >= 1, "zero must fall back to hardware count");
    }
}
