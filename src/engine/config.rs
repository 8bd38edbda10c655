//! Viewer configuration, loaded from JSON.
//!
//! Every field has a default so a partial (or missing) file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::math::Vec3;
use crate::engine::xr::{SessionInit, XrFeature};
use crate::engine::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Binary glTF to place. `None` runs with an empty scene.
    pub model_path: Option<String>,
    /// Radians subtracted from the model's Y rotation every frame.
    pub spin_speed: f32,
    pub camera: CameraConfig,
    pub reticle: ReticleConfig,
    pub lighting: LightingConfig,
    pub session: SessionConfig,
    pub simulation: SimulationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            spin_speed: 0.01,
            camera: CameraConfig::default(),
            reticle: ReticleConfig::default(),
            lighting: LightingConfig::default(),
            session: SessionConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let cfg: AppConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let r = &self.reticle;
        if !(r.inner_radius >= 0.0 && r.outer_radius > r.inner_radius) {
            return Err(EngineError::Config(format!(
                "reticle radii must satisfy 0 <= inner < outer (got {} / {})",
                r.inner_radius, r.outer_radius
            )));
        }
        if r.segments < 3 {
            return Err(EngineError::Config("reticle needs at least 3 segments".into()));
        }
        let c = &self.camera;
        if !(c.near > 0.0 && c.far > c.near) {
            return Err(EngineError::Config(format!(
                "camera planes must satisfy 0 < near < far (got {} / {})",
                c.near, c.far
            )));
        }
        if c.min_polar_angle > c.max_polar_angle {
            return Err(EngineError::Config("camera min_polar_angle exceeds max_polar_angle".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    /// Orbit target.
    pub target: Vec3,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 70.0,
            near: 0.1,
            far: 100.0,
            position: [0.0, 0.2, 3.0],
            target: [0.0, 0.2, 0.0],
            min_polar_angle: std::f32::consts::FRAC_PI_2,
            max_polar_angle: std::f32::consts::FRAC_PI_2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReticleConfig {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub segments: u32,
    pub color: u32,
}

impl Default for ReticleConfig {
    fn default() -> Self {
        Self {
            inner_radius: 0.15,
            outer_radius: 0.2,
            segments: 32,
            color: 0xffffff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: Vec3,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.5,
            directional_color: 0xffffff,
            directional_intensity: 1.0,
            directional_position: [0.0, 2.0, 5.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub required_features: Vec<XrFeature>,
    pub optional_features: Vec<XrFeature>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            required_features: vec![XrFeature::HitTest],
            optional_features: Vec::new(),
        }
    }
}

impl SessionConfig {
    pub fn session_init(&self) -> SessionInit {
        SessionInit {
            required_features: self.required_features.clone(),
            optional_features: self.optional_features.clone(),
        }
    }
}

/// Knobs for the in-process simulated XR runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub supports_hit_test: bool,
    /// Frames between a request and its completion.
    pub acquisition_latency_frames: u32,
    pub viewer_position: Vec3,
    /// Pitch of the viewer's pointing ray, negative looks down.
    pub viewer_pitch_degrees: f32,
    pub surfaces: Vec<SurfaceConfig>,
    /// Fail every reference space request.
    pub fail_reference_space: bool,
    /// Fail every hit-test source request.
    pub fail_hit_test_source: bool,
    /// Leave requests pending forever.
    pub never_resolve: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            supports_hit_test: true,
            acquisition_latency_frames: 2,
            viewer_position: [0.0, 1.5, 0.0],
            viewer_pitch_degrees: -45.0,
            surfaces: vec![SurfaceConfig {
                point: [0.0, 0.0, 0.0],
                normal: [0.0, 1.0, 0.0],
            }],
            fail_reference_space: false,
            fail_hit_test_source: false,
            never_resolve: false,
        }
    }
}

/// Infinite plane through `point` with the given `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub point: Vec3,
    pub normal: Vec3,
}
