//! Perspective camera plus orbit controls for the non-immersive preview.

use crate::engine::config::CameraConfig;
use crate::engine::math::{self, Mat4, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 1.0)
    }
}

impl PerspectiveCamera {
    pub fn from_config(cfg: &CameraConfig, aspect: f32) -> Self {
        Self {
            fov_y_radians: cfg.fov_y_degrees.to_radians(),
            aspect,
            near: cfg.near,
            far: cfg.far,
            position: cfg.position,
            target: cfg.target,
        }
    }

    /// Window resized: keep the projection's aspect in step.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    /// Right-handed perspective, column-major, depth in [0, 1]. Maps forward to -Z.
    pub fn projection(&self) -> Mat4 {
        let f = 1.0 / (0.5 * self.fov_y_radians).tan();
        let nf = 1.0 / (self.near - self.far);
        Mat4([
            f / self.aspect, 0.0, 0.0, 0.0, //
            0.0, f, 0.0, 0.0, //
            0.0, 0.0, self.far * nf, -1.0, //
            0.0, 0.0, self.near * self.far * nf, 0.0,
        ])
    }

    /// World -> view (look-at from `position` towards `target`, +Y up).
    pub fn view(&self) -> Mat4 {
        let f = math::normalize(math::sub(self.target, self.position));
        let s = math::normalize(math::cross(f, [0.0, 1.0, 0.0]));
        let u = math::cross(s, f);
        let p = self.position;
        Mat4([
            s[0], u[0], -f[0], 0.0, //
            s[1], u[1], -f[1], 0.0, //
            s[2], u[2], -f[2], 0.0, //
            -math::dot(s, p), -math::dot(u, p), math::dot(f, p), 1.0,
        ])
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection().mul(&self.view())
    }
}

/// Orbit-style manual camera manipulation around a target.
///
/// Polar angle is clamped to `[min_polar, max_polar]`; with both set to π/2 the
/// camera can only circle the model horizontally.
#[derive(Debug, Clone, Copy)]
pub struct OrbitControls {
    pub target: Vec3,
    pub min_polar: f32,
    pub max_polar: f32,
    pub rotate_speed: f32,
    pub enabled: bool,

    radius: f32,
    azimuth: f32,
    polar: f32,
}

impl OrbitControls {
    pub fn new(camera: &PerspectiveCamera, cfg: &CameraConfig) -> Self {
        let offset = math::sub(camera.position, cfg.target);
        let radius = math::dot(offset, offset).sqrt().max(1e-3);
        let azimuth = offset[0].atan2(offset[2]);
        let polar = (offset[1] / radius).clamp(-1.0, 1.0).acos();

        let mut controls = Self {
            target: cfg.target,
            min_polar: cfg.min_polar_angle,
            max_polar: cfg.max_polar_angle,
            rotate_speed: 0.005,
            enabled: true,
            radius,
            azimuth,
            polar,
        };
        controls.polar = controls.polar.clamp(controls.min_polar, controls.max_polar);
        controls
    }

    #[cfg(test)]
    pub fn polar(&self) -> f32 {
        self.polar
    }

    #[cfg(test)]
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Apply a pointer drag in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if !self.enabled {
            return;
        }
        self.azimuth -= dx * self.rotate_speed;
        self.polar = (self.polar - dy * self.rotate_speed).clamp(self.min_polar, self.max_polar);
    }

    /// Write the orbit state back into the camera.
    pub fn update(&self, camera: &mut PerspectiveCamera) {
        let (sp, cp) = self.polar.sin_cos();
        let (sa, ca) = self.azimuth.sin_cos();
        let offset = [self.radius * sp * sa, self.radius * cp, self.radius * sp * ca];
        camera.position = math::add(self.target, offset);
        camera.target = self.target;
    }
}
