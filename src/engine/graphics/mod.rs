pub mod mesh;
pub mod renderer;

pub use mesh::{CpuMesh, MeshFactory};
pub use renderer::{FrameStats, Renderer};

/// Flat-colour surface material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// 0xRRGGBB
    pub color: u32,
    pub opacity: f32,
    /// Unlit materials ignore scene lights.
    pub unlit: bool,
}

impl Material {
    pub const BASIC_WHITE: Material = Material {
        color: 0xffffff,
        opacity: 1.0,
        unlit: true,
    };
}
