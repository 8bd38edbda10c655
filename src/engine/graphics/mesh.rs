//! Procedural geometry for engine-owned markers (the placement reticle).

use crate::engine::math::Mat4;

/// Object-space vertex position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuVertex {
    pub pos: [f32; 3],
}

/// Indexed triangle list kept on the CPU until a backend uploads it.
#[derive(Debug, Clone)]
pub struct CpuMesh {
    pub vertices: Vec<CpuVertex>,
    pub indices_u32: Vec<u32>,
}

impl CpuMesh {
    pub fn new(vertices: Vec<CpuVertex>, indices_u32: Vec<u32>) -> Self {
        Self {
            vertices,
            indices_u32,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices_u32.len() as u32
    }

    /// Bake a transform into the vertex positions.
    pub fn transformed(mut self, m: &Mat4) -> Self {
        for v in self.vertices.iter_mut() {
            v.pos = m.transform_point(v.pos);
        }
        self
    }
}

/// Counter-clockwise front faces.
pub struct MeshFactory;

impl MeshFactory {
    /// Flat annulus in the XY plane, facing +Z.
    ///
    /// Two vertex rings (inner then outer), `segments + 1` vertices each; the
    /// seam vertex is duplicated.
    pub fn ring(inner_radius: f32, outer_radius: f32, segments: u32) -> CpuMesh {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(2 * (segments as usize + 1));

        for radius in [inner_radius, outer_radius] {
            for i in 0..=segments {
                let t = i as f32 / segments as f32;
                let theta = t * std::f32::consts::TAU;
                let (s, c) = theta.sin_cos();
                vertices.push(CpuVertex {
                    pos: [radius * c, radius * s, 0.0],
                });
            }
        }

        let stride = segments + 1;
        let mut indices = Vec::with_capacity(segments as usize * 6);
        for i in 0..segments {
            let inner_a = i;
            let inner_b = i + 1;
            let outer_a = stride + i;
            let outer_b = stride + i + 1;
            indices.extend_from_slice(&[inner_a, outer_a, outer_b, inner_a, outer_b, inner_b]);
        }

        CpuMesh::new(vertices, indices)
    }
}
