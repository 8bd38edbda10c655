// Backend-free renderer: walks the scene each frame and builds the draw list a
// GPU backend would submit. Invisible nodes (and everything under them) are
// skipped here, which is what makes a hidden reticle disappear. Nodes behind
// the camera are culled before submission, and each draw carries its shaded
// flat colour.

use serde::Serialize;
use tracing::trace;

use crate::engine::camera::PerspectiveCamera;
use crate::engine::graphics::Material;
use crate::engine::math::Mat4;
use crate::engine::scene::{NodeKey, NodeKind, Scene};

#[derive(Debug, Clone, Copy, PartialEq)]
struct DrawItem {
    node: NodeKey,
    /// Model -> world.
    world: Mat4,
    index_count: u32,
    /// Shaded RGBA.
    color: [f32; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    pub draws: usize,
    /// Indices submitted across all draws.
    pub indices: u64,
    /// Visible nodes dropped because their origin sits behind the camera.
    pub culled: usize,
    pub lights: usize,
}

#[derive(Debug, Default)]
pub struct Renderer {
    frame: u64,
    draw_list: Vec<DrawItem>,
}

fn rgb(color: u32) -> [f32; 3] {
    [
        ((color >> 16) & 0xff) as f32 / 255.0,
        ((color >> 8) & 0xff) as f32 / 255.0,
        (color & 0xff) as f32 / 255.0,
    ]
}

/// Clip-space w of `world`'s origin; zero or less is behind the eye.
fn clip_w(view_projection: &Mat4, world: &Mat4) -> f32 {
    let m = &view_projection.0;
    let [x, y, z] = world.translation();
    m[3] * x + m[7] * y + m[11] * z + m[15]
}

/// Flat shading: lit materials are scaled by the summed light, clamped to 1.
fn shade(material: &Material, light: [f32; 3]) -> [f32; 4] {
    let base = rgb(material.color);
    let lit = |i: usize| {
        if material.unlit {
            base[i]
        } else {
            (base[i] * light[i]).min(1.0)
        }
    };
    [lit(0), lit(1), lit(2), material.opacity]
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_drawn(&self, node: NodeKey) -> bool {
        self.draw_list.iter().any(|d| d.node == node)
    }

    /// Colour `node` was drawn with by the last `render`.
    pub fn drawn_color(&self, node: NodeKey) -> Option<[f32; 4]> {
        self.draw_list.iter().find(|d| d.node == node).map(|d| d.color)
    }

    pub fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> FrameStats {
        self.frame += 1;
        let view_projection = camera.view_projection();
        self.draw_list.clear();

        let mut lights = 0;
        let mut light = [0.0f32; 3];
        let mut candidates = Vec::new();
        scene.traverse_visible(|key, node, world| match &node.kind {
            NodeKind::Mesh { mesh, material } => {
                candidates.push((key, *world, mesh.index_count(), Some(*material)))
            }
            NodeKind::Model { source, meshes } => {
                trace!(name = %node.name, %source, meshes, "model draw");
                candidates.push((key, *world, 0, None));
            }
            NodeKind::AmbientLight { color, intensity }
            | NodeKind::DirectionalLight { color, intensity } => {
                lights += 1;
                for (sum, c) in light.iter_mut().zip(rgb(*color)) {
                    *sum += c * intensity;
                }
            }
            NodeKind::Group => {}
        });

        let total = candidates.len();
        self.draw_list.extend(
            candidates
                .into_iter()
                .filter(|(_, world, _, _)| clip_w(&view_projection, world) > 0.0)
                .map(|(node, world, index_count, material)| DrawItem {
                    node,
                    world,
                    index_count,
                    color: material.map_or([1.0; 4], |m| shade(&m, light)),
                }),
        );

        let stats = FrameStats {
            frame: self.frame,
            draws: self.draw_list.len(),
            indices: self.draw_list.iter().map(|d| d.index_count as u64).sum(),
            culled: total - self.draw_list.len(),
            lights,
        };
        trace!(?stats, "frame rendered");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::MeshFactory;
    use crate::engine::scene::SceneNode;

    fn mesh_node(name: &str) -> SceneNode {
        SceneNode::new(
            name,
            NodeKind::Mesh {
                mesh: MeshFactory::ring(0.1, 0.2, 8),
                material: Material::BASIC_WHITE,
            },
        )
    }

    #[test]
    fn invisible_nodes_are_skipped() {
        let mut scene = Scene::new();
        let shown = scene.add(mesh_node("shown"));
        let hidden = scene.add(mesh_node("hidden"));
        scene.get_mut(hidden).unwrap().visible = false;

        let mut r = Renderer::new();
        let stats = r.render(&scene, &PerspectiveCamera::default());

        assert_eq!(stats.draws, 1);
        assert_eq!(stats.indices, 8 * 6);
        assert!(r.is_drawn(shown));
        assert!(!r.is_drawn(hidden));
    }

    #[test]
    fn lights_are_counted_not_drawn() {
        let mut scene = Scene::new();
        scene.add(SceneNode::new(
            "ambient",
            NodeKind::AmbientLight {
                color: 0xffffff,
                intensity: 0.5,
            },
        ));

        let mut r = Renderer::new();
        let stats = r.render(&scene, &PerspectiveCamera::default());
        assert_eq!(stats.lights, 1);
        assert_eq!(stats.draws, 0);
        assert_eq!(stats.frame, 1);
    }

    #[test]
    fn nodes_behind_camera_are_culled() {
        let mut scene = Scene::new();
        let ahead = scene.add(mesh_node("ahead").with_position([0.0, 0.0, -2.0]));
        let behind = scene.add(mesh_node("behind").with_position([0.0, 0.0, 10.0]));
        scene.update_matrices();

        // default camera sits at z = 3 looking at the origin
        let mut r = Renderer::new();
        let stats = r.render(&scene, &PerspectiveCamera::default());

        assert_eq!(stats.draws, 1);
        assert_eq!(stats.culled, 1);
        assert!(r.is_drawn(ahead));
        assert!(!r.is_drawn(behind));
    }

    #[test]
    fn lit_materials_scale_with_lights_unlit_do_not() {
        let grey = Material {
            color: 0x808080,
            opacity: 0.5,
            unlit: false,
        };
        let mut scene = Scene::new();
        let lit = scene.add(SceneNode::new(
            "lit",
            NodeKind::Mesh {
                mesh: MeshFactory::ring(0.1, 0.2, 8),
                material: grey,
            },
        ));
        let flat = scene.add(mesh_node("flat"));
        scene.add(SceneNode::new(
            "ambient",
            NodeKind::AmbientLight {
                color: 0xffffff,
                intensity: 0.5,
            },
        ));

        let mut r = Renderer::new();
        r.render(&scene, &PerspectiveCamera::default());

        let c = r.drawn_color(lit).unwrap();
        assert!((c[0] - 0.5 * 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c[3], 0.5);
        assert_eq!(r.drawn_color(flat), Some([1.0; 4]));
    }
}
