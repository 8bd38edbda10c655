//! Placement reticle.
//!
//! A flat ring lying on the detected surface. Its matrix is written straight
//! from the hit-test pose each frame; visibility flips HIDDEN <-> VISIBLE on the
//! tracker's latest answer with no smoothing.

use tracing::debug;

use crate::engine::config::ReticleConfig;
use crate::engine::graphics::{Material, MeshFactory};
use crate::engine::math::{Mat4, Vec3};
use crate::engine::scene::{NodeKey, NodeKind, Scene, SceneNode};
use crate::engine::xr::ReticleUpdate;

#[derive(Debug, Clone, Copy)]
pub struct Reticle {
    node: NodeKey,
}

impl Reticle {
    pub const NODE_NAME: &'static str = "reticle";

    /// Build the marker node (hidden, manual matrix) and add it to `scene`.
    pub fn new(scene: &mut Scene, cfg: &ReticleConfig) -> Self {
        let mesh = MeshFactory::ring(cfg.inner_radius, cfg.outer_radius, cfg.segments)
            .transformed(&Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        let material = Material {
            color: cfg.color,
            ..Material::BASIC_WHITE
        };

        let mut node = SceneNode::new(Self::NODE_NAME, NodeKind::Mesh { mesh, material });
        node.matrix_auto_update = false;
        node.visible = false;

        Self {
            node: scene.add(node),
        }
    }

    pub fn node(&self) -> NodeKey {
        self.node
    }

    pub fn update(&self, scene: &mut Scene, transform: Mat4, visible: bool) {
        if let Some(n) = scene.get_mut(self.node) {
            n.matrix = transform;
            n.visible = visible;
        }
    }

    /// Apply the tracker's verdict. `Hide` keeps the old matrix around.
    pub fn apply(&self, scene: &mut Scene, update: ReticleUpdate) {
        match update {
            ReticleUpdate::Show(transform) => self.update(scene, transform, true),
            ReticleUpdate::Hide => self.hide(scene),
            ReticleUpdate::Unchanged => {}
        }
    }

    pub fn hide(&self, scene: &mut Scene) {
        if let Some(n) = scene.get_mut(self.node) {
            n.visible = false;
        }
    }

    pub fn current_visible(&self, scene: &Scene) -> bool {
        scene.get(self.node).is_some_and(|n| n.visible)
    }

    pub fn current_transform(&self, scene: &Scene) -> Mat4 {
        scene.get(self.node).map(|n| n.matrix).unwrap_or_default()
    }

    /// Place `target` at the reticle if it is showing.
    ///
    /// Returns the new position, or `None` (target untouched) when the reticle
    /// is hidden or the target node is gone.
    pub fn on_select(&self, scene: &mut Scene, target: NodeKey) -> Option<Vec3> {
        if !self.current_visible(scene) {
            debug!("select ignored: reticle hidden");
            return None;
        }
        let position = self.current_transform(scene).translation();

        let node = scene.get_mut(target)?;
        node.position = position;
        node.update_matrix();
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::xr::Pose;

    fn setup() -> (Scene, Reticle, NodeKey) {
        let mut scene = Scene::new();
        let reticle = Reticle::new(&mut scene, &ReticleConfig::default());
        let model = scene.add(SceneNode::new("model", NodeKind::Group));
        (scene, reticle, model)
    }

    #[test]
    fn starts_hidden_with_manual_matrix() {
        let (scene, reticle, _) = setup();
        assert!(!reticle.current_visible(&scene));
        assert!(!scene.get(reticle.node()).unwrap().matrix_auto_update);
        assert_eq!(scene.get(reticle.node()).unwrap().name, Reticle::NODE_NAME);
    }

    #[test]
    fn show_then_hide_keeps_stale_matrix() {
        let (mut scene, reticle, _) = setup();
        let m = Mat4::from_translation([1.0, 0.0, -2.0]);

        reticle.apply(&mut scene, ReticleUpdate::Show(m));
        assert!(reticle.current_visible(&scene));
        assert_eq!(reticle.current_transform(&scene), m);

        reticle.apply(&mut scene, ReticleUpdate::Hide);
        assert!(!reticle.current_visible(&scene));
        assert_eq!(reticle.current_transform(&scene), m);

        reticle.apply(&mut scene, ReticleUpdate::Unchanged);
        assert!(!reticle.current_visible(&scene));
    }

    #[test]
    fn select_copies_translation_when_visible() {
        let (mut scene, reticle, model) = setup();
        let pose = Pose::new([0.5, 0.0, -1.25], [0.0, 0.38268343, 0.0, 0.9238795]);
        reticle.update(&mut scene, pose.to_matrix(), true);

        assert_eq!(reticle.on_select(&mut scene, model), Some([0.5, 0.0, -1.25]));
        let node = scene.get(model).unwrap();
        assert_eq!(node.position, [0.5, 0.0, -1.25]);
        assert_eq!(node.matrix.translation(), [0.5, 0.0, -1.25]);
    }

    #[test]
    fn select_is_noop_when_hidden() {
        let (mut scene, reticle, model) = setup();
        scene.get_mut(model).unwrap().position = [9.0, 9.0, 9.0];
        reticle.update(&mut scene, Mat4::from_translation([1.0, 1.0, 1.0]), false);

        assert_eq!(reticle.on_select(&mut scene, model), None);
        assert_eq!(scene.get(model).unwrap().position, [9.0, 9.0, 9.0]);
    }
}
