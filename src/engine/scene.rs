//! Scene graph: a flat slotmap of nodes with parent links.
//!
//! Nodes either derive their local matrix from position/rotation/scale every
//! update (`matrix_auto_update`), or carry a matrix written directly by the
//! caller (the reticle, whose matrix comes straight from a hit-test pose).

use slotmap::{SlotMap, new_key_type};

use crate::engine::graphics::{CpuMesh, Material};
use crate::engine::math::{self, Mat4, Quat, Vec3};

new_key_type! {
    pub struct NodeKey;
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh { mesh: CpuMesh, material: Material },
    /// Loaded model root; `meshes` is what the loader reported.
    Model { source: String, meshes: usize },
    AmbientLight { color: u32, intensity: f32 },
    DirectionalLight { color: u32, intensity: f32 },
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,

    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Euler Y, folded into `rotation` on update. Kept separately so spin can
    /// accumulate without drift.
    pub rotation_y: f32,

    pub matrix: Mat4,
    pub matrix_auto_update: bool,
    pub visible: bool,

    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            position: [0.0; 3],
            rotation: math::QUAT_IDENTITY,
            scale: [1.0; 3],
            rotation_y: 0.0,
            matrix: Mat4::IDENTITY,
            matrix_auto_update: true,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn update_matrix(&mut self) {
        if !self.matrix_auto_update {
            return;
        }
        let spin = math::quat_from_axis_angle([0.0, 1.0, 0.0], self.rotation_y);
        let rotation = math::quat_mul(self.rotation, spin);
        self.matrix = Mat4::from_trs(self.position, rotation, self.scale);
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeKey, SceneNode>,
    roots: Vec<NodeKey>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at the scene root.
    pub fn add(&mut self, mut node: SceneNode) -> NodeKey {
        node.update_matrix();
        let key = self.nodes.insert(node);
        self.roots.push(key);
        key
    }

    /// Add a node under `parent`. Returns `None` if the parent is gone.
    #[cfg(test)]
    pub fn add_child(&mut self, parent: NodeKey, mut node: SceneNode) -> Option<NodeKey> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        node.parent = Some(parent);
        node.update_matrix();
        let key = self.nodes.insert(node);
        self.nodes[parent].children.push(key);
        Some(key)
    }

    /// Remove a node and all its descendants.
    pub fn remove(&mut self, key: NodeKey) -> Option<SceneNode> {
        let node = self.nodes.remove(key)?;
        match node.parent {
            Some(p) => {
                if let Some(parent) = self.nodes.get_mut(p) {
                    parent.children.retain(|c| *c != key);
                }
            }
            None => self.roots.retain(|r| *r != key),
        }
        for child in node.children.clone() {
            self.remove(child);
        }
        Some(node)
    }

    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Recompute local matrices of auto-updating nodes.
    pub fn update_matrices(&mut self) {
        for (_, node) in self.nodes.iter_mut() {
            node.update_matrix();
        }
    }

    /// Visit every node reachable through visible ancestors, with its world matrix.
    pub fn traverse_visible(&self, mut f: impl FnMut(NodeKey, &SceneNode, &Mat4)) {
        let mut stack: Vec<(NodeKey, Mat4)> =
            self.roots.iter().rev().map(|k| (*k, Mat4::IDENTITY)).collect();

        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world.mul(&node.matrix);
            f(key, node, &world);
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
    }
}
