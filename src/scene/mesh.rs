use glam::{Mat4, Vec3};

use super::graph::{NodeId, SceneGraph};
use crate::math::AABB;

/// Surface colour of a primitive
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// Linear RGBA
    pub base_color: [f32; 4],
}

impl Material {
    pub fn is_translucent(&self) -> bool {
        self.base_color[3] < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

/// Joints and inverse bind matrices of a skinned mesh
#[derive(Debug, Clone)]
pub struct Skin {
    pub joints: Vec<NodeId>,
    pub inverse_bind: Vec<Mat4>,
}

impl Skin {
    /// Per-joint skinning matrices for the graph's current pose
    pub fn joint_matrices(&self, graph: &SceneGraph) -> Vec<Mat4> {
        self.joints
            .iter()
            .enumerate()
            .map(|(i, &joint)| {
                let world = graph.world(joint).unwrap_or(Mat4::IDENTITY);
                let inverse_bind = self.inverse_bind.get(i).copied().unwrap_or(Mat4::IDENTITY);
                world * inverse_bind
            })
            .collect()
    }
}

/// Triangle list attached to a node
#[derive(Debug, Clone)]
pub struct MeshPrimitive {
    pub node: NodeId,
    pub skin: Option<usize>,
    pub material: Option<usize>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl MeshPrimitive {
    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
            && !self.positions.is_empty()
            && self.joints.len() == self.positions.len()
            && self.weights.len() == self.positions.len()
    }

    /// World-space positions and normals for the current pose
    ///
    /// Skinned primitives ignore their node transform and blend joint
    /// matrices instead.
    pub fn deform(&self, graph: &SceneGraph, skins: &[Skin]) -> (Vec<Vec3>, Vec<Vec3>) {
        let skin = self.skin.and_then(|s| skins.get(s)).filter(|_| self.is_skinned());

        match skin {
            Some(skin) => {
                let palette = skin.joint_matrices(graph);
                let mut positions = Vec::with_capacity(self.positions.len());
                let mut normals = Vec::with_capacity(self.positions.len());
                for (i, &position) in self.positions.iter().enumerate() {
                    let matrix = blend_matrix(&palette, self.joints[i], self.weights[i]);
                    positions.push(matrix.transform_point3(position));
                    let normal = self.normals.get(i).copied().unwrap_or(Vec3::Y);
                    normals.push(matrix.transform_vector3(normal).normalize_or_zero());
                }
                (positions, normals)
            }
            None => {
                let world = graph.world(self.node).unwrap_or(Mat4::IDENTITY);
                let normal_matrix = world.inverse().transpose();
                let positions = self.positions.iter().map(|&p| world.transform_point3(p)).collect();
                let normals = self
                    .normals
                    .iter()
                    .map(|&n| normal_matrix.transform_vector3(n).normalize_or_zero())
                    .collect();
                (positions, normals)
            }
        }
    }
}

fn blend_matrix(palette: &[Mat4], joints: [u16; 4], weights: [f32; 4]) -> Mat4 {
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return Mat4::IDENTITY;
    }

    let mut blended = Mat4::ZERO;
    for (joint, weight) in joints.iter().zip(weights) {
        if weight == 0.0 {
            continue;
        }
        let matrix = palette.get(*joint as usize).copied().unwrap_or(Mat4::IDENTITY);
        blended += matrix * (weight / total);
    }
    blended
}

/// Bounds of all primitives in the current pose
pub fn pose_bounds(primitives: &[MeshPrimitive], graph: &SceneGraph, skins: &[Skin]) -> Option<AABB> {
    primitives
        .iter()
        .filter_map(|p| AABB::from_points(p.deform(graph, skins).0))
        .reduce(|a, b| a.union(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::graph::{Node, Transform};

    fn triangle(node: NodeId) -> MeshPrimitive {
        MeshPrimitive {
            node,
            skin: None,
            material: None,
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            joints: vec![],
            weights: vec![],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn static_primitive_follows_node() {
        let nodes = vec![Node::new("Body", Transform::from_translation(Vec3::new(0.0, 0.0, 2.0)))];
        let graph = SceneGraph::new(nodes, &[]);
        let (positions, normals) = triangle(NodeId(0)).deform(&graph, &[]);
        assert_eq!(positions[1], Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(normals[0], Vec3::Z);
    }

    #[test]
    fn skinned_vertex_follows_joint() {
        let nodes = vec![
            Node::new("Mesh", Transform::from_translation(Vec3::new(100.0, 0.0, 0.0))),
            Node::new("Jaw", Transform::from_translation(Vec3::new(0.0, 3.0, 0.0))),
        ];
        let graph = SceneGraph::new(nodes, &[]);
        let skins = vec![Skin {
            joints: vec![NodeId(1)],
            inverse_bind: vec![Mat4::IDENTITY],
        }];

        let mut prim = triangle(NodeId(0));
        prim.skin = Some(0);
        prim.joints = vec![[0, 0, 0, 0]; 3];
        prim.weights = vec![[1.0, 0.0, 0.0, 0.0]; 3];

        let (positions, _) = prim.deform(&graph, &skins);
        assert_eq!(positions[0], Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn short_skin_attributes_fall_back_to_node() {
        let nodes = vec![
            Node::new("Mesh", Transform::from_translation(Vec3::new(0.0, 0.0, 2.0))),
            Node::new("Jaw", Transform::from_translation(Vec3::new(0.0, 3.0, 0.0))),
        ];
        let graph = SceneGraph::new(nodes, &[]);
        let skins = vec![Skin {
            joints: vec![NodeId(1)],
            inverse_bind: vec![Mat4::IDENTITY],
        }];

        let mut prim = triangle(NodeId(0));
        prim.skin = Some(0);
        prim.joints = vec![[0, 0, 0, 0]; 2];
        prim.weights = vec![[1.0, 0.0, 0.0, 0.0]; 2];

        assert!(!prim.is_skinned());
        let (positions, _) = prim.deform(&graph, &skins);
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[1], Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn bounds_cover_all_primitives() {
        let nodes = vec![
            Node::new("A", Transform::IDENTITY),
            Node::new("B", Transform::from_translation(Vec3::new(-4.0, 0.0, 0.0))),
        ];
        let graph = SceneGraph::new(nodes, &[]);
        let prims = vec![triangle(NodeId(0)), triangle(NodeId(1))];
        let bounds = pose_bounds(&prims, &graph, &[]).unwrap();
        assert_eq!(bounds.min, Vec3::new(-4.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }
}
