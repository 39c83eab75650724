use glam::{EulerRot, Mat4, Quat, Vec3};
use std::collections::HashMap;

/// Index of a node inside a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Axis of an intrinsic XYZ Euler decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Translation, rotation and scale of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Rotation as intrinsic XYZ Euler angles (`R = Rx * Ry * Rz`)
    pub fn euler(&self) -> [f32; 3] {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        [x, y, z]
    }

    pub fn set_euler(&mut self, angles: [f32; 3]) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, angles[0], angles[1], angles[2]);
    }

    pub fn euler_angle(&self, axis: Axis) -> f32 {
        self.euler()[axis.index()]
    }

    /// Overwrite one Euler angle, keeping the other two
    pub fn set_euler_angle(&mut self, axis: Axis, angle: f32) {
        let mut angles = self.euler();
        angles[axis.index()] = angle;
        self.set_euler(angles);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub local: Transform,
    world: Mat4,
}

impl Node {
    pub fn new(name: impl Into<String>, local: Transform) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local,
            world: Mat4::IDENTITY,
        }
    }

    /// World matrix as of the last [`SceneGraph::update_world`]
    pub fn world(&self) -> Mat4 {
        self.world
    }

    pub fn world_position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }
}

/// Node hierarchy of a loaded model
///
/// Nodes live in a flat arena addressed by [`NodeId`]. The name index is
/// built once on construction; lookups never walk the hierarchy.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    names: HashMap<String, NodeId>,
}

impl SceneGraph {
    /// Build a graph from nodes and `(parent, child)` links
    ///
    /// Links referencing nodes out of range are ignored. A node given a
    /// second parent keeps the first one.
    pub fn new(mut nodes: Vec<Node>, links: &[(usize, usize)]) -> Self {
        for &(parent, child) in links {
            if parent >= nodes.len() || child >= nodes.len() || parent == child {
                continue;
            }
            if nodes[child].parent.is_some() {
                continue;
            }
            nodes[child].parent = Some(NodeId(parent));
            nodes[parent].children.push(NodeId(child));
        }

        let roots = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| NodeId(index))
            .collect();

        let mut names = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if !node.name.is_empty() {
                names.entry(node.name.clone()).or_insert(NodeId(index));
            }
        }

        let mut graph = Self { nodes, roots, names };
        graph.update_world(Mat4::IDENTITY);
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Exact-name lookup through the prebuilt index
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn local(&self, id: NodeId) -> Option<&Transform> {
        self.node(id).map(|n| &n.local)
    }

    pub fn local_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.node_mut(id).map(|n| &mut n.local)
    }

    pub fn world(&self, id: NodeId) -> Option<Mat4> {
        self.node(id).map(Node::world)
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(Node::world_position)
    }

    /// Recompute every world matrix below `root_matrix`
    pub fn update_world(&mut self, root_matrix: Mat4) {
        let mut stack: Vec<(NodeId, Mat4)> =
            self.roots.iter().rev().map(|&id| (id, root_matrix)).collect();

        while let Some((id, parent_world)) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.world = parent_world * node.local.matrix();
            let world = node.world;
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn chain() -> SceneGraph {
        let nodes = vec![
            Node::new("Root", Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
            Node::new("Spine", Transform::from_translation(Vec3::new(0.0, 2.0, 0.0))),
            Node::new("Head", Transform::from_translation(Vec3::new(1.0, 0.0, 0.0))),
        ];
        SceneGraph::new(nodes, &[(0, 1), (1, 2)])
    }

    #[test]
    fn world_positions_compose_parents() {
        let graph = chain();
        let head = graph.find("Head").unwrap();
        assert_eq!(graph.world_position(head), Some(Vec3::new(1.0, 3.0, 0.0)));
    }

    #[test]
    fn root_matrix_applies_to_every_node() {
        let mut graph = chain();
        graph.update_world(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
        let head = graph.find("Head").unwrap();
        assert_eq!(graph.world_position(head), Some(Vec3::new(1.0, 3.0, -5.0)));
    }

    #[test]
    fn rotation_propagates_to_children() {
        let mut graph = chain();
        let spine = graph.find("Spine").unwrap();
        graph.local_mut(spine).unwrap().rotation = Quat::from_rotation_z(FRAC_PI_2);
        graph.update_world(Mat4::IDENTITY);

        let head = graph.find("Head").unwrap();
        let pos = graph.world_position(head).unwrap();
        assert!((pos - Vec3::new(0.0, 4.0, 0.0)).length() < 1e-5, "got {pos:?}");
    }

    #[test]
    fn roots_and_unknown_names() {
        let graph = chain();
        assert_eq!(graph.roots(), &[NodeId(0)]);
        assert!(graph.find("Tail").is_none());
        assert!(graph.find("head").is_none());
    }

    #[test]
    fn duplicate_names_resolve_to_first() {
        let nodes = vec![
            Node::new("Bone", Transform::IDENTITY),
            Node::new("Bone", Transform::IDENTITY),
        ];
        let graph = SceneGraph::new(nodes, &[(0, 1)]);
        assert_eq!(graph.find("Bone"), Some(NodeId(0)));
    }

    #[test]
    fn set_euler_angle_keeps_other_axes() {
        let mut t = Transform::IDENTITY;
        t.set_euler([0.2, -0.3, 0.4]);
        t.set_euler_angle(Axis::Z, 1.0);
        let [x, y, z] = t.euler();
        assert!((x - 0.2).abs() < 1e-5);
        assert!((y + 0.3).abs() < 1e-5);
        assert!((z - 1.0).abs() < 1e-5);
    }
}
