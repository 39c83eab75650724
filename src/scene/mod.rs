pub mod animation;
pub mod graph;
pub mod mesh;

pub use animation::{AnimationMixer, Channel, Clip, ClipAction, Interpolation, LoopMode, Track};
pub use graph::{Axis, Node, NodeId, SceneGraph, Transform};
pub use mesh::{pose_bounds, Material, MeshPrimitive, Skin};
