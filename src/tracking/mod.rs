//! Cursor-reactive bone controller
//!
//! Per frame, in order: the freshest [`PointerSample`] is cast onto the
//! reference plane ([`TargetProjector`]), blended into a persistent target
//! ([`TargetSmoother`]) and turned into a clamped pitch on the designated
//! bone ([`BoneOrientationSolver`]).

pub mod pointer;
pub mod projector;
pub mod smoother;
pub mod solver;

pub use pointer::{PointerSample, PointerSampler};
pub use projector::{reference_plane, TargetProjector};
pub use smoother::{TargetSmoother, DEFAULT_ALPHA};
pub use solver::{BoneOrientationSolver, SolverParams};

use glam::Vec3;

use crate::camera::PerspectiveCamera;
use crate::scene::{NodeId, SceneGraph};

pub struct HeadTracker {
    bone_name: String,
    bone: Option<NodeId>,
    projector: TargetProjector,
    smoother: TargetSmoother,
    solver: BoneOrientationSolver,
    last_pitch: Option<f32>,
}

impl HeadTracker {
    pub fn new(bone_name: impl Into<String>, alpha: f32, params: SolverParams) -> Self {
        Self {
            bone_name: bone_name.into(),
            bone: None,
            projector: TargetProjector::default(),
            smoother: TargetSmoother::new(alpha),
            solver: BoneOrientationSolver::new(params),
            last_pitch: None,
        }
    }

    /// Resolve the designated bone in a freshly loaded graph
    pub fn bind(&mut self, graph: &SceneGraph) -> Option<NodeId> {
        self.bone = graph.find(&self.bone_name);
        match self.bone {
            Some(id) => log::info!("Tracking bone '{}' (node {})", self.bone_name, id.0),
            None => log::debug!("Bone '{}' not found; head tracking disabled", self.bone_name),
        }
        self.bone
    }

    pub fn unbind(&mut self) {
        self.bone = None;
        self.last_pitch = None;
    }

    pub fn bone(&self) -> Option<NodeId> {
        self.bone
    }

    pub fn bone_name(&self) -> &str {
        &self.bone_name
    }

    pub fn smoothed_target(&self) -> Vec3 {
        self.smoother.value()
    }

    /// Pitch applied on the most recent frame with a bound bone
    pub fn last_pitch(&self) -> Option<f32> {
        self.last_pitch
    }

    /// Project the pointer and advance the smoothed target
    pub fn track(&mut self, camera: &PerspectiveCamera, pointer: PointerSample) -> Vec3 {
        let projected = self.projector.project(camera, pointer);
        self.smoother.update(projected)
    }

    /// Feed an already projected point (or a miss) to the smoother
    pub fn track_point(&mut self, projected: Option<Vec3>) -> Vec3 {
        self.smoother.update(projected)
    }

    /// Orient the bound bone toward the smoothed target; no-op when unbound
    pub fn orient(&mut self, graph: &mut SceneGraph) -> Option<f32> {
        let bone = self.bone?;
        self.last_pitch = self.solver.apply(graph, bone, self.smoother.value());
        self.last_pitch
    }
}
