use glam::Vec3;

use crate::scene::{Axis, NodeId, SceneGraph};

/// Tuning for a bone whose rest pose is specific to one asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    /// Largest pitch magnitude, radians
    pub max_pitch: f32,
    /// Added to the driven Euler angle after clamping, radians
    pub offset: f32,
    /// Multiplies the vertical direction component; `-1` makes an upward
    /// pointer tilt the bone upward on the stock fish rig
    pub sign: f32,
    pub driven_axis: Axis,
    pub locked_axis: Axis,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_pitch: 20.0_f32.to_radians(),
            offset: 1.5,
            sign: -1.0,
            driven_axis: Axis::Z,
            locked_axis: Axis::X,
        }
    }
}

/// Turns a smoothed target into a clamped pitch on one bone
#[derive(Debug, Clone, Copy, Default)]
pub struct BoneOrientationSolver {
    params: SolverParams,
}

impl BoneOrientationSolver {
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Clamped pitch for a bone at `bone_position` tracking `target`
    ///
    /// Only the vertical component of the direction counts. It is scaled by
    /// `max_pitch` before clamping, so the response is gentle near centre.
    pub fn pitch(&self, bone_position: Vec3, target: Vec3) -> f32 {
        let max = self.params.max_pitch.abs();
        let direction = (target - bone_position).normalize_or_zero();
        let pitch = self.params.sign * direction.y;
        (pitch * max).clamp(-max, max)
    }

    /// Override the bone's local rotation for this frame
    ///
    /// Must run after the animation mixer so the override wins. The graph's
    /// world matrices must be current for the bone position. Returns the
    /// clamped pitch, or `None` when the bone does not exist.
    pub fn apply(&self, graph: &mut SceneGraph, bone: NodeId, target: Vec3) -> Option<f32> {
        let position = graph.world_position(bone)?;
        let pitch = self.pitch(position, target);

        let local = graph.local_mut(bone)?;
        let mut angles = local.euler();
        angles[self.params.driven_axis.index()] = pitch + self.params.offset;
        if self.params.locked_axis != self.params.driven_axis {
            angles[self.params.locked_axis.index()] = 0.0;
        }
        local.set_euler(angles);

        Some(pitch)
    }
}
