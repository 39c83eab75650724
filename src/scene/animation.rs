use glam::{Quat, Vec3};

use super::graph::{NodeId, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
}

/// Keyframed curve over `T`; times are ascending and non-negative
#[derive(Debug, Clone)]
pub struct Track<T> {
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: Vec<T>,
}

trait Blend: Copy {
    fn blend(a: Self, b: Self, t: f32) -> Self;
}

impl Blend for Vec3 {
    fn blend(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }
}

impl Blend for Quat {
    fn blend(a: Self, b: Self, t: f32) -> Self {
        // Shortest path
        let b = if a.dot(b) < 0.0 { -b } else { b };
        a.slerp(b, t).normalize()
    }
}

impl<T: Copy> Track<T> {
    pub fn new(interpolation: Interpolation, times: Vec<f32>, values: Vec<T>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self {
            interpolation,
            times,
            values,
        }
    }

    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Index of the segment containing `time` and the blend factor within it
    fn locate(&self, time: f32) -> Option<(usize, f32)> {
        let last = self.times.len().checked_sub(1)?;
        if last == 0 || time <= self.times[0] {
            return Some((0, 0.0));
        }
        if time >= self.times[last] {
            return Some((last, 0.0));
        }

        let upper = self.times.partition_point(|&t| t <= time);
        let lower = upper - 1;
        let span = self.times[upper] - self.times[lower];
        let factor = if span > 0.0 {
            (time - self.times[lower]) / span
        } else {
            0.0
        };
        Some((lower, factor))
    }
}

impl Track<Vec3> {
    pub fn sample(&self, time: f32) -> Option<Vec3> {
        sample_track(self, time)
    }
}

impl Track<Quat> {
    pub fn sample(&self, time: f32) -> Option<Quat> {
        sample_track(self, time)
    }
}

fn sample_track<T: Blend>(track: &Track<T>, time: f32) -> Option<T> {
    let (index, factor) = track.locate(time)?;
    let a = track.values[index];
    if factor == 0.0 || track.interpolation == Interpolation::Step {
        return Some(a);
    }
    Some(T::blend(a, track.values[index + 1], factor))
}

/// Animated properties of one node
#[derive(Debug, Clone)]
pub struct Channel {
    pub node: NodeId,
    pub translation: Option<Track<Vec3>>,
    pub rotation: Option<Track<Quat>>,
    pub scale: Option<Track<Vec3>>,
}

impl Channel {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            translation: None,
            rotation: None,
            scale: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.translation.is_none() && self.rotation.is_none() && self.scale.is_none()
    }

    fn duration(&self) -> f32 {
        let t = self.translation.as_ref().map_or(0.0, Track::duration);
        let r = self.rotation.as_ref().map_or(0.0, Track::duration);
        let s = self.scale.as_ref().map_or(0.0, Track::duration);
        t.max(r).max(s)
    }
}

/// Skeletal animation clip
#[derive(Debug, Clone)]
pub struct Clip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl Clip {
    /// Build a clip whose duration is its last keyframe time
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels.iter().map(Channel::duration).fold(0.0, f32::max);
        Self {
            name: name.into(),
            duration,
            channels,
        }
    }

    /// Write the pose at `time` into the graph's local transforms
    ///
    /// `weight` below 1 blends from the current local values toward the
    /// sampled pose.
    pub fn apply(&self, graph: &mut SceneGraph, time: f32, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        if weight == 0.0 {
            return;
        }

        for channel in &self.channels {
            let Some(local) = graph.local_mut(channel.node) else {
                continue;
            };
            if let Some(value) = channel.translation.as_ref().and_then(|t| t.sample(time)) {
                local.translation = local.translation.lerp(value, weight);
            }
            if let Some(value) = channel.rotation.as_ref().and_then(|t| t.sample(time)) {
                local.rotation = Quat::blend(local.rotation, value, weight);
            }
            if let Some(value) = channel.scale.as_ref().and_then(|t| t.sample(time)) {
                local.scale = local.scale.lerp(value, weight);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Repeat,
    Once,
}

/// Playback state of a single clip
#[derive(Debug, Clone)]
pub struct ClipAction {
    clip: Clip,
    pub time: f32,
    pub time_scale: f32,
    pub weight: f32,
    pub loop_mode: LoopMode,
    pub enabled: bool,
}

impl ClipAction {
    pub fn new(clip: Clip) -> Self {
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Repeat,
            enabled: true,
        }
    }

    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    fn advance(&mut self, delta: f32) {
        let duration = self.clip.duration;
        self.time += delta * self.time_scale;

        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        self.time = match self.loop_mode {
            LoopMode::Repeat => self.time.rem_euclid(duration),
            LoopMode::Once => self.time.clamp(0.0, duration),
        };
    }
}

/// Drives clip playback on a scene graph
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    actions: Vec<ClipAction>,
    max_delta: Option<f32>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp every update step to `max_delta` seconds
    pub fn with_max_delta(mut self, max_delta: Option<f32>) -> Self {
        self.max_delta = max_delta.filter(|d| *d > 0.0);
        self
    }

    /// Start playing `clip` and return its action index
    pub fn play(&mut self, clip: Clip) -> usize {
        self.actions.push(ClipAction::new(clip));
        self.actions.len() - 1
    }

    pub fn actions(&self) -> &[ClipAction] {
        &self.actions
    }

    pub fn action_mut(&mut self, index: usize) -> Option<&mut ClipAction> {
        self.actions.get_mut(index)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Advance all enabled actions and pose the graph
    pub fn update(&mut self, delta: f32, graph: &mut SceneGraph) {
        let delta = match self.max_delta {
            Some(max) => delta.min(max),
            None => delta,
        };

        for action in self.actions.iter_mut().filter(|a| a.enabled) {
            action.advance(delta);
            action.clip.apply(graph, action.time, action.weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::graph::{Node, Transform};
    use std::f32::consts::FRAC_PI_2;

    fn linear(times: &[f32], values: &[Vec3]) -> Track<Vec3> {
        Track::new(Interpolation::Linear, times.to_vec(), values.to_vec())
    }

    #[test]
    fn linear_track_interpolates() {
        let track = linear(&[0.0, 1.0], &[Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)]);
        assert_eq!(track.sample(0.25), Some(Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn track_clamps_outside_range() {
        let track = linear(&[0.5, 1.0], &[Vec3::X, Vec3::Y]);
        assert_eq!(track.sample(0.0), Some(Vec3::X));
        assert_eq!(track.sample(3.0), Some(Vec3::Y));
    }

    #[test]
    fn step_track_holds_previous_key() {
        let track = Track::new(Interpolation::Step, vec![0.0, 1.0], vec![Vec3::X, Vec3::Y]);
        assert_eq!(track.sample(0.99), Some(Vec3::X));
        assert_eq!(track.sample(1.0), Some(Vec3::Y));
    }

    #[test]
    fn empty_track_samples_nothing() {
        let track: Track<Vec3> = Track::new(Interpolation::Linear, vec![], vec![]);
        assert_eq!(track.sample(0.0), None);
    }

    #[test]
    fn rotation_track_slerps() {
        let track = Track::new(
            Interpolation::Linear,
            vec![0.0, 1.0],
            vec![Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2)],
        );
        let mid = track.sample(0.5).unwrap();
        let expected = Quat::from_rotation_z(FRAC_PI_2 * 0.5);
        assert!(mid.dot(expected).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn mixer_loops_and_caps_delta() {
        let nodes = vec![Node::new("Fin", Transform::IDENTITY)];
        let mut graph = SceneGraph::new(nodes, &[]);
        let mut channel = Channel::new(NodeId(0));
        channel.translation = Some(linear(&[0.0, 1.0], &[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)]));

        let mut mixer = AnimationMixer::new().with_max_delta(Some(0.25));
        mixer.play(Clip::new("swim", vec![channel]));

        mixer.update(10.0, &mut graph);
        assert!((mixer.actions()[0].time - 0.25).abs() < 1e-6);

        for _ in 0..4 {
            mixer.update(0.25, &mut graph);
        }
        assert!((mixer.actions()[0].time - 0.25).abs() < 1e-5);
        let x = graph.local(NodeId(0)).unwrap().translation.x;
        assert!((x - 0.25).abs() < 1e-5);
    }
}
