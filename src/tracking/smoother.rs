use glam::Vec3;

pub const DEFAULT_ALPHA: f32 = 0.2;

/// First-order exponential low-pass filter over a 3D point
///
/// Each defined sample moves the output `alpha` of the way toward it.
/// Frames without a sample leave the output untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSmoother {
    value: Vec3,
    alpha: f32,
}

impl TargetSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            value: Vec3::ZERO,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn value(&self) -> Vec3 {
        self.value
    }

    pub fn update(&mut self, sample: Option<Vec3>) -> Vec3 {
        if let Some(target) = sample {
            self.value += (target - self.value) * self.alpha;
        }
        self.value
    }

    pub fn reset(&mut self, value: Vec3) {
        self.value = value;
    }
}

impl Default for TargetSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}
