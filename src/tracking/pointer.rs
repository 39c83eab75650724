use glam::Vec2;

/// Latest pointer position in normalized device coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
}

impl PointerSample {
    /// Map window pixel coordinates (origin top-left) to NDC
    ///
    /// `width` and `height` must be positive; callers skip events while the
    /// viewport is collapsed.
    pub fn from_screen(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: (x / width) * 2.0 - 1.0,
            y: -(y / height) * 2.0 + 1.0,
        }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Holds the freshest pointer sample; older samples are discarded
#[derive(Debug, Clone, Default)]
pub struct PointerSampler {
    sample: PointerSample,
    viewport: (u32, u32),
}

impl PointerSampler {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            sample: PointerSample::default(),
            viewport: (width, height),
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Record a pointer move in window pixels
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let (width, height) = self.viewport;
        if width == 0 || height == 0 {
            return;
        }
        self.sample = PointerSample::from_screen(x, y, width as f32, height as f32);
    }

    pub fn sample(&self) -> PointerSample {
        self.sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_maps_to_origin() {
        let sample = PointerSample::from_screen(400.0, 300.0, 800.0, 600.0);
        assert_eq!(sample, PointerSample { x: 0.0, y: 0.0 });
    }

    #[test]
    fn top_left_maps_to_minus_one_one() {
        let sample = PointerSample::from_screen(0.0, 0.0, 800.0, 600.0);
        assert_eq!(sample, PointerSample { x: -1.0, y: 1.0 });
    }

    #[test]
    fn bottom_right_maps_to_one_minus_one() {
        let sample = PointerSample::from_screen(800.0, 600.0, 800.0, 600.0);
        assert_eq!(sample, PointerSample { x: 1.0, y: -1.0 });
    }

    #[test]
    fn sampler_keeps_only_latest() {
        let mut sampler = PointerSampler::new(200, 100);
        sampler.pointer_moved(0.0, 0.0);
        sampler.pointer_moved(200.0, 50.0);
        assert_eq!(sampler.sample(), PointerSample { x: 1.0, y: 0.0 });
    }

    #[test]
    fn sampler_ignores_collapsed_viewport() {
        let mut sampler = PointerSampler::new(0, 100);
        sampler.pointer_moved(10.0, 10.0);
        assert_eq!(sampler.sample(), PointerSample::default());
    }
}
