/// Frames-per-second estimate refreshed once per interval
#[derive(Debug, Clone, Copy)]
pub struct FpsCounter {
    interval: f32,
    frames: u32,
    elapsed: f32,
    fps: f32,
}

impl FpsCounter {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            frames: 0,
            elapsed: 0.0,
            fps: 0.0,
        }
    }

    /// Count one frame; returns the new estimate when the interval elapses
    pub fn tick(&mut self, delta: f32) -> Option<f32> {
        self.frames += 1;
        self.elapsed += delta;

        if self.elapsed >= self.interval {
            self.fps = self.frames as f32 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
            Some(self.fps)
        } else {
            None
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_updates_once_per_interval() {
        let mut counter = FpsCounter::new(1.0);
        for _ in 0..59 {
            assert!(counter.tick(1.0 / 60.0).is_none());
        }
        let fps = counter.tick(1.0 / 60.0 + 1e-4).unwrap();
        assert!((fps - 60.0).abs() < 0.1);
        assert_eq!(counter.fps(), fps);
    }

    #[test]
    fn starts_at_zero() {
        assert_eq!(FpsCounter::default().fps(), 0.0);
    }
}
