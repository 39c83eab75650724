use std::time::Instant;

/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    /// Seconds since the clock started
    pub time: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

/// Yields a [`FrameInfo`] per redraw
///
/// The first frame has a zero delta, so a slow window creation never shows
/// up as one huge animation step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    number: u64,
    start: Instant,
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            number: 0,
            start,
            last: None,
        }
    }

    /// Frames produced so far
    pub fn frame_number(&self) -> u64 {
        self.number
    }

    pub fn tick_at(&mut self, now: Instant) -> FrameInfo {
        let delta = self
            .last
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f32());
        let time = now.saturating_duration_since(self.start).as_secs_f32();

        let info = FrameInfo {
            number: self.number,
            time,
            delta,
        };
        self.number += 1;
        self.last = Some(now);
        info
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for FrameClock {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        Some(self.tick_at(Instant::now()))
    }
}
