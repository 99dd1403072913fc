//! Frame Clock
//!
//! Explicit time source for the view model. The host ticks the clock once per simulation frame
//! and hands the resulting [`FrameTime`] to the controllers.

/// Timing of one simulation frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Frame counter, starting at 1 for the first tick
    pub frame: u64,
    /// Scaled delta time in seconds
    pub delta: f32,
    /// Scaled time since the clock started
    pub elapsed: f32,
}

/// Counts frames and accumulates scaled time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame: u64,
    elapsed: f32,
    time_scale: f32,
    /// Largest delta accepted per tick (seconds)
    max_delta: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            frame: 0,
            elapsed: 0.0,
            time_scale: 1.0,
            max_delta: 0.1,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the time scale. Negative or non-finite values pause the clock.
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = if time_scale.is_finite() { time_scale.max(0.0) } else { 0.0 };
    }

    /// Cap on a single tick's raw delta, so a hitch does not launch the springs.
    pub fn set_max_delta(&mut self, max_delta: f32) {
        self.max_delta = max_delta.max(0.0);
    }

    /// Advance one frame by `raw_delta` seconds of wall time.
    pub fn tick(&mut self, raw_delta: f32) -> FrameTime {
        let raw = if raw_delta.is_finite() { raw_delta.clamp(0.0, self.max_delta) } else { 0.0 };
        let delta = raw * self.time_scale;
        self.frame += 1;
        self.elapsed += delta;
        FrameTime {
            frame: self.frame,
            delta,
            elapsed: self.elapsed,
        }
    }
}
