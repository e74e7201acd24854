//! Frame timing.
//!
//! [`FrameClock`] produces the `delta_time` handed to
//! [`Renderer::render_frame`](crate::Renderer::render_frame) each frame,
//! either measured from the wall clock or fixed.
//!
//! ```ignore
//! let mut clock = FrameClock::measured();
//! loop {
//!     let dt = clock.tick();
//!     renderer.render_frame(dt)?;
//! }
//! ```

use std::time::{Duration, Instant};

/// Longest step a measured clock will report, in seconds.
///
/// Stalls (window drags, breakpoints) would otherwise produce one huge step.
pub const MAX_MEASURED_DELTA: f32 = 0.1;

const FPS_WINDOW: Duration = Duration::from_millis(500);

/// Source of per-frame delta times.
#[derive(Debug)]
pub struct FrameClock {
    fixed_delta: Option<f32>,
    last_tick: Option<Instant>,
    delta: f32,
    elapsed: f64,
    frame_count: u64,
    fps: f32,
    fps_frames: u64,
    fps_since: Instant,
    paused: bool,
}

impl FrameClock {
    fn with_fixed(fixed_delta: Option<f32>) -> Self {
        Self {
            fixed_delta,
            last_tick: None,
            delta: 0.0,
            elapsed: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_since: Instant::now(),
            paused: false,
        }
    }

    /// Deltas measured from the wall clock. The first tick reports zero.
    pub fn measured() -> Self {
        Self::with_fixed(None)
    }

    /// Every tick reports `1 / fps`.
    pub fn fixed(fps: f32) -> Self {
        Self::with_fixed(Some(1.0 / fps))
    }

    /// Start a new frame and return its delta time in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let measured = self
            .last_tick
            .map(|last| now.duration_since(last).as_secs_f32().min(MAX_MEASURED_DELTA))
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        self.delta = if self.paused {
            0.0
        } else {
            self.fixed_delta.unwrap_or(measured)
        };
        self.elapsed += self.delta as f64;
        self.frame_count += 1;

        let window = now.duration_since(self.fps_since);
        if window >= FPS_WINDOW {
            self.fps = (self.frame_count - self.fps_frames) as f32 / window.as_secs_f32();
            self.fps_frames = self.frame_count;
            self.fps_since = now;
        }

        self.delta
    }

    /// Delta returned by the last [`tick`](Self::tick).
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Simulated seconds, the sum of all deltas.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Wall-clock frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed_delta.is_some()
    }

    /// While paused every tick reports zero.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::measured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let mut clock = FrameClock::fixed(50.0);
        for _ in 0..10 {
            assert_eq!(clock.tick(), 0.02);
        }
        assert_eq!(clock.frame(), 10);
        assert!((clock.elapsed() - 0.2).abs() < 1e-6);
        assert!(clock.is_fixed());
    }

    #[test]
    fn test_measured_first_tick_is_zero() {
        let mut clock = FrameClock::measured();
        assert_eq!(clock.tick(), 0.0);
        std::thread::sleep(Duration::from_millis(5));
        let dt = clock.tick();
        assert!(dt > 0.0 && dt <= MAX_MEASURED_DELTA);
    }

    #[test]
    fn test_measured_delta_is_capped() {
        let mut clock = FrameClock::measured();
        clock.tick();
        clock.last_tick = Some(Instant::now() - Duration::from_secs(3));
        assert_eq!(clock.tick(), MAX_MEASURED_DELTA);
    }

    #[test]
    fn test_paused_reports_zero() {
        let mut clock = FrameClock::fixed(60.0);
        clock.set_paused(true);
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.elapsed(), 0.0);
        clock.set_paused(false);
        assert!(clock.tick() > 0.0);
    }
}
