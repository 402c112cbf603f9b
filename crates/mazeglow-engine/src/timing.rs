//! Frame pacing.
//!
//! Keeps the demo loop and the worker at a steady frame rate and tracks the
//! frame times actually achieved.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frame pacing and frame-time statistics.
#[derive(Debug)]
pub struct FrameTiming {
    /// Target frames per second
    target_fps: u32,
    /// Time budget per frame
    frame_budget: Duration,
    /// Time of last frame start
    last_frame: Instant,
    /// Longest delta reported, so a stall does not skip whole fades
    max_dt: Duration,
    /// Recent frame times for averaging
    frame_times: VecDeque<f32>,
    /// Maximum samples for averaging
    max_samples: usize,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameTiming {
    /// Create a new frame timing manager.
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        let target_fps = target_fps.max(1);
        Self {
            target_fps,
            frame_budget: Duration::from_nanos(1_000_000_000 / u64::from(target_fps)),
            last_frame: Instant::now(),
            max_dt: Duration::from_millis(250),
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }

    /// Time since the last call, clamped to 250ms.
    pub fn delta_time(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).min(self.max_dt);
        self.last_frame = now;

        self.frame_times.push_back(dt.as_secs_f32());
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }

        dt
    }

    /// Sleep for whatever is left of the frame budget.
    pub fn sleep_remainder(&self) {
        if let Some(rest) = self.frame_budget.checked_sub(self.last_frame.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    /// Get the current FPS (averaged over recent frames).
    #[must_use]
    pub fn current_fps(&self) -> f32 {
        let avg = self.average_frame_time_ms();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    /// Get the average frame time in milliseconds.
    #[must_use]
    pub fn average_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }

        (self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32) * 1000.0
    }

    /// Get the target FPS.
    #[must_use]
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Time budget per frame.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    /// Reset timing (call after a pause).
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.frame_times.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timing_creation() {
        let timing = FrameTiming::new(60);
        assert_eq!(timing.target_fps(), 60);
        assert_eq!(timing.frame_budget(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn test_zero_fps_is_bumped() {
        assert_eq!(FrameTiming::new(0).target_fps(), 1);
    }

    #[test]
    fn test_frame_timing_delta() {
        let mut timing = FrameTiming::new(60);

        std::thread::sleep(Duration::from_millis(16));
        let dt = timing.delta_time();
        assert!(dt >= Duration::from_millis(15));
        assert!(dt <= Duration::from_millis(250));
    }

    #[test]
    fn test_frame_timing_max_dt() {
        let mut timing = FrameTiming::new(60);

        std::thread::sleep(Duration::from_millis(300));
        let dt = timing.delta_time();

        assert_eq!(dt, timing.max_dt);
    }

    #[test]
    fn test_sleep_remainder_fills_budget() {
        let mut timing = FrameTiming::new(50);
        timing.reset();
        timing.sleep_remainder();
        assert!(timing.delta_time() >= Duration::from_millis(19));
    }

    #[test]
    fn test_reset_timing() {
        let mut timing = FrameTiming::new(60);
        timing.frame_times.push_back(0.016);
        assert!(timing.current_fps() > 0.0);

        timing.reset();

        assert!(timing.frame_times.is_empty());
        assert!(timing.current_fps().abs() < f32::EPSILON);
    }
}
