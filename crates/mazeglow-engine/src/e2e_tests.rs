//! End-to-end tests for the maze background.
//!
//! These drive [`MazeBackground`] the way a host page would: viewport
//! changes, theme flips and frame updates, then check what reached the
//! worker and what the canvas did.

#![cfg(test)]

use std::time::Duration;

use image::RgbaImage;
use mazeglow_common::Theme;
use mazeglow_kernel::GenerationConfig;

use crate::config::{EngineConfig, WorkerMode};
use crate::controller::MazeBackground;
use crate::lifecycle::VisualState;

const FRAME: Duration = Duration::from_millis(16);

fn config(mode: WorkerMode) -> EngineConfig {
    EngineConfig {
        generation: GenerationConfig {
            rng_seed: Some(2024),
            ..Default::default()
        },
        worker_mode: mode,
        ..Default::default()
    }
}

fn background(width: u32, height: u32) -> MazeBackground {
    MazeBackground::try_new(&config(WorkerMode::Inline), Theme::Dark, width, height).expect("inline worker")
}

fn run_for(bg: &mut MazeBackground, millis: u64) {
    let mut elapsed = Duration::ZERO;
    while elapsed < Duration::from_millis(millis) {
        bg.update(FRAME);
        elapsed += FRAME;
    }
}

fn run_until(bg: &mut MazeBackground, max_frames: usize, done: impl Fn(&MazeBackground) -> bool) -> bool {
    for _ in 0..max_frames {
        if done(bg) {
            return true;
        }
        bg.update(FRAME);
    }
    done(bg)
}

fn assert_linear(bg: &MazeBackground) {
    let states: Vec<_> = bg.lifecycle().history().collect();
    for pair in states.windows(2) {
        assert_eq!(pair[1], pair[0].next(), "lifecycle jumped {} -> {}", pair[0], pair[1]);
    }
}

mod generation_tests {
    use super::*;

    #[test]
    fn e2e_minimal_grid_completes() {
        let mut bg = background(1, 1);
        let finished = run_until(&mut bg, 5_000, |bg| bg.stats().jobs_finished == 1);
        assert!(finished, "a one-cell tile should finish");
        assert_eq!(bg.compositor().tile_size(), Some(30));
        assert_ne!(bg.visual_state(), VisualState::Hidden);
    }

    #[test]
    fn e2e_composited_frame_is_opaque_once_visible() {
        let mut bg = background(240, 240);
        assert!(run_until(&mut bg, 200, |bg| bg.visual_state() == VisualState::Visible));
        let mut frame = RgbaImage::new(320, 200);
        assert!(bg.compose(&mut frame, 17.0));
        assert!(frame.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn e2e_finished_maze_regenerates() {
        let mut bg = background(240, 240);
        assert!(run_until(&mut bg, 10_000, |bg| bg.stats().jobs_finished == 1));
        run_for(&mut bg, 6_000 + 800 + 200);
        assert_eq!(bg.stats().requests_issued, 2);
        assert_eq!(bg.lifecycle().cycles(), 1);
        assert_linear(&bg);
    }
}

mod trigger_tests {
    use super::*;

    #[test]
    fn e2e_theme_switch_mid_generation() {
        let mut bg = background(1280, 720);
        run_for(&mut bg, 200);
        assert_eq!(bg.visual_state(), VisualState::FadingIn);
        assert_eq!(bg.stats().jobs_finished, 0);

        bg.notify_theme_attribute(Some("light"));
        assert_eq!(bg.visual_state(), VisualState::FadingOut);
        run_for(&mut bg, 2_000);

        assert_eq!(bg.lifecycle().cycles(), 1, "exactly one fade-out");
        assert_eq!(bg.stats().requests_issued, 2, "exactly one new job");
        assert_eq!(bg.worker_status().jobs_started, 2);
        assert_eq!(bg.theme(), Theme::Light);
        assert_eq!(bg.compositor().theme(), Theme::Light);
        assert_ne!(bg.visual_state(), VisualState::Hidden);
        assert_linear(&bg);
    }

    #[test]
    fn e2e_same_theme_attribute_is_ignored() {
        let mut bg = background(480, 480);
        run_for(&mut bg, 100);
        let request = bg.current_request();
        bg.notify_theme_attribute(Some("dark"));
        bg.notify_theme_attribute(None);
        assert_eq!(bg.current_request(), request);
    }

    #[test]
    fn e2e_resize_storm_generates_once() {
        let mut bg = background(480, 480);
        run_for(&mut bg, 200);
        assert_eq!(bg.stats().requests_issued, 1);

        for i in 0..10 {
            bg.notify_resize(300 + i * 60, 400);
            run_for(&mut bg, 48);
        }
        run_for(&mut bg, 1_500);

        assert_eq!(bg.stats().requests_issued, 2);
        assert_eq!(bg.viewport(), (840, 400));
        // 840px at half size over 30px cells.
        assert_eq!(bg.compositor().tile_size(), Some(14 * 30));
        assert_eq!(bg.lifecycle().cycles(), 1);
        assert_linear(&bg);
    }

    #[test]
    fn e2e_first_load_resize_uses_short_debounce() {
        let mut bg = background(480, 480);
        bg.notify_resize(600, 480);
        run_for(&mut bg, 80);
        assert_eq!(bg.stats().requests_issued, 0);
        run_for(&mut bg, 40);
        assert_eq!(bg.stats().requests_issued, 1);
        assert_eq!(bg.lifecycle().cycles(), 0, "nothing to fade out yet");
    }

    #[test]
    fn e2e_stale_frames_are_rejected() {
        let mut bg = background(1280, 720);
        run_for(&mut bg, 80);
        let adopted = bg.stats().frames_adopted;
        assert!(adopted > 0);

        bg.notify_resize(1000, 700);
        run_for(&mut bg, 250);

        // The old job still delivers one frame, which is dropped unacked.
        let stats = bg.stats();
        assert_eq!(stats.frames_adopted, adopted);
        assert_eq!(stats.frames_discarded, 1);
        assert!(bg.worker_status().awaiting_ack);
    }

    #[test]
    fn e2e_new_trigger_cancels_auto_regeneration() {
        let mut bg = background(240, 240);
        assert!(run_until(&mut bg, 10_000, |bg| bg.stats().jobs_finished == 1));
        assert_eq!(bg.pending_timers(), 1);
        bg.notify_resize(300, 300);
        assert_eq!(bg.pending_timers(), 1);
        run_for(&mut bg, 7_000);
        // Only the resize ran; the finished job's timer was dropped.
        assert_eq!(bg.stats().requests_issued, 2);
        assert_eq!(bg.viewport(), (300, 300));
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn e2e_lifecycle_is_linear_under_churn() {
        let mut bg = background(600, 600);
        let themes = [Some("light"), None];
        for round in 0..12u32 {
            match round % 3 {
                0 => bg.notify_theme_attribute(themes[(round / 3 % 2) as usize]),
                1 => bg.notify_resize(500 + round * 10, 600),
                _ => bg.notify_visibility(round % 2 == 0),
            }
            run_for(&mut bg, 100 + u64::from(round) * 137 % 900);
        }
        bg.notify_visibility(true);
        run_for(&mut bg, 3_000);
        assert_linear(&bg);
        assert!(!bg.is_disabled());
    }

    #[test]
    fn e2e_threaded_worker_reveals_canvas() {
        let mut bg =
            MazeBackground::try_new(&config(WorkerMode::Threaded), Theme::Light, 240, 240).expect("worker thread");
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while bg.visual_state() == VisualState::Hidden && std::time::Instant::now() < deadline {
            bg.update(FRAME);
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_ne!(bg.visual_state(), VisualState::Hidden);
        assert!(bg.stats().frames_adopted > 0);
    }
}
