//! # Mazeglow
//!
//! Headless driver for the maze background. Runs the whole pipeline
//! (worker, lifecycle, compositor) against a virtual viewport for a fixed
//! number of frames and writes the last composited frame as a PNG.
//!
//! Usage: `mazeglow [config.toml]`. Without an argument the configuration
//! is read from the platform config directory, falling back to defaults.

use std::time::Duration;

use anyhow::{Context, Result};
use image::RgbaImage;
use mazeglow_engine::{EngineConfig, FrameTiming, MazeBackground, WorkerMode};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pixels scrolled per frame.
const SCROLL_SPEED: f32 = 0.25;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("mazeglow=info".parse()?))
        .init();

    info!("Mazeglow starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    run()?;

    info!("Mazeglow shutdown complete");
    Ok(())
}

fn run() -> Result<()> {
    let mut config = match std::env::args_os().nth(1) {
        Some(path) => EngineConfig::try_load_from(&path)
            .with_context(|| format!("loading {}", path.to_string_lossy()))?,
        None => EngineConfig::load(),
    };
    config.validate();

    let (width, height) = (config.viewport_width, config.viewport_height);
    info!("Configuration loaded:");
    info!("  Viewport: {width}x{height}, {} theme", config.theme);
    info!("  Worker: {:?}, {} fps", config.worker_mode, config.target_fps);
    info!("  Frames: {}", config.demo_frames);

    let Some(mut background) = MazeBackground::try_new(&config, config.theme, width, height) else {
        warn!("Maze background unavailable, nothing to render");
        return Ok(());
    };

    // The inline worker runs on this thread, so it can use a virtual clock.
    let virtual_clock = config.worker_mode == WorkerMode::Inline;
    let frame_dt = config.frame_interval();
    let mut timing = FrameTiming::new(config.target_fps);
    let mut elapsed = Duration::ZERO;

    for frame in 0..config.demo_frames {
        let dt = if virtual_clock { frame_dt } else { timing.delta_time() };
        elapsed += dt;
        background.update(dt);

        if frame % 120 == 0 {
            debug!(
                "Frame {frame}: {} at {:.2}, {:?}",
                background.visual_state(),
                background.lifecycle().opacity(),
                background.stats()
            );
        }
        if !virtual_clock {
            timing.sleep_remainder();
        }
    }

    let mut canvas = RgbaImage::new(width, height);
    let scroll_y = config.demo_frames as f32 * SCROLL_SPEED;
    background.compose(&mut canvas, scroll_y);
    canvas
        .save(&config.output_path)
        .with_context(|| format!("writing {}", config.output_path.display()))?;

    let stats = background.stats();
    info!(
        "Rendered {:.1}s: {} requests, {} frames adopted, {} stale, {} jobs finished",
        elapsed.as_secs_f32(),
        stats.requests_issued,
        stats.frames_adopted,
        stats.frames_discarded,
        stats.jobs_finished
    );
    if !virtual_clock {
        info!("Average frame time {:.2}ms", timing.average_frame_time_ms());
    }
    info!("Wrote {}", config.output_path.display());
    Ok(())
}
