//! Engine configuration.
//!
//! Provides the generation parameters plus lifecycle timings, glow and worker
//! settings, and the virtual viewport used by the headless demo.
//! Configuration can be loaded from and saved to a file.

use mazeglow_common::{ConfigError, MazeError, MazeResult, Palette, Rgba, Theme, MAX_PALETTE_COLORS};
use mazeglow_kernel::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "mazeglow.toml";

/// Where generation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerMode {
    /// Background OS thread.
    #[default]
    Threaded,
    /// On the caller's thread, one step per frame.
    Inline,
}

/// Durations that drive the visual lifecycle, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleTimings {
    /// Fade from hidden to visible
    pub fade_in_ms: u64,
    /// Fade from visible to hidden
    pub fade_out_ms: u64,
    /// Quiet period after the last resize before regenerating
    pub resize_debounce_ms: u64,
    /// Debounce for the very first generation
    pub first_load_debounce_ms: u64,
    /// Pause between a finished job and the automatic fade-out
    pub auto_regen_delay_ms: u64,
    /// Re-check interval while waiting for the canvas to become hidden
    pub hidden_poll_ms: u64,
}

impl Default for LifecycleTimings {
    fn default() -> Self {
        Self {
            fade_in_ms: 800,
            fade_out_ms: 800,
            resize_debounce_ms: 300,
            first_load_debounce_ms: 100,
            auto_regen_delay_ms: 6_000,
            hidden_poll_ms: 50,
        }
    }
}

impl LifecycleTimings {
    /// Fade-in duration.
    #[must_use]
    pub fn fade_in(&self) -> Duration {
        Duration::from_millis(self.fade_in_ms)
    }

    /// Fade-out duration.
    #[must_use]
    pub fn fade_out(&self) -> Duration {
        Duration::from_millis(self.fade_out_ms)
    }

    /// Resize debounce.
    #[must_use]
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// First-load debounce.
    #[must_use]
    pub fn first_load_debounce(&self) -> Duration {
        Duration::from_millis(self.first_load_debounce_ms)
    }

    /// Delay before a finished maze is replaced.
    #[must_use]
    pub fn auto_regen_delay(&self) -> Duration {
        Duration::from_millis(self.auto_regen_delay_ms)
    }

    /// Poll interval while waiting for `hidden`.
    #[must_use]
    pub fn hidden_poll(&self) -> Duration {
        Duration::from_millis(self.hidden_poll_ms)
    }
}

/// Palette written as hex strings in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteSpec {
    /// Stroke colors, `#RRGGBB`
    pub colors: Vec<String>,
    /// Background color, `#RRGGBB`
    pub background: String,
}

impl PaletteSpec {
    /// Parses into a palette.
    pub fn to_palette(&self) -> MazeResult<Palette> {
        let colors = self
            .colors
            .iter()
            .map(|c| Rgba::from_hex(c))
            .collect::<Result<Vec<_>, _>>()?;
        let background = Rgba::from_hex(&self.background)?;
        Ok(Palette::new(colors, background)?)
    }
}

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Generation ===
    /// Maze generator parameters
    pub generation: GenerationConfig,
    /// Replaces the built-in dark palette
    pub dark_palette: Option<PaletteSpec>,
    /// Replaces the built-in light palette
    pub light_palette: Option<PaletteSpec>,

    // === Lifecycle ===
    /// Fade, debounce and regeneration timings
    pub timings: LifecycleTimings,

    // === Rendering ===
    /// Frames per second for ticks and compositing
    pub target_fps: u32,
    /// Draw glow sprites over crawler heads
    pub enable_glow: bool,
    /// Glow radius on the dark theme, pixels
    pub glow_radius_dark: u32,
    /// Glow radius on the light theme, pixels
    pub glow_radius_light: u32,

    // === Worker ===
    /// Threaded or inline generation
    pub worker_mode: WorkerMode,
    /// Wait for an ack before producing the next frame
    pub backpressure: bool,

    // === Demo ===
    /// Virtual viewport width in pixels
    pub viewport_width: u32,
    /// Virtual viewport height in pixels
    pub viewport_height: u32,
    /// Theme the demo starts with
    pub theme: Theme,
    /// Number of frames the demo runs
    pub demo_frames: u32,
    /// Where the demo writes its final frame
    pub output_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            dark_palette: None,
            light_palette: None,

            timings: LifecycleTimings::default(),

            target_fps: 60,
            enable_glow: true,
            glow_radius_dark: 25,
            glow_radius_light: 20,

            worker_mode: WorkerMode::Threaded,
            backpressure: true,

            viewport_width: 1280,
            viewport_height: 720,
            theme: Theme::Dark,
            demo_frames: 600,
            output_path: PathBuf::from("mazeglow.png"),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to load config file: {e}");
                Self::default()
            },
        }
    }

    /// Load configuration from a specific path, reporting every problem.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> MazeResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text. Values are clamped; palettes must
    /// parse.
    pub fn parse(contents: &str) -> MazeResult<Self> {
        let mut config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate();
        config.palette(Theme::Dark)?;
        config.palette(Theme::Light)?;
        if config.output_path.as_os_str().is_empty() {
            return Err(MazeError::Config(ConfigError::Invalid {
                field: "output_path",
                reason: "must not be empty".to_string(),
            }));
        }
        Ok(config)
    }

    /// Save configuration to the default file location.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(Self::config_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(config_dir) => config_dir.join("mazeglow").join(CONFIG_FILE),
            None => PathBuf::from(CONFIG_FILE),
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.generation.validate();
        for spec in [&mut self.dark_palette, &mut self.light_palette].into_iter().flatten() {
            if spec.colors.len() > MAX_PALETTE_COLORS {
                warn!("Palette has {} colors, keeping the first {MAX_PALETTE_COLORS}", spec.colors.len());
                spec.colors.truncate(MAX_PALETTE_COLORS);
            }
        }

        // Lifecycle
        self.timings.fade_in_ms = self.timings.fade_in_ms.min(10_000);
        self.timings.fade_out_ms = self.timings.fade_out_ms.min(10_000);
        self.timings.hidden_poll_ms = self.timings.hidden_poll_ms.clamp(1, 1_000);

        // Rendering
        self.target_fps = self.target_fps.clamp(1, 240);
        self.glow_radius_dark = self.glow_radius_dark.clamp(1, 128);
        self.glow_radius_light = self.glow_radius_light.clamp(1, 128);

        // Demo
        self.viewport_width = self.viewport_width.clamp(1, 7680);
        self.viewport_height = self.viewport_height.clamp(1, 4320);
    }

    /// Palette for `theme`, honoring overrides.
    pub fn palette(&self, theme: Theme) -> MazeResult<Palette> {
        let spec = match theme {
            Theme::Dark => self.dark_palette.as_ref(),
            Theme::Light => self.light_palette.as_ref(),
        };
        match spec {
            Some(spec) => spec.to_palette(),
            None => Ok(Palette::for_theme(theme)),
        }
    }

    /// Glow radius for `theme`.
    #[must_use]
    pub fn glow_radius(&self, theme: Theme) -> u32 {
        match theme {
            Theme::Dark => self.glow_radius_dark,
            Theme::Light => self.glow_radius_light,
        }
    }

    /// Time between frames.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.target_fps.max(1)))
    }
}
