//! Generation parameters.
//!
//! Every tunable of the generator lives here so that competing aesthetic
//! variants can be expressed as configuration instead of code. Defaults
//! reproduce the reference look: 30px cells, 5px strokes, segments of 4 to 12
//! cells and one seed per 196 cells.

use serde::{Deserialize, Serialize};

/// Default cell size in pixels.
pub const DEFAULT_GRID_SIZE: f32 = 30.0;

/// Default stroke width in pixels.
pub const DEFAULT_STROKE_WIDTH: f32 = 5.0;

/// Upper bound on the tile edge length, in cells.
pub const MAX_TILE_CELLS: u32 = 256;

/// How seeds are distributed over a fresh grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedLayout {
    /// Uniformly random empty cells.
    #[default]
    Random,
    /// One random cell inside each block of a coarse grid, which spreads
    /// seeds more evenly.
    JitteredGrid,
}

/// Weights used when a crawler ranks candidate turns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnScoring {
    /// Bonus for switching between cardinal and diagonal headings.
    pub diagonal_turn_bonus: i32,
    /// Bonus when the target cell touches exactly one occupied cell.
    pub sparse_bonus: i32,
    /// Penalty when the target cell touches more than one occupied cell.
    pub crowded_penalty: i32,
    /// Probability of ignoring the ranking and picking uniformly.
    pub random_pick_chance: f32,
}

impl Default for TurnScoring {
    fn default() -> Self {
        Self {
            diagonal_turn_bonus: 10,
            sparse_bonus: 5,
            crowded_penalty: 5,
            random_pick_chance: 0.2,
        }
    }
}

/// Maze generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Cell size in pixels
    pub grid_size: f32,
    /// Stroke width in pixels
    pub stroke_width: f32,
    /// Straight runs shorter than this are extended when possible
    pub min_segment_length: u32,
    /// Straight runs longer than this force a turn
    pub max_segment_length: u32,
    /// Chance of turning voluntarily
    pub turn_probability: f32,
    /// Chance of spawning a branch on each committed move
    pub chance_to_branch: f32,
    /// Steps between palette color switches
    pub color_change_rate: u32,
    /// Interpolation speed in pixels per tick
    pub growth_speed: f32,
    /// Cells per seed crawler
    pub seed_density_area: u32,
    /// Tile edge as a fraction of the larger viewport dimension
    pub tile_multiplier: f32,
    /// Largest allowed tile edge, in cells
    pub max_tile_cells: u32,
    /// Seed distribution
    pub seed_layout: SeedLayout,
    /// Forced straight steps for seed crawlers
    pub seed_force_len: u32,
    /// Forced straight steps for gap-fill crawlers
    pub fill_force_len: u32,
    /// Height of the row band scanned by the gap-fill pass
    pub fill_band_rows: u32,
    /// Crawler population cap as a multiple of the seed count
    pub branch_cap_factor: u32,
    /// Turn ranking weights
    pub scoring: TurnScoring,
    /// Fixed RNG seed (None = random per job)
    pub rng_seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            stroke_width: DEFAULT_STROKE_WIDTH,
            min_segment_length: 4,
            max_segment_length: 12,
            turn_probability: 0.15,
            chance_to_branch: 0.08,
            color_change_rate: 15,
            growth_speed: 9.0,
            seed_density_area: 196,
            tile_multiplier: 0.5,
            max_tile_cells: 48,
            seed_layout: SeedLayout::Random,
            seed_force_len: 4,
            fill_force_len: 2,
            fill_band_rows: 30,
            branch_cap_factor: 4,
            scoring: TurnScoring::default(),
            rng_seed: None,
        }
    }
}

impl GenerationConfig {
    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.grid_size = self.grid_size.clamp(4.0, 256.0);
        self.stroke_width = self.stroke_width.clamp(0.5, self.grid_size);
        self.max_segment_length = self.max_segment_length.max(1);
        self.min_segment_length = self.min_segment_length.min(self.max_segment_length);
        self.turn_probability = self.turn_probability.clamp(0.0, 1.0);
        self.chance_to_branch = self.chance_to_branch.clamp(0.0, 1.0);
        self.color_change_rate = self.color_change_rate.max(1);
        self.growth_speed = self.growth_speed.clamp(0.1, self.grid_size);
        self.seed_density_area = self.seed_density_area.max(1);
        self.tile_multiplier = self.tile_multiplier.clamp(0.05, 4.0);
        self.max_tile_cells = self.max_tile_cells.clamp(1, MAX_TILE_CELLS);
        self.fill_band_rows = self.fill_band_rows.max(1);
        self.branch_cap_factor = self.branch_cap_factor.max(1);
        self.scoring.random_pick_chance = self.scoring.random_pick_chance.clamp(0.0, 1.0);
    }

    /// Tile edge in cells for a viewport of `width x height` pixels.
    #[must_use]
    pub fn tile_cells(&self, width: u32, height: u32) -> u32 {
        let longest = width.max(height) as f32;
        let cells = (longest * self.tile_multiplier / self.grid_size).ceil();
        (cells as u32).clamp(1, self.max_tile_cells.max(1))
    }

    /// Number of seed crawlers for a tile with `cell_count` cells.
    #[must_use]
    pub fn seed_count(&self, cell_count: usize) -> usize {
        (cell_count / self.seed_density_area.max(1) as usize).max(2)
    }

    /// Width of the band near a tile edge where strokes get duplicated.
    #[must_use]
    pub fn wrap_margin(&self) -> f32 {
        self.stroke_width * 2.0
    }
}
