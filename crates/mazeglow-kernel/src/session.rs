//! One maze generation job.
//!
//! A [`GenerationSession`] owns everything a job touches: the grid, the live
//! crawlers, the stroke buffer, the tile surface and the random source. It
//! walks through [`JobPhase::Seeding`], [`JobPhase::Running`] and
//! [`JobPhase::Draining`] to [`JobPhase::Complete`], one call to
//! [`GenerationSession::tick`] per frame.
//!
//! The palette is fixed when the session is created. A theme change means a
//! new session.

use glam::Vec2;
use mazeglow_common::{CellCoord, Palette};
use tracing::{debug, trace};

use crate::bitmap::TileBitmap;
use crate::config::{GenerationConfig, SeedLayout};
use crate::crawler::{cell_center, CommittedMove, CrawlContext, Crawler};
use crate::direction::Direction;
use crate::fill::{find_fill, FillScan};
use crate::glow::HeadMarker;
use crate::grid::Grid;
use crate::raster::TileSurface;
use crate::stroke::StrokeBatch;

/// Progress of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobPhase {
    /// Grid not yet reset and seeded.
    Seeding,
    /// Crawlers are growing the maze.
    Running,
    /// No crawler is alive and the last band scan found nothing. The next
    /// tick scans the whole grid once before giving up.
    Draining,
    /// Nothing left to grow.
    Complete,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Phase after the tick
    pub phase: JobPhase,
    /// Crawlers alive after the tick
    pub alive: usize,
    /// Crawlers removed this tick
    pub died: usize,
    /// Branch children added this tick
    pub branched: usize,
    /// Whether a gap-fill crawler was spawned
    pub filled: bool,
    /// Shapes painted onto the tile
    pub drawn: usize,
}

impl TickReport {
    /// Whether this tick moved the job to [`JobPhase::Complete`].
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == JobPhase::Complete
    }
}

/// State of one generation job.
pub struct GenerationSession {
    config: GenerationConfig,
    palette: Palette,
    grid: Grid,
    crawlers: Vec<Crawler>,
    strokes: StrokeBatch,
    surface: TileSurface,
    rng: fastrand::Rng,
    phase: JobPhase,
    tile_px: Vec2,
    seed_target: usize,
    population_cap: usize,
    ticks: u64,
    journal: Option<Vec<CommittedMove>>,
}

impl GenerationSession {
    /// Creates a session for a square tile of `tile_cells` cells per side.
    #[must_use]
    pub fn new(mut config: GenerationConfig, palette: Palette, tile_cells: u32) -> Self {
        config.validate();
        let grid = Grid::new(tile_cells, tile_cells);
        let tile_px = Vec2::new(
            grid.cols() as f32 * config.grid_size,
            grid.rows() as f32 * config.grid_size,
        );
        let surface = TileSurface::new(
            tile_px.x.ceil() as u32,
            tile_px.y.ceil() as u32,
            config.stroke_width,
            palette.background(),
        );
        let strokes = StrokeBatch::new(palette.len(), tile_px, config.wrap_margin());
        let rng = match config.rng_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let seed_target = config.seed_count(grid.cell_count());
        let population_cap = seed_target * config.branch_cap_factor as usize;

        Self {
            config,
            palette,
            grid,
            crawlers: Vec::new(),
            strokes,
            surface,
            rng,
            phase: JobPhase::Seeding,
            tile_px,
            seed_target,
            population_cap,
            ticks: 0,
            journal: None,
        }
    }

    /// Creates a session sized for a `width x height` pixel viewport.
    #[must_use]
    pub fn for_viewport(config: GenerationConfig, palette: Palette, width: u32, height: u32) -> Self {
        let cells = config.tile_cells(width, height);
        Self::new(config, palette, cells)
    }

    /// Starts recording every committed move.
    pub fn enable_journal(&mut self) {
        self.journal.get_or_insert_with(Vec::new);
    }

    /// Returns and clears the recorded moves.
    pub fn take_journal(&mut self) -> Vec<CommittedMove> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Resets the grid and surface and places the seed crawlers. Returns how
    /// many seeds were placed, which may be fewer than the target on small
    /// or crowded grids.
    pub fn seed(&mut self) -> usize {
        self.grid.clear();
        self.surface.clear(self.palette.background());
        self.strokes.clear();
        self.crawlers.clear();
        if let Some(journal) = self.journal.as_mut() {
            journal.clear();
        }

        let target = self.seed_target;
        let max_attempts = target * 10;
        let blocks = SeedBlocks::new(&self.grid, target);
        let mut attempts = 0;
        while self.crawlers.len() < target && attempts < max_attempts {
            let cell = match self.config.seed_layout {
                SeedLayout::Random => CellCoord::new(
                    self.rng.i32(0..self.grid.cols() as i32),
                    self.rng.i32(0..self.grid.rows() as i32),
                ),
                SeedLayout::JitteredGrid => blocks.sample(attempts, &mut self.rng),
            };
            attempts += 1;
            if self.grid.is_occupied(cell) {
                continue;
            }

            let color = self.crawlers.len() % self.palette.len();
            let dir = Direction::ALL[self.rng.usize(..Direction::ALL.len())];
            self.grid.claim(cell, color);
            self.grid.add_degree(cell);
            self.strokes.push_cap(color, cell_center(cell, self.config.grid_size));
            self.crawlers.push(Crawler::new(
                cell,
                dir,
                self.config.seed_force_len,
                color,
                self.config.grid_size,
            ));
        }

        let placed = self.crawlers.len();
        debug!(
            "Seeded {placed}/{target} crawlers on {}x{} tile ({attempts} attempts)",
            self.grid.cols(),
            self.grid.rows()
        );
        self.phase = JobPhase::Running;
        placed
    }

    /// Advances the job by one frame and paints the strokes it produced.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            phase: self.phase,
            alive: self.crawlers.len(),
            died: 0,
            branched: 0,
            filled: false,
            drawn: 0,
        };

        match self.phase {
            JobPhase::Complete => return report,
            JobPhase::Seeding => {
                self.seed();
            }
            JobPhase::Running => self.grow(&mut report),
            JobPhase::Draining => {
                if self.spawn_fill(FillScan::Full) {
                    report.filled = true;
                    self.phase = JobPhase::Running;
                } else {
                    self.phase = JobPhase::Complete;
                    debug!(
                        "Job complete after {} ticks, {}/{} cells occupied",
                        self.ticks,
                        self.grid.occupied_count(),
                        self.grid.cell_count()
                    );
                }
            }
        }

        report.drawn = self.surface.flush(&self.strokes, &self.palette);
        self.strokes.clear();
        self.ticks += 1;
        report.phase = self.phase;
        report.alive = self.crawlers.len();
        trace!(?report, "tick {}", self.ticks);
        report
    }

    fn grow(&mut self, report: &mut TickReport) {
        let before = self.crawlers.len();
        let mut spawned = Vec::new();
        {
            let mut ctx = CrawlContext {
                grid: &mut self.grid,
                strokes: &mut self.strokes,
                rng: &mut self.rng,
                config: &self.config,
                palette_len: self.palette.len(),
                tile_px: self.tile_px,
                population: before,
                population_cap: self.population_cap,
                spawned: &mut spawned,
                journal: self.journal.as_mut(),
            };
            self.crawlers.retain_mut(|crawler| crawler.update(&mut ctx));
        }
        report.died = before - self.crawlers.len();
        report.branched = spawned.len();
        self.crawlers.append(&mut spawned);

        if self.crawlers.len() < self.seed_target {
            report.filled = self.spawn_fill(FillScan::Band);
        }
        if self.crawlers.is_empty() {
            self.phase = JobPhase::Draining;
        }
    }

    fn spawn_fill(&mut self, scan: FillScan) -> bool {
        let locked: Vec<CellCoord> = self.crawlers.iter().map(Crawler::cell).collect();
        match find_fill(&mut self.grid, &locked, scan, &self.config, &mut self.rng) {
            Some(crawler) => {
                self.crawlers.push(crawler);
                true
            }
            None => false,
        }
    }

    /// Ticks until the job completes or `max_ticks` elapse. Returns the
    /// number of ticks executed.
    pub fn run_to_completion(&mut self, max_ticks: u64) -> u64 {
        let mut executed = 0;
        while self.phase != JobPhase::Complete && executed < max_ticks {
            self.tick();
            executed += 1;
        }
        executed
    }

    /// Copies the current tile surface.
    #[must_use]
    pub fn snapshot(&self) -> TileBitmap {
        self.surface.snapshot()
    }

    /// Head positions and colors of every live crawler.
    #[must_use]
    pub fn heads(&self) -> Vec<HeadMarker> {
        self.crawlers
            .iter()
            .map(|c| HeadMarker::new(c.head(self.tile_px), self.palette.color(c.color())))
            .collect()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// Whether the job has finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == JobPhase::Complete
    }

    /// The grid being grown.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number of live crawlers.
    #[must_use]
    pub fn crawler_count(&self) -> usize {
        self.crawlers.len()
    }

    /// Seed slot target.
    #[must_use]
    pub fn seed_target(&self) -> usize {
        self.seed_target
    }

    /// Tile edge length in whole pixels.
    #[must_use]
    pub fn tile_size_px(&self) -> u32 {
        self.surface.width()
    }

    /// Palette used for this job.
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Effective (validated) configuration.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Ticks executed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Coarse blocks used by [`SeedLayout::JitteredGrid`].
struct SeedBlocks {
    side: i32,
    across: i32,
    count: usize,
    cols: i32,
    rows: i32,
}

impl SeedBlocks {
    fn new(grid: &Grid, target: usize) -> Self {
        let cells_per_seed = grid.cell_count() as f32 / target.max(1) as f32;
        let side = (cells_per_seed.sqrt().ceil() as i32).max(1);
        let cols = grid.cols() as i32;
        let rows = grid.rows() as i32;
        let across = (cols + side - 1) / side;
        let down = (rows + side - 1) / side;
        Self {
            side,
            across,
            count: (across * down).max(1) as usize,
            cols,
            rows,
        }
    }

    /// A random cell inside the block selected by `attempt`.
    fn sample(&self, attempt: usize, rng: &mut fastrand::Rng) -> CellCoord {
        let block = (attempt % self.count) as i32;
        let x0 = (block % self.across) * self.side;
        let y0 = (block / self.across) * self.side;
        let x = (x0 + rng.i32(0..self.side)).min(self.cols - 1);
        let y = (y0 + rng.i32(0..self.side)).min(self.rows - 1);
        CellCoord::new(x, y)
    }
}
