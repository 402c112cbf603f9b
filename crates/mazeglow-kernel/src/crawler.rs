//! The crawler agent.
//!
//! A crawler alternates between two sub-states. While *thinking* it picks the
//! next cell, claims it on the grid and possibly spawns a branch. While
//! *moving* it slides its pixel position toward the claimed cell at a fixed
//! speed, emitting one stroke piece per tick.
//!
//! Degree bookkeeping uses reservations: whoever spawns a crawler (seeding,
//! branching or gap-fill) adds the connection at the spawn cell up front, and
//! the crawler's first committed move does not count it a second time.

use glam::Vec2;
use mazeglow_common::CellCoord;

use crate::config::{GenerationConfig, TurnScoring};
use crate::direction::{Direction, DirectionSet};
use crate::grid::{Grid, MAX_DEGREE};
use crate::stroke::StrokeBatch;

/// Animation sub-state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrawlState {
    /// Waiting to choose the next cell.
    Thinking,
    /// Sliding toward `target`, in unwrapped tile pixels.
    Moving {
        /// Pixel center of the claimed cell
        target: Vec2,
    },
}

/// One grid move, recorded at the moment it was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedMove {
    /// Source cell
    pub from: CellCoord,
    /// Heading taken
    pub dir: Direction,
    /// Occupancy of the two cardinal cells flanking a diagonal step
    /// (always `(false, false)` for cardinal steps).
    pub flanks_occupied: (bool, bool),
}

impl CommittedMove {
    /// Whether this move squeezed between two occupied cells.
    #[must_use]
    pub fn crosses_diagonal(&self) -> bool {
        self.flanks_occupied.0 && self.flanks_occupied.1
    }
}

/// Borrowed session state a crawler needs for one update.
pub struct CrawlContext<'a> {
    /// Grid being grown
    pub grid: &'a mut Grid,
    /// Stroke buffer for this tick
    pub strokes: &'a mut StrokeBatch,
    /// Job random source
    pub rng: &'a mut fastrand::Rng,
    /// Job parameters
    pub config: &'a GenerationConfig,
    /// Number of palette colors
    pub palette_len: usize,
    /// Tile size in pixels
    pub tile_px: Vec2,
    /// Crawlers alive at the start of the tick
    pub population: usize,
    /// Population limit for branching
    pub population_cap: usize,
    /// Branch children spawned this tick
    pub spawned: &'a mut Vec<Crawler>,
    /// Move log, if the session keeps one
    pub journal: Option<&'a mut Vec<CommittedMove>>,
}

/// A grid-walking agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Crawler {
    cell: CellCoord,
    dir: Direction,
    force_len: u32,
    color: usize,
    step_count: u32,
    run_length: u32,
    state: CrawlState,
    pos: Vec2,
    edge_reserved: bool,
}

/// Pixel center of `cell`.
#[must_use]
pub fn cell_center(cell: CellCoord, grid_size: f32) -> Vec2 {
    Vec2::new(
        cell.x as f32 * grid_size + grid_size * 0.5,
        cell.y as f32 * grid_size + grid_size * 0.5,
    )
}

impl Crawler {
    /// Creates a crawler standing on `cell`. The caller must already have
    /// claimed the cell and reserved one connection on it.
    #[must_use]
    pub fn new(cell: CellCoord, dir: Direction, force_len: u32, color: usize, grid_size: f32) -> Self {
        Self {
            cell,
            dir,
            force_len,
            color,
            step_count: 0,
            run_length: 0,
            state: CrawlState::Thinking,
            pos: cell_center(cell, grid_size),
            edge_reserved: true,
        }
    }

    /// Logical cell. While moving this is already the destination.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Current heading.
    #[must_use]
    pub fn dir(&self) -> Direction {
        self.dir
    }

    /// Palette index currently drawn with.
    #[must_use]
    pub fn color(&self) -> usize {
        self.color
    }

    /// Remaining forced straight steps.
    #[must_use]
    pub fn force_len(&self) -> u32 {
        self.force_len
    }

    /// Animation sub-state.
    #[must_use]
    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Pixel position of the head inside the tile.
    #[must_use]
    pub fn head(&self, tile_px: Vec2) -> Vec2 {
        Vec2::new(self.pos.x.rem_euclid(tile_px.x), self.pos.y.rem_euclid(tile_px.y))
    }

    /// Advances one tick. Returns `false` once the crawler is stuck and
    /// should be removed.
    pub fn update(&mut self, ctx: &mut CrawlContext<'_>) -> bool {
        match self.state {
            CrawlState::Thinking => self.think(ctx),
            CrawlState::Moving { target } => {
                self.advance(target, ctx);
                true
            }
        }
    }

    fn think(&mut self, ctx: &mut CrawlContext<'_>) -> bool {
        let valid = ctx.grid.valid_moves(self.cell);
        if valid.is_empty() {
            return false;
        }
        let Some(next) = self.choose(valid, ctx) else {
            return false;
        };
        self.commit(next, ctx);
        true
    }

    fn choose(&mut self, valid: DirectionSet, ctx: &mut CrawlContext<'_>) -> Option<Direction> {
        let config = ctx.config;
        let can_continue = valid.contains(self.dir);
        let turns = valid.without(self.dir);

        if self.force_len > 0 {
            if can_continue {
                return Some(self.dir);
            }
            return self.best_turn(turns, ctx);
        }

        if self.run_length > config.max_segment_length {
            if !turns.is_empty() {
                return self.best_turn(turns, ctx);
            }
            self.run_length = 0;
            return can_continue.then_some(self.dir);
        }

        if self.run_length < config.min_segment_length && can_continue {
            return Some(self.dir);
        }

        if valid.len() > 1 && ctx.rng.f32() < config.turn_probability {
            return self.best_turn(valid, ctx);
        }
        if can_continue {
            return Some(self.dir);
        }
        self.best_turn(valid, ctx)
    }

    /// Ranks `options` from the current cell and heading.
    fn best_turn(&self, options: DirectionSet, ctx: &mut CrawlContext<'_>) -> Option<Direction> {
        rank_turn(ctx.grid, self.cell, self.dir, options, &ctx.config.scoring, ctx.rng)
    }

    fn commit(&mut self, next: Direction, ctx: &mut CrawlContext<'_>) {
        let source = self.cell;
        let dest = ctx.grid.neighbor(source, next);

        if let Some(journal) = ctx.journal.as_deref_mut() {
            let flanks_occupied = if next.is_diagonal() {
                let (dx, dy) = next.vector();
                (
                    ctx.grid.is_occupied(source.offset(dx, 0)),
                    ctx.grid.is_occupied(source.offset(0, dy)),
                )
            } else {
                (false, false)
            };
            journal.push(CommittedMove {
                from: source,
                dir: next,
                flanks_occupied,
            });
        }

        self.step_count += 1;
        let old_color = self.color;
        let mut next_color = self.color;
        if self.step_count >= ctx.config.color_change_rate {
            self.step_count = 0;
            next_color = (self.color + 1) % ctx.palette_len.max(1);
        }

        ctx.grid.claim(dest, next_color);
        ctx.grid.add_degree(dest);
        if self.edge_reserved {
            self.edge_reserved = false;
        } else {
            ctx.grid.add_degree(source);
        }

        if self.force_len == 0 {
            self.maybe_branch(source, next, old_color, ctx);
        }

        if next == self.dir {
            self.run_length += 1;
        } else {
            self.run_length = 0;
        }
        self.force_len = self.force_len.saturating_sub(1);
        self.dir = next;
        self.color = next_color;
        self.cell = dest;
        self.state = CrawlState::Moving {
            target: self.pos + next.as_vec2() * ctx.config.grid_size,
        };
    }

    fn maybe_branch(&self, source: CellCoord, taken: Direction, color: usize, ctx: &mut CrawlContext<'_>) {
        if ctx.rng.f32() >= ctx.config.chance_to_branch {
            return;
        }
        if ctx.population + ctx.spawned.len() >= ctx.population_cap {
            return;
        }
        if ctx.grid.degree(source) >= MAX_DEGREE {
            return;
        }
        let options = ctx.grid.valid_moves(source).without(taken);
        let Some(dir) = rank_turn(ctx.grid, source, self.dir, options, &ctx.config.scoring, ctx.rng) else {
            return;
        };
        ctx.grid.add_degree(source);
        ctx.spawned
            .push(Self::new(source, dir, 0, color, ctx.config.grid_size));
    }

    fn advance(&mut self, target: Vec2, ctx: &mut CrawlContext<'_>) {
        let speed = ctx.config.growth_speed;
        let delta = target - self.pos;
        let distance = delta.length();
        if distance <= speed {
            ctx.strokes.push_segment(self.color, self.pos, target);
            self.pos = Vec2::new(target.x.rem_euclid(ctx.tile_px.x), target.y.rem_euclid(ctx.tile_px.y));
            self.state = CrawlState::Thinking;
        } else {
            let step = self.pos + delta / distance * speed;
            ctx.strokes.push_segment(self.color, self.pos, step);
            self.pos = step;
        }
    }
}

/// Scores candidate headings out of `cell` and returns the preferred one.
///
/// Switching between cardinal and diagonal earns a bonus, a target touching
/// exactly one occupied cell earns a bonus and a target touching more than
/// one is penalized. With `random_pick_chance` the ranking is ignored.
pub fn rank_turn(
    grid: &Grid,
    cell: CellCoord,
    heading: Direction,
    options: DirectionSet,
    scoring: &TurnScoring,
    rng: &mut fastrand::Rng,
) -> Option<Direction> {
    let mut scored: Vec<(Direction, i32)> = options
        .iter()
        .map(|dir| {
            let mut score = 0;
            if heading.changes_class(dir) {
                score += scoring.diagonal_turn_bonus;
            }
            let target = grid.neighbor(cell, dir);
            match grid.occupied_neighbors(target, cell) {
                1 => score += scoring.sparse_bonus,
                n if n > 1 => score -= scoring.crowded_penalty,
                _ => {}
            }
            (dir, score)
        })
        .collect();
    if scored.is_empty() {
        return None;
    }
    scored.sort_by_key(|&(_, score)| std::cmp::Reverse(score));
    if scored.len() > 1 && rng.f32() < scoring.random_pick_chance {
        return Some(scored[rng.usize(..scored.len())].0);
    }
    Some(scored[0].0)
}
