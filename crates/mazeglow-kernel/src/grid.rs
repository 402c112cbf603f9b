//! Per-tile grid state.
//!
//! Three parallel arrays indexed by cell: occupancy, connection degree and
//! the palette index last written to the cell. The grid is a torus so that
//! the finished tile repeats without seams.
//!
//! Within one job occupancy only ever turns on and degrees only ever grow;
//! the arrays are reset wholesale when the next job starts.

use mazeglow_common::{CellCoord, MAX_PALETTE_COLORS};

use crate::direction::{Direction, DirectionSet};

/// No junction may have more connections than this.
pub const MAX_DEGREE: u8 = 3;

/// Occupancy, degree and color ownership for a `cols x rows` torus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: u32,
    rows: u32,
    occupied: Vec<bool>,
    degree: Vec<u8>,
    color_owner: Vec<u8>,
}

impl Grid {
    /// Creates an empty grid. Zero dimensions are bumped to one cell.
    #[must_use]
    pub fn new(cols: u32, rows: u32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let len = (cols as usize) * (rows as usize);
        Self {
            cols,
            rows,
            occupied: vec![false; len],
            degree: vec![0; len],
            color_owner: vec![0; len],
        }
    }

    /// Resets every cell to empty.
    pub fn clear(&mut self) {
        self.occupied.fill(false);
        self.degree.fill(0);
        self.color_owner.fill(0);
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.occupied.len()
    }

    /// Wraps a coordinate onto the torus.
    #[must_use]
    pub const fn wrap(&self, cell: CellCoord) -> CellCoord {
        cell.wrapped(self.cols, self.rows)
    }

    fn index(&self, cell: CellCoord) -> usize {
        self.wrap(cell).to_index(self.cols)
    }

    /// The cell one step from `cell` in `dir`.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, dir: Direction) -> CellCoord {
        let (dx, dy) = dir.vector();
        self.wrap(cell.offset(dx, dy))
    }

    /// Whether any crawler has claimed the cell this job.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.occupied[self.index(cell)]
    }

    /// Marks the cell as claimed and records its color.
    pub fn claim(&mut self, cell: CellCoord, color: usize) {
        let index = self.index(cell);
        debug_assert!(color < MAX_PALETTE_COLORS, "palette index {color} out of range");
        self.occupied[index] = true;
        self.color_owner[index] = color as u8;
    }

    /// Connection count of the cell.
    #[must_use]
    pub fn degree(&self, cell: CellCoord) -> u8 {
        self.degree[self.index(cell)]
    }

    /// Adds one connection to the cell.
    pub fn add_degree(&mut self, cell: CellCoord) {
        let index = self.index(cell);
        self.degree[index] = self.degree[index].saturating_add(1);
    }

    /// Whether another connection may be attached to the cell.
    #[must_use]
    pub fn has_spare_degree(&self, cell: CellCoord) -> bool {
        self.degree(cell) < MAX_DEGREE
    }

    /// Palette index last written to the cell.
    #[must_use]
    pub fn color_owner(&self, cell: CellCoord) -> usize {
        self.color_owner[self.index(cell)] as usize
    }

    /// Whether both cardinal cells beside a diagonal step are occupied.
    /// Moving diagonally between them would visually cross an existing line.
    #[must_use]
    pub fn cuts_corner(&self, from: CellCoord, dir: Direction) -> bool {
        if !dir.is_diagonal() {
            return false;
        }
        let (dx, dy) = dir.vector();
        self.is_occupied(from.offset(dx, 0)) && self.is_occupied(from.offset(0, dy))
    }

    /// Whether a crawler at `from` may step in `dir`.
    #[must_use]
    pub fn can_move(&self, from: CellCoord, dir: Direction) -> bool {
        !self.is_occupied(self.neighbor(from, dir)) && !self.cuts_corner(from, dir)
    }

    /// All legal steps out of `from`.
    #[must_use]
    pub fn valid_moves(&self, from: CellCoord) -> DirectionSet {
        Direction::ALL
            .into_iter()
            .filter(|dir| self.can_move(from, *dir))
            .collect()
    }

    /// Steps out of `from` that leave room for at least one more step in the
    /// same heading.
    #[must_use]
    pub fn extendable_moves(&self, from: CellCoord) -> DirectionSet {
        Direction::ALL
            .into_iter()
            .filter(|dir| {
                if !self.can_move(from, *dir) {
                    return false;
                }
                let next = self.neighbor(from, *dir);
                let beyond = self.neighbor(next, *dir);
                beyond != self.wrap(from) && self.can_move(next, *dir)
            })
            .collect()
    }

    /// Occupied cells reachable in one step from `cell`, not counting
    /// `exclude` (normally the cell a crawler is coming from).
    #[must_use]
    pub fn occupied_neighbors(&self, cell: CellCoord, exclude: CellCoord) -> usize {
        let exclude = self.wrap(exclude);
        Direction::ALL
            .into_iter()
            .map(|dir| self.neighbor(cell, dir))
            .filter(|n| *n != exclude && self.is_occupied(*n))
            .count()
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|o| **o).count()
    }

    /// Highest degree anywhere on the grid.
    #[must_use]
    pub fn max_degree(&self) -> u8 {
        self.degree.iter().copied().max().unwrap_or(0)
    }

    /// Raw occupancy array, row-major.
    #[must_use]
    pub fn occupancy(&self) -> &[bool] {
        &self.occupied
    }
}
