//! Gap-fill scanning.
//!
//! When the live population drops below the seed target, the session looks
//! for dead ends that can still grow and spawns a fresh crawler on one of
//! them. Cells under a live crawler head are locked so that no new stroke
//! starts on a cell whose line is still being drawn.

use mazeglow_common::CellCoord;

use crate::config::GenerationConfig;
use crate::crawler::Crawler;
use crate::direction::DirectionSet;
use crate::grid::Grid;

/// Which part of the grid a scan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillScan {
    /// A band of rows at a random offset, every other column.
    Band,
    /// Every cell. Used to confirm that a job has saturated.
    Full,
}

/// A cell that can host a fill crawler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    cell: CellCoord,
    moves: DirectionSet,
}

/// Looks for a fill candidate and returns a crawler for it.
///
/// On success the spawn cell's degree is already incremented for the new
/// crawler's first edge. Returns `None` when nothing qualifies.
pub fn find_fill(
    grid: &mut Grid,
    locked: &[CellCoord],
    scan: FillScan,
    config: &GenerationConfig,
    rng: &mut fastrand::Rng,
) -> Option<Crawler> {
    let mut strong = Vec::new();
    let mut weak = Vec::new();

    for cell in scan_cells(grid, scan, config, rng) {
        if !grid.is_occupied(cell) || !grid.has_spare_degree(cell) || locked.contains(&cell) {
            continue;
        }
        let valid = grid.valid_moves(cell);
        if valid.is_empty() {
            continue;
        }
        let extendable = grid.extendable_moves(cell);
        if extendable.is_empty() {
            weak.push(Candidate { cell, moves: valid });
        } else {
            strong.push(Candidate { cell, moves: extendable });
        }
    }

    let pool = if strong.is_empty() { &weak } else { &strong };
    if pool.is_empty() {
        return None;
    }
    let pick = pool[rng.usize(..pool.len())];
    let dir = pick.moves.choose(rng)?;
    grid.add_degree(pick.cell);
    Some(Crawler::new(
        pick.cell,
        dir,
        config.fill_force_len,
        grid.color_owner(pick.cell),
        config.grid_size,
    ))
}

fn scan_cells(grid: &Grid, scan: FillScan, config: &GenerationConfig, rng: &mut fastrand::Rng) -> Vec<CellCoord> {
    let cols = grid.cols() as i32;
    let rows = grid.rows() as i32;
    match scan {
        FillScan::Full => (0..rows)
            .flat_map(|y| (0..cols).map(move |x| CellCoord::new(x, y)))
            .collect(),
        FillScan::Band => {
            let band = (config.fill_band_rows as i32).min(rows);
            let start = rng.i32(0..rows);
            let parity = if cols > 1 { rng.i32(0..2) } else { 0 };
            (0..band)
                .flat_map(|dy| {
                    (parity..cols)
                        .step_by(2)
                        .map(move |x| CellCoord::new(x, (start + dy) % rows))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    fn claim_line(grid: &mut Grid, from: CellCoord, len: i32) {
        for i in 0..len {
            let cell = from.offset(i, 0);
            grid.claim(cell, 2);
            grid.add_degree(cell);
        }
    }

    #[test]
    fn test_empty_grid_has_no_candidates() {
        let mut grid = Grid::new(10, 10);
        let mut rng = fastrand::Rng::with_seed(3);
        let found = find_fill(&mut grid, &[], FillScan::Full, &GenerationConfig::default(), &mut rng);
        assert!(found.is_none());
    }

    #[test]
    fn test_full_scan_finds_dead_end() {
        let mut grid = Grid::new(10, 10);
        claim_line(&mut grid, CellCoord::new(2, 5), 3);
        let mut rng = fastrand::Rng::with_seed(3);
        let config = GenerationConfig::default();
        let crawler = find_fill(&mut grid, &[], FillScan::Full, &config, &mut rng).expect("candidate");
        assert!(grid.is_occupied(crawler.cell()));
        assert_eq!(grid.degree(crawler.cell()), 2);
        assert_eq!(crawler.color(), 2);
        assert_eq!(crawler.force_len(), config.fill_force_len);
        assert!(grid.can_move(crawler.cell(), crawler.dir()));
    }

    #[test]
    fn test_locked_cells_are_skipped() {
        let mut grid = Grid::new(6, 6);
        let only = CellCoord::new(3, 3);
        grid.claim(only, 0);
        grid.add_degree(only);
        let mut rng = fastrand::Rng::with_seed(9);
        let config = GenerationConfig::default();
        assert!(find_fill(&mut grid, &[only], FillScan::Full, &config, &mut rng).is_none());
        assert!(find_fill(&mut grid, &[], FillScan::Full, &config, &mut rng).is_some());
    }

    #[test]
    fn test_saturated_cells_are_skipped() {
        let mut grid = Grid::new(6, 6);
        let cell = CellCoord::new(1, 1);
        grid.claim(cell, 0);
        for _ in 0..3 {
            grid.add_degree(cell);
        }
        let mut rng = fastrand::Rng::with_seed(9);
        assert!(find_fill(&mut grid, &[], FillScan::Full, &GenerationConfig::default(), &mut rng).is_none());
    }

    #[test]
    fn test_strong_candidates_preferred() {
        // Every pick must leave room for a second step in its heading.
        let mut grid = Grid::new(12, 12);
        for x in 0..12 {
            for y in 0..5 {
                grid.claim(CellCoord::new(x, y), 0);
            }
        }
        let open = CellCoord::new(6, 8);
        grid.claim(open, 1);
        grid.add_degree(open);
        let mut rng = fastrand::Rng::with_seed(5);
        for _ in 0..20 {
            let mut scratch = grid.clone();
            let crawler =
                find_fill(&mut scratch, &[], FillScan::Full, &GenerationConfig::default(), &mut rng).expect("candidate");
            let next = scratch.neighbor(crawler.cell(), crawler.dir());
            assert!(scratch.can_move(next, crawler.dir()));
        }
    }

    #[test]
    fn test_band_scan_stays_in_bounds() {
        let config = GenerationConfig {
            fill_band_rows: 3,
            ..Default::default()
        };
        let grid = Grid::new(5, 7);
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..50 {
            let cells = scan_cells(&grid, FillScan::Band, &config, &mut rng);
            assert!(!cells.is_empty());
            assert!(cells.len() <= 9);
            assert!(cells.iter().all(|c| c.x < 5 && c.y < 7 && c.x >= 0 && c.y >= 0));
        }
    }

    #[test]
    fn test_single_cell_grid() {
        let mut grid = Grid::new(1, 1);
        grid.claim(CellCoord::new(0, 0), 0);
        let mut rng = fastrand::Rng::with_seed(1);
        let config = GenerationConfig::default();
        assert!(find_fill(&mut grid, &[], FillScan::Band, &config, &mut rng).is_none());
        assert!(!grid.can_move(CellCoord::new(0, 0), Direction::E));
    }
}
