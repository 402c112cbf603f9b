//! Grid coordinate types.
//!
//! Maze tiles repeat edge to edge, so cell coordinates live on a torus:
//! stepping off the right edge lands on the left column.

use serde::{Deserialize, Serialize};

/// Cell coordinate inside a generation tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this coordinate shifted by `(dx, dy)` without wrapping.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Wraps the coordinate onto a `cols x rows` torus.
    #[must_use]
    pub const fn wrapped(self, cols: u32, rows: u32) -> Self {
        Self {
            x: self.x.rem_euclid(cols as i32),
            y: self.y.rem_euclid(rows as i32),
        }
    }

    /// Converts to linear index for array access. The coordinate must already
    /// be wrapped.
    #[must_use]
    pub const fn to_index(self, cols: u32) -> usize {
        (self.y as usize) * (cols as usize) + (self.x as usize)
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
