//! Movement directions.
//!
//! Six headings: the four cardinals plus the NW/SE diagonal pair. NE and SW
//! are deliberately absent, which gives the maze its slanted grain.

use glam::Vec2;

/// A crawler heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Up
    N,
    /// Down
    S,
    /// Right
    E,
    /// Left
    W,
    /// Up-left
    NW,
    /// Down-right
    SE,
}

impl Direction {
    /// All headings, in table order.
    pub const ALL: [Self; 6] = [Self::N, Self::S, Self::E, Self::W, Self::NW, Self::SE];

    /// Grid step `(dx, dy)`; y grows downwards.
    #[must_use]
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Self::N => (0, -1),
            Self::S => (0, 1),
            Self::E => (1, 0),
            Self::W => (-1, 0),
            Self::NW => (-1, -1),
            Self::SE => (1, 1),
        }
    }

    /// Grid step as a float vector.
    #[must_use]
    pub fn as_vec2(self) -> Vec2 {
        let (dx, dy) = self.vector();
        Vec2::new(dx as f32, dy as f32)
    }

    /// Whether both components are non-zero.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(self, Self::NW | Self::SE)
    }

    /// Whether turning from `self` to `other` switches between cardinal and
    /// diagonal headings (a 45 degree style turn).
    #[must_use]
    pub const fn changes_class(self, other: Self) -> bool {
        self.is_diagonal() != other.is_diagonal()
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A small set of directions backed by a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionSet(u8);

impl DirectionSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Adds a direction.
    pub fn insert(&mut self, dir: Direction) {
        self.0 |= dir.bit();
    }

    /// Returns the set without `dir`.
    #[must_use]
    pub const fn without(self, dir: Direction) -> Self {
        Self(self.0 & !dir.bit())
    }

    /// Membership test.
    #[must_use]
    pub const fn contains(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    /// Number of directions in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates in table order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }

    /// Picks a member uniformly at random.
    pub fn choose(self, rng: &mut fastrand::Rng) -> Option<Direction> {
        if self.is_empty() {
            return None;
        }
        self.iter().nth(rng.usize(..self.len()))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for dir in iter {
            set.insert(dir);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonals_have_two_components() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.vector();
            assert_eq!(dir.is_diagonal(), dx != 0 && dy != 0);
        }
    }

    #[test]
    fn test_table_is_asymmetric() {
        let vectors: Vec<_> = Direction::ALL.iter().map(|d| d.vector()).collect();
        assert!(!vectors.contains(&(1, -1)));
        assert!(!vectors.contains(&(-1, 1)));
        assert_eq!(vectors.len(), 6);
    }

    #[test]
    fn test_changes_class() {
        assert!(Direction::N.changes_class(Direction::NW));
        assert!(!Direction::N.changes_class(Direction::E));
        assert!(!Direction::SE.changes_class(Direction::NW));
    }

    #[test]
    fn test_direction_set_ops() {
        let set: DirectionSet = [Direction::N, Direction::SE].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(Direction::SE));
        assert!(!set.without(Direction::SE).contains(Direction::SE));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Direction::N, Direction::SE]);
    }

    #[test]
    fn test_choose_from_empty() {
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(DirectionSet::EMPTY.choose(&mut rng), None);
    }

    #[test]
    fn test_choose_is_member() {
        let mut rng = fastrand::Rng::with_seed(7);
        let set: DirectionSet = [Direction::W, Direction::S].into_iter().collect();
        for _ in 0..32 {
            let dir = set.choose(&mut rng).expect("non-empty");
            assert!(set.contains(dir));
        }
    }
}
