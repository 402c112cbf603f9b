//! Stroke accumulation.
//!
//! Moving crawlers emit short line segments every tick. They are buffered
//! per palette color and flushed onto the tile surface in one pass at the
//! end of the tick. Anything drawn close to a tile edge is also emitted a
//! tile-width away on the opposite side, so that repeated tiles join up.

use glam::Vec2;

/// A straight stroke piece in tile pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point
    pub from: Vec2,
    /// End point
    pub to: Vec2,
}

impl Segment {
    /// Creates a segment.
    #[must_use]
    pub const fn new(from: Vec2, to: Vec2) -> Self {
        Self { from, to }
    }

    /// Returns the segment moved by `offset`.
    #[must_use]
    pub fn translated(self, offset: Vec2) -> Self {
        Self::new(self.from + offset, self.to + offset)
    }

    /// Shortest distance from `point` to the segment.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let span = self.to - self.from;
        let len_sq = span.length_squared();
        if len_sq <= f32::EPSILON {
            return point.distance(self.from);
        }
        let t = ((point - self.from).dot(span) / len_sq).clamp(0.0, 1.0);
        point.distance(self.from + span * t)
    }
}

/// Per-color stroke buffer for one tick.
#[derive(Debug, Clone)]
pub struct StrokeBatch {
    segments: Vec<Vec<Segment>>,
    caps: Vec<Vec<Vec2>>,
    tile: Vec2,
    margin: f32,
}

impl StrokeBatch {
    /// Creates an empty batch for `colors` palette entries on a tile of
    /// `tile` pixels. Strokes within `margin` of an edge are duplicated.
    #[must_use]
    pub fn new(colors: usize, tile: Vec2, margin: f32) -> Self {
        Self {
            segments: vec![Vec::new(); colors],
            caps: vec![Vec::new(); colors],
            tile,
            margin,
        }
    }

    /// Queues a segment plus its wrap duplicates.
    pub fn push_segment(&mut self, color: usize, from: Vec2, to: Vec2) {
        let segment = Segment::new(from, to);
        let offsets = self.wrap_offsets(from.min(to), from.max(to));
        let n = self.segments.len();
        let bucket = &mut self.segments[color % n];
        for offset in offsets.iter().flatten() {
            bucket.push(segment.translated(*offset));
        }
    }

    /// Queues a round dot plus its wrap duplicates.
    pub fn push_cap(&mut self, color: usize, center: Vec2) {
        let offsets = self.wrap_offsets(center, center);
        let n = self.caps.len();
        let bucket = &mut self.caps[color % n];
        for offset in offsets.iter().flatten() {
            bucket.push(center + *offset);
        }
    }

    /// Offsets at which a shape spanning `min..max` must be drawn. The zero
    /// offset always comes first.
    fn wrap_offsets(&self, min: Vec2, max: Vec2) -> [Option<Vec2>; 9] {
        let axis = |lo: f32, hi: f32, size: f32| {
            let mut shifts = [Some(0.0), None, None];
            if lo < self.margin {
                shifts[1] = Some(size);
            }
            if hi > size - self.margin {
                shifts[2] = Some(-size);
            }
            shifts
        };
        let xs = axis(min.x, max.x, self.tile.x);
        let ys = axis(min.y, max.y, self.tile.y);

        let mut out = [None; 9];
        let mut n = 0;
        for y in ys.iter().flatten() {
            for x in xs.iter().flatten() {
                out[n] = Some(Vec2::new(*x, *y));
                n += 1;
            }
        }
        out
    }

    /// Buffered segments for one color.
    #[must_use]
    pub fn segments(&self, color: usize) -> &[Segment] {
        &self.segments[color % self.segments.len()]
    }

    /// Buffered caps for one color.
    #[must_use]
    pub fn caps(&self, color: usize) -> &[Vec2] {
        &self.caps[color % self.caps.len()]
    }

    /// Number of palette buckets.
    #[must_use]
    pub fn color_count(&self) -> usize {
        self.segments.len()
    }

    /// Total queued shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum::<usize>() + self.caps.iter().map(Vec::len).sum::<usize>()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all queued shapes, keeping allocations.
    pub fn clear(&mut self) {
        self.segments.iter_mut().for_each(Vec::clear);
        self.caps.iter_mut().for_each(Vec::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> StrokeBatch {
        StrokeBatch::new(2, Vec2::splat(300.0), 10.0)
    }

    #[test]
    fn test_interior_segment_not_duplicated() {
        let mut strokes = batch();
        strokes.push_segment(0, Vec2::new(100.0, 100.0), Vec2::new(109.0, 100.0));
        assert_eq!(strokes.segments(0).len(), 1);
        assert!(strokes.segments(1).is_empty());
    }

    #[test]
    fn test_left_edge_duplicated_to_right() {
        let mut strokes = batch();
        strokes.push_segment(0, Vec2::new(5.0, 100.0), Vec2::new(14.0, 100.0));
        let segs = strokes.segments(0);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].from, Vec2::new(305.0, 100.0));
    }

    #[test]
    fn test_segment_crossing_right_edge() {
        let mut strokes = batch();
        strokes.push_segment(1, Vec2::new(295.0, 50.0), Vec2::new(304.0, 50.0));
        let segs = strokes.segments(1);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].from, Vec2::new(-5.0, 50.0));
        assert_eq!(segs[1].to, Vec2::new(4.0, 50.0));
    }

    #[test]
    fn test_corner_gets_three_duplicates() {
        let mut strokes = batch();
        strokes.push_segment(0, Vec2::new(2.0, 2.0), Vec2::new(4.0, 4.0));
        assert_eq!(strokes.segments(0).len(), 4);
    }

    #[test]
    fn test_caps_wrap() {
        let mut strokes = batch();
        strokes.push_cap(0, Vec2::new(150.0, 295.0));
        assert_eq!(strokes.caps(0), &[Vec2::new(150.0, 295.0), Vec2::new(150.0, -5.0)]);
    }

    #[test]
    fn test_color_index_wraps_palette() {
        let mut strokes = batch();
        strokes.push_segment(3, Vec2::new(100.0, 100.0), Vec2::new(110.0, 100.0));
        strokes.push_cap(2, Vec2::new(150.0, 150.0));
        assert_eq!(strokes.segments(1).len(), 1);
        assert_eq!(strokes.caps(0), &[Vec2::new(150.0, 150.0)]);
    }

    #[test]
    fn test_clear() {
        let mut strokes = batch();
        strokes.push_segment(0, Vec2::ZERO, Vec2::ONE);
        assert!(!strokes.is_empty());
        strokes.clear();
        assert!(strokes.is_empty());
    }

    #[test]
    fn test_distance_to_segment() {
        let seg = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert!((seg.distance_to(Vec2::new(5.0, 3.0)) - 3.0).abs() < 1e-5);
        assert!((seg.distance_to(Vec2::new(13.0, 4.0)) - 5.0).abs() < 1e-5);
        let dot = Segment::new(Vec2::ONE, Vec2::ONE);
        assert!((dot.distance_to(Vec2::new(4.0, 5.0)) - 5.0).abs() < 1e-5);
    }
}
