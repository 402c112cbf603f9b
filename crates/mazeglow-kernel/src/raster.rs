//! Tile surface rasterization.
//!
//! The surface persists across ticks: each flush paints the newly buffered
//! strokes on top of what is already there. It is only cleared when a job
//! starts.

use glam::Vec2;
use image::RgbaImage;
use mazeglow_common::{Palette, Rgba};

use crate::bitmap::TileBitmap;
use crate::blend;
use crate::stroke::{Segment, StrokeBatch};

/// Persistent drawing surface for one tile.
#[derive(Debug, Clone)]
pub struct TileSurface {
    image: RgbaImage,
    stroke_width: f32,
}

impl TileSurface {
    /// Creates a surface filled with `background`.
    #[must_use]
    pub fn new(width: u32, height: u32, stroke_width: f32, background: Rgba) -> Self {
        let mut surface = Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
            stroke_width,
        };
        surface.clear(background);
        surface
    }

    /// Fills the whole surface with `background`.
    pub fn clear(&mut self, background: Rgba) {
        for px in self.image.pixels_mut() {
            px.0 = background.to_array();
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Color at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        Rgba::new(r, g, b, a)
    }

    /// Paints every buffered shape, one palette color at a time. Returns the
    /// number of shapes drawn.
    pub fn flush(&mut self, batch: &StrokeBatch, palette: &Palette) -> usize {
        let mut drawn = 0;
        for color_index in 0..batch.color_count() {
            let color = palette.color(color_index);
            for segment in batch.segments(color_index) {
                self.draw_segment(*segment, color);
                drawn += 1;
            }
            for cap in batch.caps(color_index) {
                self.draw_segment(Segment::new(*cap, *cap), color);
                drawn += 1;
            }
        }
        drawn
    }

    /// Draws a round-capped, anti-aliased line clipped to the surface.
    pub fn draw_segment(&mut self, segment: Segment, color: Rgba) {
        let half = self.stroke_width * 0.5;
        let pad = Vec2::splat(half + 1.0);
        let lo = segment.from.min(segment.to) - pad;
        let hi = segment.from.max(segment.to) + pad;

        let x0 = lo.x.floor().max(0.0) as u32;
        let y0 = lo.y.floor().max(0.0) as u32;
        let x1 = (hi.x.ceil().max(0.0) as u32).min(self.width());
        let y1 = (hi.y.ceil().max(0.0) as u32).min(self.height());

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = half + 0.5 - segment.distance_to(center);
                if coverage > 0.0 {
                    blend::over(self.image.get_pixel_mut(x, y), color, coverage);
                }
            }
        }
    }

    /// Copies the surface into a transferable bitmap.
    #[must_use]
    pub fn snapshot(&self) -> TileBitmap {
        TileBitmap::new(self.image.clone())
    }
}
