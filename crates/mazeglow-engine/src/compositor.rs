//! Composites the latest tile onto the viewport.
//!
//! The tile is repeated to cover the viewport, shifted vertically with the
//! page scroll position, then glow sprites are stamped over every crawler
//! head in every tile copy. The result is faded by the lifecycle opacity.

use image::imageops;
use image::RgbaImage;
use mazeglow_common::{Rgba, Theme};
use mazeglow_kernel::{BlendMode, GlowAtlas, HeadMarker, TileBitmap};
use tracing::trace;

use mazeglow_kernel::blend;

/// Owns the displayed tile and draws frames from it.
#[derive(Debug)]
pub struct Compositor {
    bitmap: Option<TileBitmap>,
    heads: Vec<HeadMarker>,
    theme: Theme,
    atlas: GlowAtlas,
    glow_enabled: bool,
    radius_dark: u32,
    radius_light: u32,
}

impl Compositor {
    /// Creates a compositor with nothing to show.
    #[must_use]
    pub fn new(glow_enabled: bool, radius_dark: u32, radius_light: u32) -> Self {
        Self {
            bitmap: None,
            heads: Vec::new(),
            theme: Theme::Dark,
            atlas: GlowAtlas::new(radius_dark),
            glow_enabled,
            radius_dark,
            radius_light,
        }
    }

    /// Switches glow blending and radius to `theme`.
    pub fn set_theme(&mut self, theme: Theme) {
        if theme == self.theme && !self.atlas.is_empty() {
            return;
        }
        self.theme = theme;
        let radius = match theme {
            Theme::Dark => self.radius_dark,
            Theme::Light => self.radius_light,
        };
        self.atlas.reset(radius);
    }

    /// Theme used for glows.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Takes ownership of a new tile, closing the one it replaces.
    pub fn adopt(&mut self, bitmap: TileBitmap, heads: Vec<HeadMarker>) {
        if let Some(previous) = self.bitmap.replace(bitmap) {
            previous.close();
        }
        self.heads = heads;
    }

    /// Forgets the head positions of the previous job.
    pub fn clear_heads(&mut self) {
        self.heads.clear();
    }

    /// Closes the displayed tile.
    pub fn release(&mut self) {
        if let Some(bitmap) = self.bitmap.take() {
            bitmap.close();
        }
        self.heads.clear();
    }

    /// Whether a tile is being displayed.
    #[must_use]
    pub fn has_bitmap(&self) -> bool {
        self.bitmap.is_some()
    }

    /// Edge length of the displayed tile.
    #[must_use]
    pub fn tile_size(&self) -> Option<u32> {
        self.bitmap.as_ref().map(TileBitmap::width)
    }

    /// Crawler heads of the displayed frame.
    #[must_use]
    pub fn heads(&self) -> &[HeadMarker] {
        &self.heads
    }

    /// Draws one viewport frame. The frame is cleared to transparent first;
    /// with no tile it stays that way.
    pub fn compose(&mut self, frame: &mut RgbaImage, scroll_y: f32, opacity: f32) {
        for pixel in frame.pixels_mut() {
            pixel.0 = [0; 4];
        }
        let Some(bitmap) = self.bitmap.as_ref() else {
            return;
        };
        let size = bitmap.width().max(1);
        let (width, height) = frame.dimensions();
        let offset_y = -scroll_y.rem_euclid(size as f32).floor() as i64;
        let cols = width.div_ceil(size) + 1;
        let rows = height.div_ceil(size) + 2;
        let tile = i64::from(size);

        let origins: Vec<(i64, i64)> = (0..rows)
            .flat_map(|row| {
                (0..cols).map(move |col| (i64::from(col) * tile, offset_y + (i64::from(row) - 1) * tile))
            })
            .collect();

        for &(x, y) in &origins {
            imageops::replace(frame, bitmap.image(), x, y);
        }

        if self.glow_enabled && !self.heads.is_empty() {
            let mode = if self.theme.is_dark() {
                BlendMode::Screen
            } else {
                BlendMode::SourceOver
            };
            let stamped = self.stamp_glows(frame, &origins, mode);
            trace!("Stamped {stamped} glows");
        }

        if opacity < 1.0 {
            blend::fade(frame, opacity);
        }
    }

    fn stamp_glows(&mut self, frame: &mut RgbaImage, origins: &[(i64, i64)], mode: BlendMode) -> usize {
        let (width, height) = (i64::from(frame.width()), i64::from(frame.height()));
        let radius = i64::from(self.atlas.radius().max(1));
        let mut stamped = 0;

        for head in &self.heads {
            let sprite = self.atlas.sprite(head.rgba());
            for &(ox, oy) in origins {
                let cx = ox + head.x.floor() as i64;
                let cy = oy + head.y.floor() as i64;
                if cx < -radius || cy < -radius || cx > width + radius || cy > height + radius {
                    continue;
                }
                for (sx, sy, texel) in sprite.image().enumerate_pixels() {
                    if texel.0[3] == 0 {
                        continue;
                    }
                    let px = cx - radius + i64::from(sx);
                    let py = cy - radius + i64::from(sy);
                    if px < 0 || py < 0 || px >= width || py >= height {
                        continue;
                    }
                    let [r, g, b, a] = texel.0;
                    mode.apply(frame.get_pixel_mut(px as u32, py as u32), Rgba::new(r, g, b, a), 1.0);
                }
                stamped += 1;
            }
        }
        stamped
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn tile(size: u32) -> TileBitmap {
        // Left half red, right half blue, top row green.
        TileBitmap::new(RgbaImage::from_fn(size, size, |x, y| {
            if y == 0 {
                image::Rgba([0, 255, 0, 255])
            } else if x < size / 2 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        }))
    }

    #[test]
    fn test_empty_compositor_draws_nothing() {
        let mut compositor = Compositor::new(true, 25, 20);
        let mut frame = RgbaImage::from_pixel(8, 8, image::Rgba([9, 9, 9, 9]));
        compositor.compose(&mut frame, 0.0, 1.0);
        assert!(frame.pixels().all(|p| p.0 == [0; 4]));
    }

    #[test]
    fn test_tiles_cover_viewport() {
        let mut compositor = Compositor::new(false, 25, 20);
        compositor.adopt(tile(10), Vec::new());
        let mut frame = RgbaImage::new(35, 27);
        compositor.compose(&mut frame, 0.0, 1.0);
        assert!(frame.pixels().all(|p| p.0[3] == 255));
        // Tiles repeat every 10 pixels in both directions.
        assert_eq!(frame.get_pixel(2, 3), frame.get_pixel(32, 23));
        assert_eq!(frame.get_pixel(0, 10).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_scroll_shifts_tiles_up() {
        let mut compositor = Compositor::new(false, 25, 20);
        compositor.adopt(tile(10), Vec::new());
        let mut frame = RgbaImage::new(10, 20);
        compositor.compose(&mut frame, 3.0, 1.0);
        // The green top row lands at 10 - 3.
        assert_eq!(frame.get_pixel(1, 7).0, [0, 255, 0, 255]);
        assert_ne!(frame.get_pixel(1, 0).0, [0, 255, 0, 255]);
        // Scrolling a whole tile looks the same as not scrolling.
        let mut again = RgbaImage::new(10, 20);
        compositor.compose(&mut again, 13.0, 1.0);
        assert_eq!(frame, again);
    }

    #[test]
    fn test_opacity_fades_alpha() {
        let mut compositor = Compositor::new(false, 25, 20);
        compositor.adopt(tile(4), Vec::new());
        let mut frame = RgbaImage::new(4, 4);
        compositor.compose(&mut frame, 0.0, 0.5);
        assert!(frame.pixels().all(|p| (127..=128).contains(&p.0[3])));
    }

    #[test]
    fn test_dark_glow_brightens_heads() {
        let mut compositor = Compositor::new(true, 3, 2);
        let dark = TileBitmap::new(RgbaImage::from_pixel(20, 20, image::Rgba([2, 2, 13, 255])));
        let heads = vec![HeadMarker::new(Vec2::new(10.0, 10.0), Rgba::rgb(0x2C, 0xE1, 0xD8))];
        compositor.adopt(dark, heads);
        let mut frame = RgbaImage::new(20, 20);
        compositor.compose(&mut frame, 0.0, 1.0);
        let lit = frame.get_pixel(10, 10).0;
        assert!(lit[1] > 100);
        assert_eq!(frame.get_pixel(0, 0).0, [2, 2, 13, 255]);
    }

    #[test]
    fn test_theme_switch_resets_radius() {
        let mut compositor = Compositor::new(true, 25, 20);
        compositor.set_theme(Theme::Light);
        assert_eq!(compositor.theme(), Theme::Light);
        assert_eq!(compositor.atlas.radius(), 20);
    }

    #[test]
    fn test_adopt_replaces_and_release_clears() {
        let mut compositor = Compositor::new(true, 25, 20);
        compositor.adopt(tile(6), Vec::new());
        compositor.adopt(tile(8), Vec::new());
        assert_eq!(compositor.tile_size(), Some(8));
        compositor.release();
        assert!(!compositor.has_bitmap());
    }
}
