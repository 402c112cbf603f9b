//! Glow sprites drawn over crawler heads.
//!
//! Each palette color gets one pre-rendered radial gradient, from the color
//! at the center to fully transparent at the rim. The compositor stamps the
//! sprite centered on every [`HeadMarker`] it receives with a frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use image::RgbaImage;
use mazeglow_common::Rgba;

/// Position and color of one live crawler head, in tile pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct HeadMarker {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
    /// Packed `0xRRGGBBAA` color
    pub color: u32,
}

impl HeadMarker {
    /// Creates a marker.
    #[must_use]
    pub fn new(position: Vec2, color: Rgba) -> Self {
        Self {
            x: position.x,
            y: position.y,
            color: color.to_packed(),
        }
    }

    /// Head position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Head color.
    #[must_use]
    pub fn rgba(&self) -> Rgba {
        Rgba::from_packed(self.color)
    }
}

/// A pre-rendered radial gradient.
#[derive(Debug, Clone)]
pub struct GlowSprite {
    color: Rgba,
    radius: u32,
    image: RgbaImage,
}

impl GlowSprite {
    /// Renders a sprite of `radius` pixels. The image is `2 * radius + 1`
    /// pixels square with the center on the middle pixel.
    #[must_use]
    pub fn render(color: Rgba, radius: u32) -> Self {
        let radius = radius.max(1);
        let size = radius * 2 + 1;
        let center = Vec2::splat(radius as f32 + 0.5);
        let r = radius as f32;
        let image = RgbaImage::from_fn(size, size, |x, y| {
            let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
            let falloff = (1.0 - d / r).clamp(0.0, 1.0);
            let alpha = (f32::from(color.a) * falloff).round() as u8;
            image::Rgba(color.with_alpha(alpha).to_array())
        });
        Self { color, radius, image }
    }

    /// Color at the center.
    #[must_use]
    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Radius in pixels.
    #[must_use]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Sprite pixels.
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Lazily filled cache of sprites keyed by color, all sharing one radius.
#[derive(Debug, Clone, Default)]
pub struct GlowAtlas {
    radius: u32,
    sprites: Vec<GlowSprite>,
}

impl GlowAtlas {
    /// Creates an empty atlas.
    #[must_use]
    pub fn new(radius: u32) -> Self {
        Self {
            radius,
            sprites: Vec::new(),
        }
    }

    /// Radius shared by all sprites.
    #[must_use]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Returns the sprite for `color`, rendering it on first use.
    pub fn sprite(&mut self, color: Rgba) -> &GlowSprite {
        let index = if let Some(index) = self.sprites.iter().position(|s| s.color == color) {
            index
        } else {
            self.sprites.push(GlowSprite::render(color, self.radius));
            self.sprites.len() - 1
        };
        &self.sprites[index]
    }

    /// Number of cached sprites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Whether nothing has been rendered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Drops all sprites and switches to a new radius.
    pub fn reset(&mut self, radius: u32) {
        self.radius = radius;
        self.sprites.clear();
    }
}
