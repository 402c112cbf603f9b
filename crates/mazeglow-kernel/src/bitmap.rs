//! Move-only tile snapshots.
//!
//! A [`TileBitmap`] is handed from the generation side to the compositor by
//! value. Whoever holds it last must release it with [`TileBitmap::close`]
//! once it is superseded. The type is not `Clone`.

use image::RgbaImage;
use mazeglow_common::Rgba;
use tracing::trace;

/// A finished copy of the tile surface.
#[derive(Debug)]
pub struct TileBitmap {
    image: RgbaImage,
}

impl TileBitmap {
    /// Wraps an image buffer.
    #[must_use]
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
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

    /// Read access to the pixels.
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Releases the bitmap.
    pub fn close(self) {
        trace!("Released {}x{} tile bitmap", self.width(), self.height());
    }
}
