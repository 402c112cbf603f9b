//! Pixel blending for straight-alpha RGBA buffers.

use image::Rgba as Pixel;
use mazeglow_common::Rgba;

/// How a source color combines with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Ordinary alpha compositing.
    #[default]
    SourceOver,
    /// Screen: brightens, never darkens. Used for glows on dark themes.
    Screen,
}

impl BlendMode {
    /// Blends `src` scaled by `coverage` (0.0-1.0) into `dst`.
    pub fn apply(self, dst: &mut Pixel<u8>, src: Rgba, coverage: f32) {
        match self {
            Self::SourceOver => over(dst, src, coverage),
            Self::Screen => screen(dst, src, coverage),
        }
    }
}

#[inline]
fn unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

#[inline]
fn byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Porter-Duff source-over on straight alpha.
pub fn over(dst: &mut Pixel<u8>, src: Rgba, coverage: f32) {
    let sa = unit(src.a) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let [dr, dg, db, da] = dst.0;
    let da = unit(da);
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| {
        if out_a <= 0.0 {
            0
        } else {
            byte((unit(s) * sa + unit(d) * da * (1.0 - sa)) / out_a)
        }
    };
    dst.0 = [
        channel(src.r, dr),
        channel(src.g, dg),
        channel(src.b, db),
        byte(out_a),
    ];
}

/// Screen blend weighted by source alpha and coverage.
pub fn screen(dst: &mut Pixel<u8>, src: Rgba, coverage: f32) {
    let sa = unit(src.a) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let [dr, dg, db, da] = dst.0;
    let channel = |s: u8, d: u8| {
        let d = unit(d);
        byte(d + sa * unit(s) * (1.0 - d))
    };
    let da = unit(da);
    dst.0 = [
        channel(src.r, dr),
        channel(src.g, dg),
        channel(src.b, db),
        byte(sa + da * (1.0 - sa)),
    ];
}

/// Multiplies the alpha channel of every pixel by `opacity`.
pub fn fade(pixels: &mut [u8], opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if (opacity - 1.0).abs() < f32::EPSILON {
        return;
    }
    for px in pixels.chunks_exact_mut(4) {
        px[3] = byte(unit(px[3]) * opacity);
    }
}
