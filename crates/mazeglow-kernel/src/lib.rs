//! # Mazeglow Kernel
//!
//! Procedural maze generation for the mazeglow background.
//!
//! This crate grows a seamlessly tiling maze texture:
//! - Direction table and toroidal grid store
//! - Crawler agents that extend the maze one cell per step
//! - Gap-fill scanning that keeps the tile busy until it saturates
//! - Stroke batching with wrap duplication at tile edges
//! - Anti-aliased rasterization onto a persistent tile surface
//! - Glow sprites for crawler heads
//!
//! ## Architecture
//!
//! A [`GenerationSession`] owns one job. Each call to
//! [`GenerationSession::tick`] updates every crawler, spawns fill crawlers
//! when the population runs low and flushes the tick's strokes onto the tile.
//! [`GenerationSession::snapshot`] hands out a move-only [`TileBitmap`] copy
//! of the tile together with [`HeadMarker`]s for the glow pass.
//!
//! ## Invariants
//!
//! Within one job no cell ever carries more than three connections,
//! occupancy never reverts, and no diagonal step squeezes between two
//! occupied cells.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod bitmap;
pub mod blend;
pub mod config;
pub mod crawler;
pub mod direction;
pub mod fill;
pub mod glow;
pub mod grid;
pub mod raster;
pub mod session;
pub mod stroke;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bitmap::*;
    pub use crate::blend::BlendMode;
    pub use crate::config::*;
    pub use crate::crawler::*;
    pub use crate::direction::*;
    pub use crate::fill::*;
    pub use crate::glow::*;
    pub use crate::grid::*;
    pub use crate::raster::*;
    pub use crate::session::*;
    pub use crate::stroke::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use mazeglow_common::Palette;

    #[test]
    fn test_head_marker_size() {
        // Markers are shipped across the worker boundary as plain bytes.
        assert_eq!(std::mem::size_of::<HeadMarker>(), 12);
    }

    #[test]
    fn test_session_snapshot_matches_tile() {
        let config = GenerationConfig {
            rng_seed: Some(42),
            ..Default::default()
        };
        let mut session = GenerationSession::new(config, Palette::dark(), 8);
        session.tick();
        let bitmap = session.snapshot();
        assert_eq!(bitmap.width(), session.tile_size_px());
        assert_eq!(bitmap.height(), session.tile_size_px());
        bitmap.close();
    }
}
