//! # Mazeglow Common
//!
//! Common types, utilities, and shared abstractions for the mazeglow
//! background effect.
//!
//! This crate provides foundational types used by the kernel and the engine:
//! - Cell coordinates with toroidal wrapping
//! - Request and job identifiers
//! - Colors, themes and palettes
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod color;
pub mod coords;
pub mod error;
pub mod ids;
pub mod theme;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::color::*;
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::theme::*;
}

pub use prelude::*;
