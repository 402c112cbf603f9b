//! Error types for mazeglow.
//!
//! Almost everything that can go wrong while generating a maze is a
//! degenerate input (a crawler with nowhere to go, a grid too small to seed)
//! and is handled as a value. The errors below cover the remaining cases:
//! the host platform refusing to give us a worker, a broken channel, or a
//! configuration that cannot be used.

use thiserror::Error;

/// Top-level error type for mazeglow operations.
#[derive(Debug, Error)]
pub enum MazeError {
    /// Worker/transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Color parsing errors
    #[error("Color error: {0}")]
    Color(#[from] ColorParseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors crossing the worker boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The platform could not start a background worker.
    #[error("Failed to spawn generation worker: {0}")]
    SpawnFailed(String),

    /// The other side of the channel has gone away.
    #[error("Worker channel disconnected")]
    Disconnected,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A value is outside the range the generator can work with.
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid {
        /// Offending field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A palette needs at least two stroke colors.
    #[error("Palette needs at least 2 colors, got {0}")]
    PaletteTooSmall(usize),

    /// Palette indices are stored per cell in a single byte.
    #[error("Palette allows at most {max} colors, got {got}")]
    PaletteTooLarge {
        /// Colors supplied
        got: usize,
        /// Upper bound
        max: usize,
    },
}

/// Failure to parse a `#RRGGBB` / `#RRGGBBAA` color literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color literal `{0}`")]
pub struct ColorParseError(pub String);

/// Result type alias for mazeglow operations.
pub type MazeResult<T> = Result<T, MazeError>;
