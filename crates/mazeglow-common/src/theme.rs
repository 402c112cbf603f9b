//! Theme signal and the palettes it selects.
//!
//! The host page owns the theme attribute; we only read it. A palette is
//! chosen when a job starts and stays fixed for the rest of that job.

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::ConfigError;

/// Page color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark background, light strokes.
    #[default]
    Dark,
    /// Light background, dark strokes.
    Light,
}

impl Theme {
    /// Resolves the theme from the raw attribute value. Only `"light"`
    /// selects the light theme; a missing or unknown value means dark.
    #[must_use]
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("light") => Self::Light,
            _ => Self::Dark,
        }
    }

    /// Returns the attribute spelling of this theme.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// Whether this is the dark theme.
    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const TEAL: Rgba = Rgba::rgb(0x2C, 0xE1, 0xD8);
const CREAM: Rgba = Rgba::rgb(0xFF, 0xF9, 0xED);
const VERMILION: Rgba = Rgba::rgb(0xE4, 0x51, 0x43);
const INK: Rgba = Rgba::rgb(0x02, 0x02, 0x0D);
const PAPER: Rgba = Rgba::rgb(0xFF, 0xFD, 0xF8);

/// Largest number of stroke colors a palette may hold.
pub const MAX_PALETTE_COLORS: usize = 256;

/// Ordered stroke colors plus a background color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<Rgba>,
    background: Rgba,
}

impl Palette {
    /// Creates a palette with between two and [`MAX_PALETTE_COLORS`] stroke
    /// colors.
    pub fn new(colors: Vec<Rgba>, background: Rgba) -> Result<Self, ConfigError> {
        if colors.len() < 2 {
            return Err(ConfigError::PaletteTooSmall(colors.len()));
        }
        if colors.len() > MAX_PALETTE_COLORS {
            return Err(ConfigError::PaletteTooLarge {
                got: colors.len(),
                max: MAX_PALETTE_COLORS,
            });
        }
        Ok(Self { colors, background })
    }

    /// Palette drawn on the dark page background.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            colors: vec![TEAL, CREAM, VERMILION, CREAM],
            background: INK,
        }
    }

    /// Palette drawn on the light page background.
    #[must_use]
    pub fn light() -> Self {
        Self {
            colors: vec![TEAL, INK, VERMILION, INK],
            background: PAPER,
        }
    }

    /// Selects the palette for a theme.
    #[must_use]
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    /// Number of stroke colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; a palette holds at least two colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Stroke color at `index`, wrapping around the palette.
    #[must_use]
    pub fn color(&self, index: usize) -> Rgba {
        self.colors[index % self.colors.len()]
    }

    /// All stroke colors in order.
    #[must_use]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Background color.
    #[must_use]
    pub const fn background(&self) -> Rgba {
        self.background
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_from_attribute() {
        assert_eq!(Theme::from_attribute(Some("light")), Theme::Light);
        assert_eq!(Theme::from_attribute(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_attribute(Some("sepia")), Theme::Dark);
        assert_eq!(Theme::from_attribute(None), Theme::Dark);
    }

    #[test]
    fn test_dark_palette() {
        let palette = Palette::dark();
        assert_eq!(palette.len(), 4);
        assert_eq!(palette.color(0).to_hex(), "#2CE1D8");
        assert_eq!(palette.background().to_hex(), "#02020D");
    }

    #[test]
    fn test_light_palette() {
        let palette = Palette::light();
        assert_eq!(palette.color(1).to_hex(), "#02020D");
        assert_eq!(palette.background().to_hex(), "#FFFDF8");
    }

    #[test]
    fn test_color_index_wraps() {
        let palette = Palette::dark();
        assert_eq!(palette.color(5), palette.color(1));
    }

    #[test]
    fn test_palette_rejects_single_color() {
        assert!(Palette::new(vec![TEAL], INK).is_err());
        assert!(Palette::new(vec![TEAL, CREAM], INK).is_ok());
    }

    #[test]
    fn test_palette_rejects_too_many_colors() {
        assert!(Palette::new(vec![TEAL; MAX_PALETTE_COLORS], INK).is_ok());
        let err = Palette::new(vec![TEAL; MAX_PALETTE_COLORS + 1], INK).unwrap_err();
        assert!(matches!(err, ConfigError::PaletteTooLarge { got: 257, max: 256 }));
    }
}
