//! Ink colors and the swatch palette.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CanvasError;

/// An opaque RGB ink color.
///
/// Parses from CSS-style `rgb(r,g,b)` or `#rrggbb` strings and serializes back
/// to the `rgb(r,g,b)` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Pure black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Pure white, the default ink.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create a color from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    fn parse_rgb_fn(args: &str) -> Option<Self> {
        let mut parts = args.split(',').map(|p| p.trim().parse::<u8>().ok());
        let color = Self::rgb(parts.next()??, parts.next()??, parts.next()??);
        if parts.next().is_some() {
            return None;
        }
        Some(color)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = if let Some(hex) = trimmed.strip_prefix('#') {
            Self::parse_hex(hex)
        } else if let Some(args) = trimmed
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Self::parse_rgb_fn(args)
        } else {
            None
        };
        parsed.ok_or_else(|| CanvasError::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = CanvasError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Swatch colors offered by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    swatches: Vec<Color>,
}

impl Palette {
    /// Create a palette from an explicit swatch list.
    #[must_use]
    pub fn new(swatches: Vec<Color>) -> Self {
        Self { swatches }
    }

    /// All swatches in display order.
    #[must_use]
    pub fn swatches(&self) -> &[Color] {
        &self.swatches
    }

    /// Swatch at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Color> {
        self.swatches.get(index).copied()
    }

    /// Number of swatches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.swatches.len()
    }

    /// Whether the palette has no swatches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.swatches.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(vec![
            Color::rgb(0x00, 0x00, 0x00),
            Color::rgb(0xff, 0xff, 0xff),
            Color::rgb(0xee, 0x33, 0x33),
            Color::rgb(0xe6, 0x49, 0x80),
            Color::rgb(0xbe, 0x4b, 0xdb),
            Color::rgb(0x89, 0x32, 0x00),
            Color::rgb(0x22, 0x8b, 0xe6),
            Color::rgb(0x33, 0x33, 0xee),
            Color::rgb(0x40, 0xc0, 0x57),
            Color::rgb(0x00, 0xaa, 0x00),
            Color::rgb(0xfa, 0xb0, 0x05),
            Color::rgb(0xfd, 0x7e, 0x14),
        ])
    }
}
