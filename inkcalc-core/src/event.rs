//! Input events bound to the drawing page.

use serde::{Deserialize, Serialize};

use crate::{CanvasResult, Color, Point};

/// All interactions the presentation layer forwards to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InputEvent {
    /// Mouse button pressed over the surface.
    PointerDown {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },

    /// Pointer moved over the surface.
    PointerMove {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },

    /// Mouse button released.
    PointerUp,

    /// Pointer left the surface.
    PointerLeave,

    /// Ink color picked directly.
    SelectColor {
        /// The new ink color.
        color: Color,
    },

    /// Ink color picked from the palette by position.
    SelectSwatch {
        /// Swatch index.
        index: usize,
    },

    /// Reset button pressed.
    Reset,

    /// Calculate button pressed.
    Submit,

    /// Overlay close button pressed.
    Dismiss,
}

impl InputEvent {
    /// Pointer position carried by the event, if any.
    #[must_use]
    pub fn point(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y } | Self::PointerMove { x, y } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }

    /// Parse a recorded event script (a JSON array of events).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn parse_script(json: &str) -> CanvasResult<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}
