//! Stroke capture: pointer-drag state rendered onto a [`DrawingSurface`].

use serde::{Deserialize, Serialize};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Stroke, Transform};

use crate::{Color, DrawingSurface};

/// A pointer position in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Fixed pen geometry applied to every segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Line width in pixels.
    pub width: f32,
    /// Background applied to the surface on first interaction.
    pub canvas_background: Color,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 3.0,
            canvas_background: Color::BLACK,
        }
    }
}

/// One pointer-down-to-pointer-up interaction.
#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    last_point: Point,
}

/// Owns the surface and turns pointer events into ink.
#[derive(Debug, Clone)]
pub struct StrokeCapture {
    surface: DrawingSurface,
    style: StrokeStyle,
    color: Color,
    active: Option<ActiveStroke>,
}

impl StrokeCapture {
    /// Wrap a surface with the default style and white ink.
    #[must_use]
    pub fn new(surface: DrawingSurface) -> Self {
        Self::with_style(surface, StrokeStyle::default())
    }

    /// Wrap a surface with an explicit pen style.
    #[must_use]
    pub fn with_style(surface: DrawingSurface, style: StrokeStyle) -> Self {
        Self {
            surface,
            style,
            color: Color::default(),
            active: None,
        }
    }

    /// The underlying surface.
    #[must_use]
    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    /// Currently selected ink color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Select the ink for subsequent segments.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Whether a stroke is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Start a new stroke at `point`.
    pub fn begin(&mut self, point: Point) {
        self.surface.set_background(self.style.canvas_background);
        self.active = Some(ActiveStroke { last_point: point });
        tracing::trace!("Stroke begin at ({}, {})", point.x, point.y);
    }

    /// Draw from the last recorded point to `point`.
    ///
    /// Does nothing unless a stroke is in progress.
    pub fn extend(&mut self, point: Point) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let from = active.last_point;
        active.last_point = point;
        draw_segment(&mut self.surface, from, point, self.color, &self.style);
    }

    /// Finish the current stroke, if any.
    pub fn end(&mut self) {
        if self.active.take().is_some() {
            tracing::trace!("Stroke end");
        }
    }

    /// Erase all ink and abandon any stroke in progress.
    pub fn clear(&mut self) {
        self.active = None;
        self.surface.clear();
    }
}

fn draw_segment(
    surface: &mut DrawingSurface,
    from: Point,
    to: Point,
    color: Color,
    style: &StrokeStyle,
) {
    let mut builder = PathBuilder::new();
    builder.move_to(from.x, from.y);
    builder.line_to(to.x, to.y);
    let Some(path) = builder.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: style.width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    surface
        .pixmap_mut()
        .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    tracing::trace!(
        "Segment ({}, {}) -> ({}, {}) in {}",
        from.x,
        from.y,
        to.x,
        to.y,
        color
    );
}
