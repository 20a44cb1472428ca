//! The raster drawing surface and its emptiness check.

use std::fmt;

use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

use crate::{CanvasError, CanvasResult, Color};

/// Window geometry the surface is bound to at mount time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Vertical offset of the surface from the top of the window.
    pub offset_top: u32,
}

impl Viewport {
    /// Create a viewport description.
    #[must_use]
    pub fn new(window_width: u32, window_height: u32, offset_top: u32) -> Self {
        Self {
            window_width,
            window_height,
            offset_top,
        }
    }

    /// Surface size: full window width, height below the offset.
    #[must_use]
    pub fn surface_size(&self) -> (u32, u32) {
        (
            self.window_width,
            self.window_height.saturating_sub(self.offset_top),
        )
    }
}

/// Returns true iff every RGB channel in an RGBA buffer is zero.
///
/// Alpha is ignored. A trailing partial pixel is ignored as well.
#[must_use]
pub fn is_blank(rgba: &[u8]) -> bool {
    rgba.chunks_exact(4).all(|px| px[..3].iter().all(|&c| c == 0))
}

/// A 2D raster buffer owned by the drawing session.
///
/// Pixels are stored as premultiplied RGBA, so transparent pixels always
/// read as zero in every channel.
#[derive(Clone)]
pub struct DrawingSurface {
    pixmap: Pixmap,
    /// Presentation background, set on first interaction. Not part of the pixels.
    background: Option<Color>,
    /// Advances on every clear.
    epoch: u64,
}

impl DrawingSurface {
    /// Create a transparent surface of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] if either side is zero.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        let pixmap =
            Pixmap::new(width, height).ok_or(CanvasError::InvalidDimensions { width, height })?;
        tracing::debug!("Drawing surface created: {}x{}", width, height);
        Ok(Self {
            pixmap,
            background: None,
            epoch: 0,
        })
    }

    /// Create a surface sized from the viewport.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] if the resulting area is zero.
    pub fn for_viewport(viewport: &Viewport) -> CanvasResult<Self> {
        let (width, height) = viewport.surface_size();
        Self::new(width, height)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Background color shown behind the ink, once drawing has started.
    #[must_use]
    pub fn background(&self) -> Option<Color> {
        self.background
    }

    pub(crate) fn set_background(&mut self, color: Color) {
        if self.background.is_none() {
            tracing::debug!("Surface background set to {}", color);
        }
        self.background = Some(color);
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Raw premultiplied RGBA bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Premultiplied RGBA value of a single pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap
            .pixel(x, y)
            .map(|p| [p.red(), p.green(), p.blue(), p.alpha()])
    }

    /// Erase every pixel.
    ///
    /// Advances the clear epoch, which tells holders of an analysis result
    /// taken against earlier pixels that it no longer applies.
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        self.epoch += 1;
        tracing::debug!("Surface cleared (epoch {})", self.epoch);
    }

    /// Number of clears performed so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the surface holds no ink.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        is_blank(self.pixmap.data())
    }

    /// Copy the current pixels for packaging.
    #[must_use]
    pub fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            width: self.width(),
            height: self.height(),
            data: self.pixmap.data().to_vec(),
        }
    }
}

impl fmt::Debug for DrawingSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawingSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("background", &self.background)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

/// Immutable copy of the surface pixels taken at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl SurfaceSnapshot {
    /// Build a snapshot from raw premultiplied RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] if the buffer length does not
    /// match `width * height * 4` or the area is zero.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> CanvasResult<Self> {
        let expected = u64::from(width) * u64::from(height) * 4;
        if expected == 0 || data.len() as u64 != expected {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the snapshot holds no ink.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        is_blank(&self.data)
    }
}
