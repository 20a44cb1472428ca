//! Image packager: snapshot + bindings → upload payload.
//!
//! Pixels are stored premultiplied, so dropping alpha yields the drawing
//! composited over black, which is what the canvas shows.

use image::ImageEncoder;
use inkcalc_core::{SurfaceSnapshot, VariableBindings};

use crate::error::{PackageError, PackageResult};

/// MIME type of the encoded upload image.
pub const JPEG_MIME: &str = "image/jpeg";

/// Configuration for payload encoding.
#[derive(Debug, Clone)]
pub struct PackagerConfig {
    /// JPEG quality 1-100 (default: 80).
    pub jpeg_quality: u8,
    /// File name attached to the image part (default: `drawing.jpg`).
    pub file_name: String,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            file_name: "drawing.jpg".to_string(),
        }
    }
}

/// Everything sent to the analysis service for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Encoded image bytes.
    pub image: Vec<u8>,
    /// File name for the image part.
    pub file_name: String,
    /// MIME type of `image`.
    pub mime: &'static str,
    /// JSON object text of the variable bindings.
    pub variables_json: String,
}

/// Encodes snapshots into [`Payload`]s.
#[derive(Debug, Clone, Default)]
pub struct ImagePackager {
    config: PackagerConfig,
}

impl ImagePackager {
    /// Create a packager with the given configuration.
    #[must_use]
    pub fn new(config: PackagerConfig) -> Self {
        Self { config }
    }

    /// Create a packager with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(PackagerConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    /// Encode a snapshot to JPEG bytes on the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Encoding`] if encoding fails or yields no data.
    pub fn encode_jpeg(&self, snapshot: &SurfaceSnapshot) -> PackageResult<Vec<u8>> {
        encode_jpeg(snapshot, self.config.jpeg_quality)
    }

    /// Build a payload from a snapshot and the bindings at submission time.
    ///
    /// Encoding runs on tokio's blocking pool so the caller's task keeps
    /// yielding. Neither input is modified.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Encoding`] if encoding fails, and
    /// [`PackageError::Bindings`] if the bindings cannot be serialized.
    pub async fn package(
        &self,
        snapshot: SurfaceSnapshot,
        variables: &VariableBindings,
    ) -> PackageResult<Payload> {
        let variables_json = variables.to_json()?;
        let quality = self.config.jpeg_quality;

        let image = tokio::task::spawn_blocking(move || encode_jpeg(&snapshot, quality))
            .await
            .map_err(|e| PackageError::Encoding(format!("encode worker failed: {e}")))??;

        tracing::debug!(
            "Packaged {} byte image with {} variables",
            image.len(),
            variables.len()
        );

        Ok(Payload {
            image,
            file_name: self.config.file_name.clone(),
            mime: JPEG_MIME,
            variables_json,
        })
    }
}

/// Encode a snapshot as an opaque PNG (ink over black).
///
/// # Errors
///
/// Returns [`PackageError::Encoding`] if encoding fails.
pub fn encode_png(snapshot: &SurfaceSnapshot) -> PackageResult<Vec<u8>> {
    let rgb = flatten_rgb(snapshot);
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            &rgb,
            snapshot.width(),
            snapshot.height(),
            image::ColorType::Rgb8.into(),
        )
        .map_err(|e| PackageError::Encoding(format!("PNG encoding failed: {e}")))?;
    Ok(buf)
}

fn encode_jpeg(snapshot: &SurfaceSnapshot, quality: u8) -> PackageResult<Vec<u8>> {
    let rgb = flatten_rgb(snapshot);
    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .write_image(
            &rgb,
            snapshot.width(),
            snapshot.height(),
            image::ColorType::Rgb8.into(),
        )
        .map_err(|e| PackageError::Encoding(format!("JPEG encoding failed: {e}")))?;

    let bytes = buf.into_inner();
    if bytes.is_empty() {
        return Err(PackageError::Encoding("encoder produced no data".into()));
    }
    Ok(bytes)
}

fn flatten_rgb(snapshot: &SurfaceSnapshot) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(snapshot.data().len() / 4 * 3);
    for pixel in snapshot.data().chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }
    rgb
}
