//! Packaging error types.

use inkcalc_core::CanvasError;
use thiserror::Error;

/// Result type for packaging operations.
pub type PackageResult<T> = Result<T, PackageError>;

/// Errors that can occur while turning a surface into an upload payload.
#[derive(Debug, Error)]
pub enum PackageError {
    /// Raster-to-image conversion failed or produced no data.
    #[error("Image encoding failed: {0}")]
    Encoding(String),

    /// Variable bindings could not be serialized.
    #[error("Failed to serialize variables: {0}")]
    Bindings(#[from] CanvasError),
}
