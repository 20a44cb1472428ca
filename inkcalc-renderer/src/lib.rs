//! # InkCalc Renderer
//!
//! Turns drawing-surface snapshots into encoded images.
//!
//! ```text
//! SurfaceSnapshot ──flatten over black──► RGB ──► JPEG (upload payload)
//!                                               └► PNG  (save to disk)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod packager;

pub use error::{PackageError, PackageResult};
pub use packager::{encode_png, ImagePackager, PackagerConfig, Payload};
