//! # InkCalc Core
//!
//! Drawing-capture logic for hand-written math submissions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                inkcalc-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Stroke Capture   │  Drawing Surface        │
//! │  - Pointer state  │  - Raster buffer        │
//! │  - Color select   │  - Emptiness check      │
//! │  - Line segments  │  - Snapshots            │
//! ├─────────────────────────────────────────────┤
//! │  Result Overlay   │  Variable Bindings      │
//! │  - Show/dismiss   │  - Assigned results     │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bindings;
pub mod color;
pub mod error;
pub mod event;
pub mod notify;
pub mod overlay;
pub mod state;
pub mod stroke;
pub mod surface;

pub use bindings::{BindingValue, VariableBindings};
pub use color::{Color, Palette};
pub use error::{CanvasError, CanvasResult};
pub use event::InputEvent;
pub use notify::{MemorySink, Notification, NotificationLevel, NotificationSink, TracingSink};
pub use overlay::{AnalysisResult, ResultOverlay};
pub use state::SubmissionState;
pub use stroke::{Point, StrokeCapture, StrokeStyle};
pub use surface::{is_blank, DrawingSurface, SurfaceSnapshot, Viewport};

/// Core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
