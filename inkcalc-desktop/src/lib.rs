//! # InkCalc Desktop
//!
//! Session host for InkCalc: binds pointer input to stroke capture, submits
//! drawings to the analysis service and keeps the result overlay.
//!
//! ## Usage
//!
//! Replay a recorded interaction against a local service:
//!
//! ```bash
//! cargo run -p inkcalc-desktop -- --script strokes.json --save drawing.png
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `AppConfig` - Viewport, service endpoint and session settings
//! - `Session` - Owns surface, bindings and overlay; drives submissions

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod session;

pub use session::{
    Completion, PendingSubmission, Session, SessionConfig, SubmissionOutcome, SubmitError,
    EMPTY_CANVAS_MESSAGE, ENCODING_FAILED_MESSAGE, SUCCESS_MESSAGE,
};

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use inkcalc_core::{BindingValue, VariableBindings, Viewport};

/// Command-line arguments for the `inkcalc` host.
#[derive(Debug, Clone, Parser)]
#[command(name = "inkcalc")]
#[command(about = "Capture a hand-drawn expression and have it analyzed")]
#[command(version)]
pub struct CliArgs {
    /// JSON file with the recorded input events to replay
    #[arg(long)]
    pub script: PathBuf,

    /// Analysis service URL (host, or full analyze endpoint)
    #[arg(long, env = "INKCALC_SERVICE_URL", default_value = "http://localhost:3000")]
    pub service_url: String,

    /// Window width in pixels
    #[arg(long, env = "INKCALC_WIDTH", default_value = "1280")]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, env = "INKCALC_HEIGHT", default_value = "720")]
    pub height: u32,

    /// Vertical offset of the canvas below the toolbar
    #[arg(long, env = "INKCALC_OFFSET_TOP", default_value = "0")]
    pub offset_top: u32,

    /// Request timeout in seconds
    #[arg(long, default_value = "60")]
    pub timeout_secs: u64,

    /// Initial variable binding, e.g. `--var x=2` (repeatable)
    #[arg(long = "var", value_parser = parse_binding)]
    pub vars: Vec<(String, BindingValue)>,

    /// Keep results flagged as assignments out of the bindings
    #[arg(long)]
    pub no_merge_assigned: bool,

    /// Write the final drawing to this PNG file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

/// Parse a `NAME=VALUE` binding.
///
/// # Errors
///
/// Returns a message if there is no `=` or the name is empty.
pub fn parse_binding(raw: &str) -> Result<(String, BindingValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty variable name in {raw:?}"));
    }
    Ok((name.to_string(), BindingValue::parse_lossy(value.trim())))
}

/// Host configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Window geometry the surface is bound to.
    pub viewport: Viewport,
    /// Analysis service URL.
    pub service_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Input script to replay.
    pub script: PathBuf,
    /// Where to save the drawing, if anywhere.
    pub save: Option<PathBuf>,
    /// Bindings in effect before the first submission.
    pub variables: VariableBindings,
    /// Session behavior.
    pub session: SessionConfig,
}

impl From<CliArgs> for AppConfig {
    fn from(args: CliArgs) -> Self {
        let mut variables = VariableBindings::new();
        for (name, value) in args.vars {
            variables.insert(name, value);
        }

        Self {
            viewport: Viewport::new(args.width, args.height, args.offset_top),
            service_url: args.service_url,
            timeout: Duration::from_secs(args.timeout_secs),
            script: args.script,
            save: args.save,
            variables,
            session: SessionConfig {
                merge_assigned: !args.no_merge_assigned,
                ..SessionConfig::default()
            },
        }
    }
}
