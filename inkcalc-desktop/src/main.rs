//! # InkCalc
//!
//! Replays a recorded drawing interaction, submits it for analysis and prints
//! the result overlay.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use inkcalc_client::AnalysisClient;
use inkcalc_core::{InputEvent, TracingSink};
use inkcalc_desktop::{AppConfig, CliArgs, Session};
use inkcalc_renderer::encode_png;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels.
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,inkcalc_desktop=debug,inkcalc_client=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = AppConfig::from(args);

    tracing::info!(
        "Viewport {}x{} (offset {}), service {}",
        config.viewport.window_width,
        config.viewport.window_height,
        config.viewport.offset_top,
        config.service_url
    );

    let script = std::fs::read_to_string(&config.script)
        .with_context(|| format!("failed to read script {}", config.script.display()))?;
    let events = InputEvent::parse_script(&script).context("invalid input script")?;
    tracing::debug!("Loaded {} input events", events.len());

    let client = AnalysisClient::with_timeout(&config.service_url, config.timeout)?;
    let mut session = Session::mount(
        &config.viewport,
        client,
        Arc::new(TracingSink),
        config.session.clone(),
    )?;
    *session.bindings_mut() = config.variables.clone();

    for event in &events {
        if matches!(event, InputEvent::Submit) {
            tracing::info!(
                "Submit pressed ({})",
                session.submission_state().submit_label()
            );
        }
        if let Some(Err(err)) = session.dispatch(event).await {
            tracing::debug!("Submission did not produce a result: {}", err);
        }
    }

    match session.overlay().current() {
        Some(result) => println!("{result}"),
        None => println!("No result"),
    }

    if let Some(path) = &config.save {
        let png = encode_png(&session.surface().snapshot())?;
        std::fs::write(path, png)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Drawing saved to {}", path.display());
    }

    Ok(())
}
