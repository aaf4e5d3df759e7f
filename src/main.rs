#![deny(clippy::all)]

mod capture;
mod cli;
mod config;
mod error;
mod event_loop;
mod gateway;
mod hotkeys;
mod ocr;
mod presentation;
mod process;
mod session;
mod settings;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// Re-export error types (used by other modules)
#[allow(unused_imports)]
pub use error::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up GOOGLE_CLOUD_API_KEY / PAUSESCAN_DEV from a local .env
    dotenvy::dotenv().ok();

    let cli = cli::Cli::parse();

    // Load configuration from embedded config.toml
    let config = config::load_config()?;

    // Initialize tracing for structured logging; RUST_LOG wins over config
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = settings::SettingsStore::open_default()?;

    match cli.command() {
        cli::Command::Run { dev } => run(config, settings, dev).await,
        cli::Command::SetApiKey { key } => {
            settings.set_google_cloud_api_key(Some(&key))?;
            println!("API key saved to {}", settings.path().display());
            Ok(())
        }
        cli::Command::ClearApiKey => {
            settings.set_google_cloud_api_key(None)?;
            println!("API key removed from {}", settings.path().display());
            Ok(())
        }
        cli::Command::ShowSettings => show_settings(&settings),
    }
}

fn show_settings(store: &settings::SettingsStore) -> anyhow::Result<()> {
    let mut current = store.load();
    current.google_cloud_api_key = current
        .google_cloud_api_key
        .as_deref()
        .map(settings::mask_secret);

    println!("# {}", store.path().display());
    println!("{}", serde_json::to_string_pretty(&current)?);
    Ok(())
}

async fn run(
    mut config: config::Config,
    settings: settings::SettingsStore,
    dev_flag: bool,
) -> anyhow::Result<()> {
    config.apply_overrides(&settings, dev_flag);

    let gateways = gateway::Gateways::select(&config.dev);

    let cache = if config.dev.enabled && config.dev.ocr_cache {
        ocr::OcrCache::open_default()
    } else {
        None
    };
    if settings.google_cloud_api_key().is_none() {
        warn!("No Google Cloud API key found - run `pausescan set-api-key <KEY>` before capturing");
    }
    let recognizer = Arc::new(
        ocr::OcrPipeline::new(&config.ocr, settings, cache)
            .context("Failed to create OCR pipeline")?,
    );

    let frames = capture::FrameStore::open_default()?;
    let overlay = Arc::new(presentation::DesktopOverlay);

    let mut controller = session::SessionController::new(
        gateways,
        recognizer,
        frames,
        overlay,
        config.controller.step_timeout(),
    );

    let label = hotkeys::hotkey_label(&config.hotkey.accelerator);
    presentation::spawn_progress_renderer(controller.subscribe(), label.clone());

    // Initialize the global hotkey
    let (hotkey_manager, hotkey_id) = hotkeys::init_hotkey(&config.hotkey.accelerator)?;
    let (press_tx, press_rx) = mpsc::unbounded_channel();
    hotkeys::start_hotkey_listener(hotkey_id, press_tx);

    // Stops on Ctrl+C / SIGTERM and resumes anything still paused
    let controller_task = tokio::spawn(async move {
        controller
            .run(press_rx, event_loop::shutdown_signal())
            .await;
    });

    // Keep hotkey manager alive
    std::mem::forget(hotkey_manager);

    info!("Press {} to pause the foreground application", label);

    // Run the application event loop
    event_loop::run(controller_task).await?;
    Ok(())
}
