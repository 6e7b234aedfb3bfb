mod action;
mod app;
mod app_state;
mod auth_server;
mod component;
mod components;
mod log_layer;
mod theme;
mod widgets;

use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spotibot_core::auth::Authenticator;
use spotibot_core::openai::OpenAiResponses;
use spotibot_core::platform;
use spotibot_core::spotify::SpotifyWeb;
use spotibot_core::{Config, Session};

use crate::log_layer::UiLogLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut log_path = platform::log_path();
    let log_file = match open_log(&log_path) {
        Ok(file) => file,
        Err(_) => {
            log_path = platform::fallback_log_path();
            open_log(&log_path)?
        }
    };

    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    let (log_tx, log_rx) = mpsc::unbounded_channel();
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_filter))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false),
        )
        .with(UiLogLayer::new(log_tx))
        .init();

    eprintln!("spotibot log: {}", log_path.display());
    tracing::info!("spotibot starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config unreadable, using defaults: {:#}", e);
        let mut config = Config::default();
        config.apply_env();
        config
    });
    let missing = config.missing_settings();
    if !missing.is_empty() {
        anyhow::bail!(
            "missing settings: {} (edit {} or set OPENAI_API_KEY / SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET)",
            missing.join(", "),
            Config::config_path().display()
        );
    }

    // ── Providers and session ────────────────────────────────────────────────
    let auth = Arc::new(Authenticator::new(
        config.spotify.clone(),
        config.paths.token_cache.clone(),
    ));
    auth.restore_cached().await;
    let spotify = Arc::new(SpotifyWeb::new(auth.client()));
    let model = Arc::new(OpenAiResponses::new(&config.openai)?);
    let session = Session::new(model, spotify, config.retry.policy());

    // ── Login callback server ────────────────────────────────────────────────
    let (login_tx, login_rx) = mpsc::channel::<bool>(8);
    auth_server::start_server(auth.clone(), login_tx)
        .await
        .with_context(|| format!("starting login callback on {}", auth.redirect_uri()))?;

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(session, auth, log_path.display().to_string());
    app.run(log_rx, login_rx).await?;

    Ok(())
}

fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}
