#![allow(missing_docs)]

//! Pagepulse server binary.
//!
//! Loads configuration, wires the Graph client and the Gemini analyzer
//! into shared state, and serves the HTTP API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pagepulse::analyzer::gemini::GeminiModel;
use pagepulse::analyzer::Analyzer;
use pagepulse::config::PulseConfig;
use pagepulse::fb::GraphClient;
use pagepulse::logging;
use pagepulse::server::{router, AppState};

/// Sales-triage backend for Facebook Page conversations.
#[derive(Debug, Parser)]
#[command(name = "pagepulse", version)]
struct Cli {
    /// Path to the config file (default: `$PULSE_CONFIG_PATH` or
    /// `./config.toml`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets may live in a local .env file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Precedence: env vars > config file > defaults.
    let mut config = match cli.config {
        Some(path) => PulseConfig::load_from(path),
        None => PulseConfig::load(),
    }
    .context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let _logging_guard = logging::init(
        &config.server.log_level,
        config.server.logs_dir.as_deref().map(std::path::Path::new),
    )
    .context("failed to initialise logging")?;

    info!(
        page_id = %config.facebook.page_id,
        model = %config.gemini.model,
        "pagepulse starting"
    );
    if config.facebook.access_token.is_none() {
        tracing::warn!("FACEBOOK_ACCESS_TOKEN not set; /fb/ will fail until configured");
    }
    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; /analyze-messages will fail until configured");
    }

    let timeout = Duration::from_secs(config.server.request_timeout_seconds);

    let source = GraphClient::new(&config.facebook, timeout)
        .context("failed to build Graph API client")?;
    let model = GeminiModel::new(&config.gemini, timeout)
        .context("failed to build Gemini client")?;

    let state = Arc::new(AppState {
        source: Arc::new(source),
        analyzer: Analyzer::new(Arc::new(model)),
        triage: config.triage.clone(),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router(state))
        .await
        .context("server error")?;

    Ok(())
}
