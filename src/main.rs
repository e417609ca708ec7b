//! clouder-harvest entry point
//!
//! Parses the `(week, year, style)` batch identity, loads configuration,
//! wires up the store and the two upstream clients, and runs the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clouder_harvest::config::{AppConfig, BP_TOKEN_ENV};
use clouder_harvest::credentials::{CredentialProvider, FileCache, StaticToken};
use clouder_harvest::pipeline::run_week;
use clouder_harvest::services::{BeatportClient, SpotifyClient};
use clouder_harvest::store::SqliteStore;
use clouder_harvest::WeekWindow;

/// Command-line arguments for clouder-harvest
#[derive(Parser, Debug)]
#[command(name = "clouder-harvest")]
#[command(about = "Weekly Beatport to Spotify harvest pipeline")]
#[command(version)]
struct Args {
    /// ISO week number to harvest
    #[arg(short, long, env = "CLOUDER_WEEK")]
    week: u32,

    /// Year of the target week
    #[arg(short, long, env = "CLOUDER_YEAR")]
    year: i32,

    /// Style id (1 = dnb, 90 = techno)
    #[arg(short, long, env = "CLOUDER_STYLE")]
    style: u32,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "clouder.toml", env = "CLOUDER_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clouder_harvest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    let window = WeekWindow::new(args.week, args.year, args.style)?;
    info!(
        "Week window: {} ({} to {})",
        window,
        window.week_start(),
        window.week_end()
    );

    let store = SqliteStore::open(&config.database.path)
        .await
        .context("failed to open document store")?;

    let credentials: Arc<dyn CredentialProvider> = match std::env::var(BP_TOKEN_ENV) {
        Ok(token) => Arc::new(StaticToken::new(token)),
        Err(_) => Arc::new(FileCache::new(config.beatport.token_cache.clone())),
    };
    let beatport = BeatportClient::new(&config.beatport, credentials)?;
    let spotify = SpotifyClient::new(&config.spotify)?;

    let summary = run_week(
        &window,
        &beatport,
        &spotify,
        &store,
        config.beatport.chunk_size,
    )
    .await?;

    info!("Week {} summary :: {:?}", window, summary);
    Ok(())
}
