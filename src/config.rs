//! Configuration for clouder-harvest
//!
//! One TOML file describes the two upstream services and the database
//! location. Secrets may be supplied (or overridden) through environment
//! variables, which take precedence over file-borne values:
//! `CLOUDER_BP_TOKEN` for the catalog API and `CLOUDER_SP_TOKEN` for the
//! streaming API.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const BP_TOKEN_ENV: &str = "CLOUDER_BP_TOKEN";
pub const SP_TOKEN_ENV: &str = "CLOUDER_SP_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub beatport: BeatportConfig,
    pub spotify: SpotifyConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeatportConfig {
    /// Base URL of the catalog API, e.g. `https://api.beatport.com/v4/catalog`
    pub api_url: String,
    /// Items requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Documents per persistence chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Token cache file used when no token is injected via the environment
    #[serde(default = "default_token_cache")]
    pub token_cache: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyConfig {
    /// Base URL of the streaming API
    #[serde(default = "default_spotify_api_url")]
    pub api_url: String,
    /// OAuth bearer token; usually injected via `CLOUDER_SP_TOKEN`
    #[serde(default)]
    pub token: Option<String>,
    /// Owner of the created playlists
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

fn default_page_size() -> u32 {
    100
}

fn default_chunk_size() -> usize {
    crate::store::sink::DEFAULT_CHUNK_SIZE
}

fn default_token_cache() -> PathBuf {
    PathBuf::from(".bp_cache")
}

fn default_spotify_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

impl AppConfig {
    /// Load the TOML file at `path`, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;

        if let Ok(token) = std::env::var(SP_TOKEN_ENV) {
            config.spotify.token = Some(token);
        }

        Ok(config)
    }
}
