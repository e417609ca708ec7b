//! Spotify web API client
//!
//! The pipeline depends on three operations: search-by-ISRC, playlist
//! creation and chunked playlist fill. They live behind the [`SpotifyApi`]
//! trait so the stages can be exercised against a fake. OAuth token
//! acquisition is not handled here; the client is handed a ready bearer
//! token.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::config::SpotifyConfig;
use crate::error::{Error, Result};
use crate::store::Document;

/// Tracks added to a playlist per API call
pub const PLAYLIST_ADD_CHUNK: usize = 100;

/// Streaming-service operations the pipeline needs
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// First exact search hit for an ISRC, if any
    async fn track_by_isrc(&self, isrc: &str) -> Result<Option<Document>>;

    /// Create a private playlist, returning its id
    async fn create_playlist(&self, name: &str) -> Result<String>;

    /// Append track URIs to a playlist, chunked per API limits
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
}

/// HTTP implementation over the Spotify web API
pub struct SpotifyClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    user_id: String,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Result<Self> {
        let token = config.token.clone().ok_or_else(|| {
            Error::Config(format!(
                "Spotify token not configured; set {} or spotify.token",
                crate::config::SP_TOKEN_ENV
            ))
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            user_id: config.user_id.clone(),
        })
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn track_by_isrc(&self, isrc: &str) -> Result<Option<Document>> {
        let response = self
            .http
            .get(format!("{}/search", self.api_url))
            .query(&[
                ("q", format!("isrc:{isrc}")),
                ("type", "track".to_string()),
                ("limit", "1".to_string()),
            ])
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;

        let body: Document = response.json().await?;
        let hit = body
            .pointer("/tracks/items/0")
            .cloned();
        debug!(isrc, found = hit.is_some(), "ISRC search done");
        Ok(hit)
    }

    async fn create_playlist(&self, name: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/users/{}/playlists", self.api_url, self.user_id))
            .bearer_auth(&self.token)
            .json(&json!({ "name": name, "public": false }))
            .send()
            .await?
            .error_for_status()?;

        let body: Document = response.json().await?;
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                Error::UnexpectedResponse("playlist creation response without id".into())
            })?
            .to_string();

        info!("Playlist created : {} : {}", id, name);
        Ok(id)
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        info!(
            "Tracks added to playlist : {} : {} :: start",
            playlist_id,
            uris.len()
        );
        for chunk in uris.chunks(PLAYLIST_ADD_CHUNK) {
            self.http
                .post(format!("{}/playlists/{}/tracks", self.api_url, playlist_id))
                .bearer_auth(&self.token)
                .json(&json!({ "uris": chunk }))
                .send()
                .await?
                .error_for_status()?;
            debug!("Tracks added to playlist : {} : {}", playlist_id, chunk.len());
        }
        info!(
            "Tracks added to playlist : {} : {} :: done",
            playlist_id,
            uris.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_a_config_error() {
        let config = SpotifyConfig {
            api_url: "https://api.spotify.com/v1".into(),
            token: None,
            user_id: "someone".into(),
        };
        assert!(matches!(
            SpotifyClient::new(&config),
            Err(Error::Config(_))
        ));
    }
}
