//! Beatport catalog API client
//!
//! Paged JSON resource behind a bearer token. Responses follow the
//! `{results, next, page, count}` shape; `next` is a full cursor URL. A 401
//! triggers one credential refresh through the injected provider, after which
//! the request is resent once. Any other failure marks the page failed and
//! leaves retry decisions to the paginator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::collector::{Page, PageError, PageFetcher, PageRequest};
use crate::config::BeatportConfig;
use crate::credentials::CredentialProvider;
use crate::error::Result;
use crate::store::Document;
use crate::week::WeekWindow;

/// Kind of catalog item a window query collects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Releases,
    Tracks,
}

impl ItemKind {
    /// Upstream resource segment
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Releases => "releases",
            ItemKind::Tracks => "tracks",
        }
    }

    /// Target collection for persisted items
    pub fn collection(self) -> &'static str {
        match self {
            ItemKind::Releases => "bp_releases",
            ItemKind::Tracks => "bp_tracks",
        }
    }
}

/// Catalog access as the pipeline sees it: page fetching plus the two query
/// builders the stages need
pub trait CatalogApi: PageFetcher {
    /// First page of the genre + date-window bulk query
    fn window_request(&self, window: &WeekWindow, kind: ItemKind) -> PageRequest;

    /// First page of one release's track listing
    fn release_tracks_request(&self, release_id: &str) -> PageRequest;
}

/// HTTP client for the Beatport catalog API
pub struct BeatportClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    token: RwLock<String>,
    page_size: u32,
}

impl BeatportClient {
    pub fn new(
        config: &BeatportConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let token = credentials.token(false)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
            token: RwLock::new(token),
            page_size: config.page_size,
        })
    }

    async fn send(
        &self,
        url: &str,
        params: &[(String, String)],
        token: &str,
    ) -> reqwest::Result<reqwest::Response> {
        self.http
            .get(url)
            .query(params)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
    }
}

/// Wire shape of one catalog page
#[derive(Debug, Deserialize)]
struct BeatportPage {
    results: Vec<Document>,
    next: Option<String>,
    #[serde(default)]
    page: u64,
    #[serde(default)]
    count: u64,
}

#[async_trait]
impl PageFetcher for BeatportClient {
    async fn fetch_page(&self, request: &PageRequest) -> std::result::Result<Page, PageError> {
        let mut url = request.url.clone();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            url = format!("https://{url}");
        }
        debug!("Requesting {} with {} params", url, request.params.len());

        let token = self.token.read().await.clone();
        let mut response = self
            .send(&url, &request.params, &token)
            .await
            .map_err(|e| PageError(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Catalog API returned 401, refreshing credential");
            let fresh = self
                .credentials
                .token(true)
                .map_err(|e| PageError(format!("credential refresh failed: {e}")))?;
            *self.token.write().await = fresh.clone();
            response = self
                .send(&url, &request.params, &fresh)
                .await
                .map_err(|e| PageError(e.to_string()))?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(PageError(format!("HTTP {status} from {url}")));
        }

        let body: BeatportPage = response
            .json()
            .await
            .map_err(|e| PageError(format!("malformed page body: {e}")))?;

        info!(
            "Got {} results on page {} of {}",
            body.results.len(),
            body.page,
            body.count
        );

        Ok(Page {
            results: body.results,
            next: body.next.map(PageRequest::cursor),
            page: body.page,
            count: body.count,
        })
    }
}

impl CatalogApi for BeatportClient {
    fn window_request(&self, window: &WeekWindow, kind: ItemKind) -> PageRequest {
        PageRequest::new(
            format!("{}/{}/", self.base_url, kind.as_str()),
            vec![
                ("genre_id".into(), window.style_id().to_string()),
                (
                    "publish_date".into(),
                    format!("{}:{}", window.week_start(), window.week_end()),
                ),
                ("page".into(), "1".into()),
                ("per_page".into(), self.page_size.to_string()),
                ("order_by".into(), "-publish_date".into()),
            ],
        )
    }

    fn release_tracks_request(&self, release_id: &str) -> PageRequest {
        PageRequest::new(
            format!("{}/releases/{}/tracks/", self.base_url, release_id),
            vec![
                ("page".into(), "1".into()),
                ("per_page".into(), self.page_size.to_string()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticToken;

    fn client() -> BeatportClient {
        let config = BeatportConfig {
            api_url: "https://api.beatport.com/v4/catalog/".to_string(),
            page_size: 100,
            chunk_size: 100,
            token_cache: ".bp_cache".into(),
        };
        BeatportClient::new(&config, Arc::new(StaticToken::new("t"))).unwrap()
    }

    #[test]
    fn window_request_carries_genre_and_date_range() {
        let window = WeekWindow::new(7, 2025, 1).unwrap();
        let request = client().window_request(&window, ItemKind::Tracks);

        assert_eq!(request.url, "https://api.beatport.com/v4/catalog/tracks/");
        let params: std::collections::HashMap<_, _> =
            request.params.iter().cloned().collect();
        assert_eq!(params["genre_id"], "1");
        assert_eq!(params["publish_date"], "2025-02-17:2025-02-23");
        assert_eq!(params["per_page"], "100");
        assert_eq!(params["order_by"], "-publish_date");
    }

    #[test]
    fn release_tracks_request_targets_one_release() {
        let request = client().release_tracks_request("4711");
        assert_eq!(
            request.url,
            "https://api.beatport.com/v4/catalog/releases/4711/tracks/"
        );
    }

    #[test]
    fn item_kind_collections() {
        assert_eq!(ItemKind::Releases.collection(), "bp_releases");
        assert_eq!(ItemKind::Tracks.collection(), "bp_tracks");
    }
}
