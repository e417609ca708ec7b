//! Shared test doubles for pipeline integration tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use clouder_harvest::collector::{Page, PageError, PageFetcher, PageRequest};
use clouder_harvest::error::{Error, Result};
use clouder_harvest::services::beatport::{CatalogApi, ItemKind};
use clouder_harvest::services::spotify::SpotifyApi;
use clouder_harvest::store::Document;
use clouder_harvest::week::WeekWindow;

/// Catalog fake serving fixed page sequences per item kind
#[derive(Default)]
pub struct MockCatalog {
    /// Pages served for window queries, keyed by resource segment
    pub window_pages: HashMap<&'static str, Vec<Vec<Document>>>,
    /// Pages served for per-release track queries, keyed by release id
    pub release_pages: HashMap<String, Vec<Vec<Document>>>,
}

impl MockCatalog {
    pub fn with_tracks(pages: Vec<Vec<Document>>) -> Self {
        let mut catalog = Self::default();
        catalog.window_pages.insert("tracks", pages);
        catalog
    }

    fn pages_for(&self, route: &str) -> Option<&Vec<Vec<Document>>> {
        match route.strip_prefix("release:") {
            Some(release_id) => self.release_pages.get(release_id),
            None => self.window_pages.get(route),
        }
    }
}

#[async_trait]
impl PageFetcher for MockCatalog {
    async fn fetch_page(&self, request: &PageRequest) -> std::result::Result<Page, PageError> {
        // URLs look like "mock:<route>:<page index>"
        let rest = request
            .url
            .strip_prefix("mock:")
            .ok_or_else(|| PageError(format!("unexpected url {}", request.url)))?;
        let (route, index) = rest
            .rsplit_once(':')
            .ok_or_else(|| PageError(format!("unexpected url {}", request.url)))?;
        let index: usize = index
            .parse()
            .map_err(|_| PageError(format!("unexpected url {}", request.url)))?;

        let pages = self
            .pages_for(route)
            .ok_or_else(|| PageError(format!("no pages for {route}")))?;
        let results = pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < pages.len())
            .then(|| PageRequest::cursor(format!("mock:{}:{}", route, index + 1)));

        Ok(Page {
            results,
            next,
            page: index as u64 + 1,
            count: pages.iter().map(Vec::len).sum::<usize>() as u64,
        })
    }
}

impl CatalogApi for MockCatalog {
    fn window_request(&self, _window: &WeekWindow, kind: ItemKind) -> PageRequest {
        PageRequest::new(format!("mock:{}:0", kind.as_str()), Vec::new())
    }

    fn release_tracks_request(&self, release_id: &str) -> PageRequest {
        PageRequest::new(format!("mock:release:{}:0", release_id), Vec::new())
    }
}

/// Streaming-service fake recording playlist activity
#[derive(Default)]
pub struct MockSpotify {
    /// ISRC to track document
    pub tracks_by_isrc: HashMap<String, Document>,
    /// Creation fails for display names containing this fragment
    pub fail_name_containing: Option<String>,
    /// Prefix for generated playlist ids, to keep separate fakes distinct
    pub id_prefix: Option<String>,
    pub created: Mutex<Vec<(String, String)>>,
    pub added: Mutex<HashMap<String, Vec<String>>>,
    pub next_id: AtomicUsize,
}

impl MockSpotify {
    pub fn with_track(mut self, isrc: &str, track: Document) -> Self {
        self.tracks_by_isrc.insert(isrc.to_string(), track);
        self
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub fn added_uris(&self, playlist_id: &str) -> Vec<String> {
        self.added
            .lock()
            .unwrap()
            .get(playlist_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SpotifyApi for MockSpotify {
    async fn track_by_isrc(&self, isrc: &str) -> Result<Option<Document>> {
        Ok(self.tracks_by_isrc.get(isrc).cloned())
    }

    async fn create_playlist(&self, name: &str) -> Result<String> {
        if let Some(fragment) = &self.fail_name_containing {
            if name.contains(fragment.as_str()) {
                return Err(Error::UnexpectedResponse(format!(
                    "injected creation failure for {name}"
                )));
            }
        }
        let prefix = self.id_prefix.as_deref().unwrap_or("pl");
        let id = format!(
            "{}-{}",
            prefix,
            self.next_id.fetch_add(1, Ordering::SeqCst) + 1
        );
        self.created
            .lock()
            .unwrap()
            .push((id.clone(), name.to_string()));
        Ok(id)
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        self.added
            .lock()
            .unwrap()
            .entry(playlist_id.to_string())
            .or_default()
            .extend(uris.iter().cloned());
        Ok(())
    }
}

/// A matched streaming track as the search endpoint would return it
pub fn sp_track(id: &str, popularity: u64, release_date: &str) -> Document {
    json!({
        "id": id,
        "uri": format!("spotify:track:{id}"),
        "popularity": popularity,
        "available_markets": ["DE", "GB", "US"],
        "album": {
            "id": format!("album-{id}"),
            "release_date": release_date,
            "available_markets": ["DE", "GB", "US"],
        },
    })
}

/// A stored catalog track row for the given week
pub fn bp_track(id: u64, isrc: &str, genre_id: u64, clouder_week: &str) -> Document {
    json!({
        "id": id,
        "isrc": isrc,
        "genre": { "id": genre_id, "name": "whatever" },
        "clouder_week": clouder_week,
    })
}
