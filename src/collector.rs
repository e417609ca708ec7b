//! Paginated collection protocol
//!
//! Generic cursor-following collection against any paged upstream resource.
//! A [`Paginator`] pulls one page per [`Paginator::next_batch`] call and
//! follows the upstream `next` cursor until it runs out. Page failures never
//! raise: the configured [`RetryPolicy`] is applied per page and, once
//! attempts are exhausted, the sequence truncates with an error log. The bulk
//! window path runs without retries; the per-release path retries three times
//! with a fixed one second delay.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::store::Document;

/// One upstream page request: either the initial query or a `next` cursor
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl PageRequest {
    pub fn new(url: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            params,
        }
    }

    /// Cursor URLs carry their own query string, no extra params
    pub fn cursor(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
        }
    }
}

/// One successfully fetched page
#[derive(Debug)]
pub struct Page {
    pub results: Vec<Document>,
    pub next: Option<PageRequest>,
    pub page: u64,
    pub count: u64,
}

/// A failed page attempt; non-fatal, the paginator decides whether to retry
#[derive(Debug, Error)]
#[error("Page request failed: {0}")]
pub struct PageError(pub String);

/// Fetches a single page from a paged upstream resource
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, PageError>;
}

/// Per-page retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Bulk window collection: a failed page truncates immediately
    pub fn none() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Per-entity collection: 3 attempts, fixed 1 second between them
    pub fn per_entity() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Pull-based page cursor over a [`PageFetcher`]
pub struct Paginator<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    next: Option<PageRequest>,
    policy: RetryPolicy,
}

impl<'a, F: PageFetcher + ?Sized> Paginator<'a, F> {
    pub fn new(fetcher: &'a F, first: PageRequest, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            next: Some(first),
            policy,
        }
    }

    /// Fetch the next page and advance the cursor
    ///
    /// Returns `None` when the upstream cursor is exhausted, or when a page
    /// keeps failing after the policy's attempts. Truncation is logged, never
    /// raised, so callers always see a (possibly short) item sequence.
    pub async fn next_batch(&mut self) -> Option<Vec<Document>> {
        let request = self.next.take()?;

        for attempt in 1..=self.policy.attempts {
            match self.fetcher.fetch_page(&request).await {
                Ok(page) => {
                    debug!(
                        "Got {} results on page {} of {}",
                        page.results.len(),
                        page.page,
                        page.count
                    );
                    self.next = page.next;
                    return Some(page.results);
                }
                Err(err) => {
                    warn!(
                        "Page attempt {}/{} failed for {} :: {}",
                        attempt, self.policy.attempts, request.url, err
                    );
                    if attempt < self.policy.attempts {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        error!(
            "Giving up on {} after {} attempts, truncating sequence",
            request.url, self.policy.attempts
        );
        None
    }

    /// Drain the remaining pages into one vector
    pub async fn collect_all(mut self) -> Vec<Document> {
        let mut items = Vec::new();
        while let Some(batch) = self.next_batch().await {
            items.extend(batch);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Fetcher replaying a scripted sequence of page outcomes
    struct ScriptedFetcher {
        outcomes: Mutex<VecDeque<Result<Page, PageError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(outcomes: Vec<Result<Page, PageError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_page(&self, _request: &PageRequest) -> Result<Page, PageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(PageError("script exhausted".into())))
        }
    }

    fn page(ids: &[u32], next: Option<&str>) -> Page {
        Page {
            results: ids.iter().map(|id| json!({ "id": id })).collect(),
            next: next.map(PageRequest::cursor),
            page: 1,
            count: ids.len() as u64,
        }
    }

    fn first_request() -> PageRequest {
        PageRequest::new("https://api.example.com/tracks/", vec![])
    }

    #[tokio::test]
    async fn stops_when_next_cursor_is_absent() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(&[1, 2], Some("https://api.example.com/tracks/?page=2"))),
            Ok(page(&[3], None)),
        ]);
        let items = Paginator::new(&fetcher, first_request(), RetryPolicy::none())
            .collect_all()
            .await;
        assert_eq!(items.len(), 3);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn bulk_path_truncates_on_first_failure() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(page(&[1, 2], Some("https://api.example.com/tracks/?page=2"))),
            Err(PageError("HTTP 500".into())),
            Ok(page(&[3], None)),
        ]);
        let items = Paginator::new(&fetcher, first_request(), RetryPolicy::none())
            .collect_all()
            .await;
        // failed second page ends the sequence without retrying
        assert_eq!(items.len(), 2);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn per_entity_path_retries_three_times_then_truncates() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(PageError("HTTP 500".into())),
            Err(PageError("HTTP 500".into())),
            Err(PageError("HTTP 500".into())),
        ]);
        let mut paginator =
            Paginator::new(&fetcher, first_request(), RetryPolicy::per_entity());
        assert!(paginator.next_batch().await.is_none());
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn per_entity_path_recovers_before_giving_up() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(PageError("HTTP 500".into())),
            Err(PageError("HTTP 500".into())),
            Ok(page(&[7], None)),
        ]);
        let items = Paginator::new(&fetcher, first_request(), RetryPolicy::per_entity())
            .collect_all()
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn exhausted_cursor_yields_nothing_more() {
        let fetcher = ScriptedFetcher::new(vec![Ok(page(&[1], None))]);
        let mut paginator = Paginator::new(&fetcher, first_request(), RetryPolicy::none());
        assert!(paginator.next_batch().await.is_some());
        assert!(paginator.next_batch().await.is_none());
        assert!(paginator.next_batch().await.is_none());
        assert_eq!(fetcher.calls(), 1);
    }
}
