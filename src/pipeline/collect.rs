//! Catalog collection stage
//!
//! Streams one week's genre-filtered catalog items through the bulk paginator
//! into a chunked upsert keyed by `(id, clouder_week)`. A page failure
//! truncates the stream (the collector logs it); a persistence failure aborts
//! the stage.

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::collector::{Paginator, RetryPolicy};
use crate::error::Result;
use crate::services::beatport::{CatalogApi, ItemKind};
use crate::store::{Document, DocumentStore, UpsertSink};
use crate::week::WeekWindow;

/// Summary counters for one collection run
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CollectStats {
    pub full_cnt: u64,
    pub inserted: u64,
    pub updated: u64,
}

/// Collect and persist all `kind` items published inside the window
pub async fn collect_catalog_items(
    window: &WeekWindow,
    kind: ItemKind,
    catalog: &dyn CatalogApi,
    store: &dyn DocumentStore,
    chunk_size: usize,
) -> Result<CollectStats> {
    info!("Collecting {} for {} :: starting", kind.as_str(), window);

    let mut paginator = Paginator::new(
        catalog,
        catalog.window_request(window, kind),
        RetryPolicy::none(),
    );
    let mut sink = UpsertSink::new(
        store,
        kind.collection(),
        &["id", "clouder_week"],
        chunk_size,
    );

    let clouder_week = window.clouder_week();
    while let Some(batch) = paginator.next_batch().await {
        for mut item in batch {
            if let Some(fields) = item.as_object_mut() {
                fields.insert("clouder_week".to_string(), json!(clouder_week));
            }
            sink.push(item).await?;
        }
    }

    let flushed = sink.finish().await?;
    let stats = CollectStats {
        full_cnt: flushed.full_cnt,
        inserted: flushed.inserted,
        updated: flushed.updated,
    };
    info!("{} saved {} :: {:?}", window, kind.as_str(), stats);
    Ok(stats)
}

/// Fetch the full track listing of one release, retrying failed pages
pub async fn collect_release_tracks(
    release_id: &str,
    catalog: &dyn CatalogApi,
) -> Vec<Document> {
    info!("Collecting tracks for release {} :: starting", release_id);
    let tracks = Paginator::new(
        catalog,
        catalog.release_tracks_request(release_id),
        RetryPolicy::per_entity(),
    )
    .collect_all()
    .await;
    info!(
        "Collecting tracks for release {} :: done ({} tracks)",
        release_id,
        tracks.len()
    );
    tracks
}
