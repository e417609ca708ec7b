//! Week harvest pipeline
//!
//! The orchestrator runs the stages in order for one [`WeekWindow`]:
//! catalog collection (releases, then tracks), ISRC cross-match, playlist
//! creation and population. Every stage writes upsert-by-key, so a re-run of
//! the same week updates rather than duplicates. Stage statistics are
//! recorded explicitly after each stage; a stage error propagates and
//! terminates the run.

pub mod collect;
pub mod crossmatch;
pub mod playlists;
pub mod stats;

pub use collect::{collect_catalog_items, collect_release_tracks, CollectStats};
pub use crossmatch::{cross_match_tracks, CrossMatchStats};
pub use playlists::{
    create_week_playlists, populate_all_categories, populate_category, PlaylistStats,
};
pub use stats::record_stage;

use tracing::info;

use crate::error::Result;
use crate::services::beatport::{CatalogApi, ItemKind};
use crate::services::spotify::SpotifyApi;
use crate::store::DocumentStore;
use crate::week::WeekWindow;

/// Combined result of one pipeline run
#[derive(Debug, Clone, Copy)]
pub struct WeekSummary {
    pub releases: CollectStats,
    pub tracks: CollectStats,
    pub cross_match: CrossMatchStats,
    pub playlists_created: usize,
    pub playlists: PlaylistStats,
}

/// Run the whole harvest for one week window
pub async fn run_week(
    window: &WeekWindow,
    catalog: &dyn CatalogApi,
    spotify: &dyn SpotifyApi,
    store: &dyn DocumentStore,
    chunk_size: usize,
) -> Result<WeekSummary> {
    info!("Processing week {} :: starting", window);
    let week_id = window.clouder_week();

    store
        .upsert_by_key("clouder_weeks", &[window.to_document()], &["week"])
        .await?;

    let releases =
        collect_catalog_items(window, ItemKind::Releases, catalog, store, chunk_size).await?;
    record_stage(store, &week_id, "beatport_releases", &releases).await;

    let tracks =
        collect_catalog_items(window, ItemKind::Tracks, catalog, store, chunk_size).await?;
    record_stage(store, &week_id, "beatport_tracks", &tracks).await;

    let cross_match = cross_match_tracks(window, spotify, store).await?;
    record_stage(store, &week_id, "spotify", &cross_match).await;

    let playlists_created = create_week_playlists(window, spotify, store).await?;

    let playlists = populate_all_categories(window, spotify, store).await?;
    record_stage(store, &week_id, "sp_playlist", &playlists).await;

    info!("Processing week {} :: done", window);
    Ok(WeekSummary {
        releases,
        tracks,
        cross_match,
        playlists_created,
        playlists,
    })
}
