//! Playlist population stage
//!
//! Creates the week's category playlists (skipping categories that already
//! have a record, so a partially failed prior run is completed rather than
//! duplicated) and fills them from the cross-matched tracks using disjoint
//! filters over genre and release date.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::services::spotify::SpotifyApi;
use crate::store::{DocumentStore, Filter, Sort};
use crate::week::WeekWindow;

/// Track counts per base category
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PlaylistStats {
    pub new: u64,
    pub old: u64,
    pub not: u64,
}

/// Create the week's playlists on the streaming service
///
/// Categories that already have a stored record for this week are skipped;
/// missing ones are created, so re-running after a partial failure fills the
/// gaps. A per-playlist creation failure is logged and does not abort the
/// loop. Returns the number of playlists created.
pub async fn create_week_playlists(
    window: &WeekWindow,
    spotify: &dyn SpotifyApi,
    store: &dyn DocumentStore,
) -> Result<usize> {
    info!("Collecting Spotify playlists for {} :: starting", window);

    let clouder_week = window.clouder_week();
    let existing = store
        .find(
            "sp_playlists",
            &Filter::new().eq("clouder_week", clouder_week.clone()),
            Some(&["clouder_pl_name"]),
            None,
        )
        .await?;
    let existing_names: HashSet<&str> = existing
        .iter()
        .filter_map(|doc| doc.get("clouder_pl_name").and_then(Value::as_str))
        .collect();

    let mut created = Vec::new();
    for (group, names) in window.playlist_groups() {
        for name in names {
            if existing_names.contains(name) {
                warn!("{} Spotify playlist '{}' already exists", window, name);
                continue;
            }
            let display_name = window.playlist_display_name(name);
            match spotify.create_playlist(&display_name).await {
                Ok(playlist_id) => created.push(json!({
                    "clouder_week": clouder_week,
                    "playlist_id": playlist_id,
                    "playlist_name": display_name,
                    "clouder_pl_type": group,
                    "clouder_pl_name": name,
                })),
                Err(err) => {
                    error!(
                        "Failed to create Spotify playlist :: {} :: {}",
                        display_name, err
                    );
                }
            }
        }
    }

    store
        .upsert_by_key("sp_playlists", &created, &["playlist_id"])
        .await?;
    info!("{} got Spotify playlists :: {}", window, created.len());
    Ok(created.len())
}

/// Fill one category playlist from the cross-matched tracks
///
/// Fails with [`Error::PlaylistNotFound`] when no playlist record exists for
/// the category. Styles other than the all-genres style exclude
/// zero-popularity tracks and add most-popular-first ordering.
pub async fn populate_category(
    window: &WeekWindow,
    category: &str,
    track_filter: Filter,
    spotify: &dyn SpotifyApi,
    store: &dyn DocumentStore,
) -> Result<usize> {
    info!(
        "Populating Spotify playlist '{}' for {} :: starting",
        category, window
    );

    let playlists = store
        .find(
            "sp_playlists",
            &Filter::new()
                .eq("clouder_week", window.clouder_week())
                .eq("clouder_pl_name", category),
            Some(&["playlist_id"]),
            None,
        )
        .await?;
    let playlist_id = playlists
        .first()
        .and_then(|doc| doc.get("playlist_id").and_then(Value::as_str))
        .ok_or_else(|| Error::PlaylistNotFound(category.to_string()))?
        .to_string();

    let mut filter = track_filter;
    let mut sort = None;
    if window.style_id() != 1 {
        filter = filter.gt("popularity", 0);
        sort = Some(Sort::descending("popularity"));
    }

    let tracks = store
        .find("sp_tracks", &filter, Some(&["uri"]), sort.as_ref())
        .await?;
    if tracks.is_empty() {
        warn!("{} Spotify tracks not found for '{}'", window, category);
        return Ok(0);
    }

    let uris: Vec<String> = tracks
        .iter()
        .filter_map(|doc| doc.get("uri").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    spotify.add_tracks(&playlist_id, &uris).await?;

    info!(
        "{} populated Spotify playlist '{}' :: {}",
        window,
        category,
        uris.len()
    );
    Ok(uris.len())
}

/// Populate the three base categories with disjoint track sets
///
/// `new` and `old` split the style's own tracks at the lookback boundary;
/// `not` takes everything from other genres. A missing playlist aborts the
/// remaining categories.
pub async fn populate_all_categories(
    window: &WeekWindow,
    spotify: &dyn SpotifyApi,
    store: &dyn DocumentStore,
) -> Result<PlaylistStats> {
    let clouder_week = window.clouder_week();
    let window_start = window.sp_window_start().to_string();

    let filter_new = Filter::new()
        .eq("clouder_week", clouder_week.clone())
        .eq("bp_genre_id", window.style_id())
        .gte("album.release_date", window_start.clone());
    let new = populate_category(window, "new", filter_new, spotify, store).await?;

    let filter_old = Filter::new()
        .eq("clouder_week", clouder_week.clone())
        .eq("bp_genre_id", window.style_id())
        .lt("album.release_date", window_start);
    let old = populate_category(window, "old", filter_old, spotify, store).await?;

    let filter_not = Filter::new()
        .eq("clouder_week", clouder_week)
        .ne("bp_genre_id", window.style_id());
    let not = populate_category(window, "not", filter_not, spotify, store).await?;

    Ok(PlaylistStats {
        new: new as u64,
        old: old as u64,
        not: not as u64,
    })
}
