//! Cross-match stage
//!
//! Links every stored catalog track of the week to its streaming-service
//! counterpart by ISRC. Exact first hit only, no fuzzy fallback; misses are
//! counted but not persisted. Matched records are stripped of per-market
//! availability lists, tagged with the source id and week, and upserted in
//! one batch keyed by `(id, clouder_week)`.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;
use crate::services::spotify::SpotifyApi;
use crate::store::{DocumentStore, Filter};
use crate::week::WeekWindow;

/// Summary counters for one cross-match run
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CrossMatchStats {
    pub full_cnt: u64,
    pub found: u64,
    pub not_found: u64,
    pub is_genre: u64,
    pub not_genre: u64,
}

/// Cross-match all of this week's catalog tracks against the streaming
/// catalog
pub async fn cross_match_tracks(
    window: &WeekWindow,
    spotify: &dyn SpotifyApi,
    store: &dyn DocumentStore,
) -> Result<CrossMatchStats> {
    info!("Collecting Spotify tracks for {} :: starting", window);

    let clouder_week = window.clouder_week();
    let bp_tracks = store
        .find(
            "bp_tracks",
            &Filter::new().eq("clouder_week", clouder_week.clone()),
            Some(&["id", "isrc", "genre.id"]),
            None,
        )
        .await?;

    let full_cnt = bp_tracks.len() as u64;
    let mut matched = Vec::new();
    let mut found = 0u64;
    let mut is_genre = 0u64;

    for bp_track in &bp_tracks {
        let Some(isrc) = bp_track.get("isrc").and_then(Value::as_str) else {
            continue;
        };
        let Some(mut sp_track) = spotify.track_by_isrc(isrc).await? else {
            continue;
        };

        if let Some(fields) = sp_track.as_object_mut() {
            fields.remove("available_markets");
            if let Some(album) = fields.get_mut("album").and_then(Value::as_object_mut) {
                album.remove("available_markets");
            }

            fields.insert("bp_id".to_string(), bp_track["id"].clone());
            fields.insert("clouder_week".to_string(), json!(clouder_week));
            if let Some(genre_id) = bp_track.pointer("/genre/id") {
                fields.insert("bp_genre_id".to_string(), genre_id.clone());
                if genre_id.as_u64() == Some(u64::from(window.style_id())) {
                    is_genre += 1;
                }
            }
        }

        matched.push(sp_track);
        found += 1;
        if found % 10 == 0 {
            info!("{} got Spotify tracks :: {} / {}", window, found, full_cnt);
        }
    }

    store
        .upsert_by_key("sp_tracks", &matched, &["id", "clouder_week"])
        .await?;

    let stats = CrossMatchStats {
        full_cnt,
        found,
        not_found: full_cnt - found,
        is_genre,
        not_genre: found - is_genre,
    };
    info!("{} got Spotify tracks :: {:?}", window, stats);
    Ok(stats)
}
