//! Run statistics recording
//!
//! Each stats-bearing stage's summary is merged into one `statistics`
//! document per week id, one sub-field per stage. Recording failures are
//! logged and swallowed so they can never mask the stage's real result.

use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::store::DocumentStore;

/// Merge `stats` into the week's statistics document under `stage_name`
pub async fn record_stage<S: Serialize>(
    store: &dyn DocumentStore,
    week_id: &str,
    stage_name: &str,
    stats: &S,
) {
    let value = match serde_json::to_value(stats) {
        Ok(value) => value,
        Err(err) => {
            error!("Failed to serialize {} statistics :: {}", stage_name, err);
            return;
        }
    };

    let doc = json!({ "id": week_id, stage_name: value });
    if let Err(err) = store.upsert_by_key("statistics", &[doc], &["id"]).await {
        error!("Failed to save {} statistics :: {}", stage_name, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::collect::CollectStats;
    use crate::store::{Filter, SqliteStore};

    #[tokio::test]
    async fn stages_merge_into_one_document() {
        let store = SqliteStore::in_memory().await.unwrap();
        let stats = CollectStats {
            full_cnt: 5,
            inserted: 5,
            updated: 0,
        };

        record_stage(&store, "DNB_2025_7", "beatport_tracks", &stats).await;
        record_stage(&store, "DNB_2025_7", "spotify", &serde_json::json!({"found": 1})).await;

        let docs = store
            .find(
                "statistics",
                &Filter::new().eq("id", "DNB_2025_7"),
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["beatport_tracks"]["full_cnt"], 5);
        assert_eq!(docs[0]["spotify"]["found"], 1);
    }
}
