//! Chunked upsert sink
//!
//! Buffers documents and flushes one upsert batch per `chunk_size` items, so
//! a large collection window never holds more than one chunk in flight.
//! Counters accumulate across chunks; a chunk-level persistence failure is
//! logged and propagated to the caller.

use serde::Serialize;
use tracing::{debug, error};

use crate::error::Result;
use crate::store::{Document, DocumentStore};

pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Accumulated counters for one sink lifetime
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SinkStats {
    pub full_cnt: u64,
    pub inserted: u64,
    pub updated: u64,
}

/// Chunked writer over a [`DocumentStore`] collection
pub struct UpsertSink<'a> {
    store: &'a dyn DocumentStore,
    collection: String,
    key_fields: Vec<String>,
    chunk_size: usize,
    buffer: Vec<Document>,
    stats: SinkStats,
}

impl<'a> UpsertSink<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        collection: impl Into<String>,
        key_fields: &[&str],
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            key_fields: key_fields.iter().map(|f| f.to_string()).collect(),
            chunk_size: chunk_size.max(1),
            buffer: Vec::new(),
            stats: SinkStats::default(),
        }
    }

    /// Buffer one document, flushing when the chunk is full
    pub async fn push(&mut self, doc: Document) -> Result<()> {
        self.buffer.push(doc);
        self.stats.full_cnt += 1;
        if self.buffer.len() >= self.chunk_size {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let key_fields: Vec<&str> = self.key_fields.iter().map(String::as_str).collect();
        match self
            .store
            .upsert_by_key(&self.collection, &self.buffer, &key_fields)
            .await
        {
            Ok(counts) => {
                debug!(
                    "Flushed {} documents to {} : inserted = {} : updated = {}",
                    self.buffer.len(),
                    self.collection,
                    counts.inserted,
                    counts.updated
                );
                self.stats.inserted += counts.inserted;
                self.stats.updated += counts.updated;
                self.buffer.clear();
                Ok(())
            }
            Err(err) => {
                error!("Failed to save chunk to {} :: {}", self.collection, err);
                Err(err)
            }
        }
    }

    /// Flush the trailing partial chunk and report the accumulated counters
    pub async fn finish(mut self) -> Result<SinkStats> {
        self.flush().await?;
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::{Filter, Sort, UpsertCounts};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Store recording the size of every upsert batch it receives
    #[derive(Default)]
    struct RecordingStore {
        batches: Mutex<Vec<usize>>,
        fail: bool,
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn upsert_by_key(
            &self,
            _collection: &str,
            docs: &[Document],
            _key_fields: &[&str],
        ) -> Result<UpsertCounts> {
            if self.fail {
                return Err(Error::Config("injected persistence failure".into()));
            }
            self.batches.lock().unwrap().push(docs.len());
            Ok(UpsertCounts {
                inserted: docs.len() as u64,
                updated: 0,
            })
        }

        async fn find(
            &self,
            _collection: &str,
            _filter: &Filter,
            _projection: Option<&[&str]>,
            _sort: Option<&Sort>,
        ) -> Result<Vec<Document>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn chunks_250_items_into_three_batches() {
        let store = RecordingStore::default();
        let mut sink = UpsertSink::new(&store, "bp_tracks", &["id"], 100);
        for id in 0..250 {
            sink.push(json!({ "id": id })).await.unwrap();
        }
        let stats = sink.finish().await.unwrap();

        assert_eq!(*store.batches.lock().unwrap(), vec![100, 100, 50]);
        assert_eq!(
            stats,
            SinkStats {
                full_cnt: 250,
                inserted: 250,
                updated: 0
            }
        );
    }

    #[tokio::test]
    async fn empty_sink_never_touches_the_store() {
        let store = RecordingStore::default();
        let sink = UpsertSink::new(&store, "bp_tracks", &["id"], 100);
        let stats = sink.finish().await.unwrap();

        assert!(store.batches.lock().unwrap().is_empty());
        assert_eq!(stats, SinkStats::default());
    }

    #[tokio::test]
    async fn chunk_failure_propagates() {
        let store = RecordingStore {
            fail: true,
            ..Default::default()
        };
        let mut sink = UpsertSink::new(&store, "bp_tracks", &["id"], 2);
        sink.push(json!({ "id": 1 })).await.unwrap();
        let err = sink.push(json!({ "id": 2 })).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
