//! Document persistence
//!
//! The pipeline only depends on the [`DocumentStore`] contract: filtered reads
//! with projection and optional sort, and bulk upsert-by-key writes. The
//! shipped backend is [`SqliteStore`]; tests swap in lightweight fakes.

pub mod filter;
pub mod sink;
pub mod sqlite;

pub use filter::{Cmp, Filter, Sort};
pub use sink::{SinkStats, UpsertSink};
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::Result;

/// A persisted record: always a JSON object
pub type Document = serde_json::Value;

/// Counters reported by one upsert batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub inserted: u64,
    pub updated: u64,
}

/// Upsert-capable document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Upsert `docs` into `collection`, keyed by the projection onto
    /// `key_fields`
    ///
    /// A document whose key has no match is inserted; otherwise its fields
    /// shallow-merge over the stored document, so stored fields absent from
    /// the new document survive. Empty input returns `(0, 0)` without a
    /// round trip.
    async fn upsert_by_key(
        &self,
        collection: &str,
        docs: &[Document],
        key_fields: &[&str],
    ) -> Result<UpsertCounts>;

    /// Filtered read with optional field projection and sort
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&[&str]>,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>>;
}
