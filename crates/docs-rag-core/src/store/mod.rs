//! Vector collection abstraction.
//!
//! The [`VectorStore`] trait is the only persisted state shared between the
//! ingestion path and the query path. Implementations: the SQLite
//! collection in the `docs-rag` app crate and [`memory::InMemoryStore`]
//! for tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{IndexedEntry, QueryHit};

/// A named, persistent collection of embedded chunks.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](VectorStore::upsert) | Insert entries; colliding ids overwrite |
/// | [`replace_all`](VectorStore::replace_all) | Drop every entry, then insert |
/// | [`query`](VectorStore::query) | Top-k nearest neighbours by cosine similarity |
/// | [`clear`](VectorStore::clear) | Remove every entry |
/// | [`count`](VectorStore::count) | Number of stored entries |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    async fn upsert(&self, entries: &[IndexedEntry]) -> Result<()>;

    /// Remove all entries and insert `entries`.
    ///
    /// The default implementation is not atomic; persistent backends
    /// should override it with a single transaction.
    async fn replace_all(&self, entries: &[IndexedEntry]) -> Result<()> {
        self.clear().await?;
        self.upsert(entries).await
    }

    /// Return at most `top_k` hits ordered by descending similarity,
    /// ties broken by ascending id.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryHit>>;

    /// Remove every entry, returning how many were removed.
    async fn clear(&self) -> Result<u64>;

    async fn count(&self) -> Result<u64>;
}

/// Sort hits by score descending then id ascending, and keep `top_k`.
///
/// Shared by store implementations so re-querying an unchanged
/// collection always returns the same ids in the same order.
pub fn rank_hits(mut hits: Vec<QueryHit>, top_k: usize) -> Vec<QueryHit> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(top_k);
    hits
}
