//! In-memory [`VectorStore`] for tests.
//!
//! Entries live in a `BTreeMap` keyed by id behind `std::sync::RwLock`.
//! Search is brute-force cosine similarity over every stored vector.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{IndexedEntry, QueryHit};

use super::{rank_hits, VectorStore};

/// In-memory collection.
pub struct InMemoryStore {
    name: String,
    entries: RwLock<BTreeMap<String, IndexedEntry>>,
}

impl InMemoryStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Ids currently stored, in ascending order.
    pub fn ids(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<IndexedEntry> {
        self.entries.read().ok()?.get(id).cloned()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new("default")
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, entries: &[IndexedEntry]) -> Result<()> {
        let mut stored = self
            .entries
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        for entry in entries {
            stored.insert(entry.id.clone(), entry.clone());
        }
        Ok(())
    }

    async fn replace_all(&self, entries: &[IndexedEntry]) -> Result<()> {
        let mut stored = self
            .entries
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        stored.clear();
        for entry in entries {
            stored.insert(entry.id.clone(), entry.clone());
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryHit>> {
        let stored = self
            .entries
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let hits = stored
            .values()
            .map(|e| QueryHit {
                id: e.id.clone(),
                document: e.document.clone(),
                metadata: e.metadata.clone(),
                score: cosine_similarity(vector, &e.vector),
            })
            .collect();
        Ok(rank_hits(hits, top_k))
    }

    async fn clear(&self) -> Result<u64> {
        let mut stored = self
            .entries
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let n = stored.len() as u64;
        stored.clear();
        Ok(n)
    }

    async fn count(&self) -> Result<u64> {
        let stored = self
            .entries
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(stored.len() as u64)
    }
}
