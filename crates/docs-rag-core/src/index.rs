//! Indexer: chunks → embeddings → one bulk write to the vector collection.
//!
//! Each chunk gets the id `{base name}::chunk_{sequence_index}`. Ids are
//! checked for pairwise uniqueness before anything is embedded or written.
//! Texts are embedded in batches of `batch_size`, every batch is checked
//! for count and dimensionality, and the collection is written once at the
//! end, so a failing batch leaves the collection untouched.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingProvider;
use crate::error::PipelineError;
use crate::models::{Chunk, EntryMetadata, IndexedEntry};
use crate::store::VectorStore;

/// What happens to entries left over from a previous ingestion run.
///
/// Has no default; the caller picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReingestPolicy {
    /// Clear the collection, then write this run's entries.
    Replace,
    /// Overwrite entries whose ids collide and keep everything else,
    /// including ids from a different chunking parameterization.
    Upsert,
}

/// Summary of one indexing call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub entries_written: usize,
    pub batches: usize,
    pub dims: usize,
}

pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
}

impl Indexer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed `chunks` and write them to the collection under `policy`.
    ///
    /// With [`ReingestPolicy::Replace`] an empty chunk list still clears
    /// the collection.
    pub async fn index(&self, chunks: &[Chunk], policy: ReingestPolicy) -> Result<IndexReport> {
        let ids = assign_ids(chunks)?;

        if chunks.is_empty() {
            if policy == ReingestPolicy::Replace {
                self.store.replace_all(&[]).await?;
            }
            return Ok(IndexReport::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        let mut batches = 0;

        for batch in texts.chunks(self.batch_size) {
            let embedded = self.embedder.embed(batch).await?;
            if embedded.len() != batch.len() {
                return Err(PipelineError::VectorCountMismatch {
                    expected: batch.len(),
                    got: embedded.len(),
                }
                .into());
            }
            vectors.extend(embedded);
            batches += 1;
            tracing::debug!(
                batch = batches,
                embedded = vectors.len(),
                total = texts.len(),
                "embedded batch"
            );
        }

        let dims = check_dims(&vectors, self.embedder.dims())?;

        let entries: Vec<IndexedEntry> = chunks
            .iter()
            .zip(ids)
            .zip(vectors)
            .map(|((chunk, id), vector)| IndexedEntry {
                id,
                vector,
                document: chunk.text.clone(),
                metadata: EntryMetadata {
                    file: chunk.source_file.clone(),
                    heading: chunk.heading.clone(),
                },
            })
            .collect();

        match policy {
            ReingestPolicy::Replace => self.store.replace_all(&entries).await?,
            ReingestPolicy::Upsert => self.store.upsert(&entries).await?,
        }

        tracing::info!(
            collection = self.store.name(),
            entries = entries.len(),
            batches,
            dims,
            "indexed chunks"
        );

        Ok(IndexReport {
            entries_written: entries.len(),
            batches,
            dims,
        })
    }
}

/// Compute entry ids for `chunks`, rejecting duplicates.
pub fn assign_ids(chunks: &[Chunk]) -> Result<Vec<String>, PipelineError> {
    let mut seen = HashSet::with_capacity(chunks.len());
    let mut ids = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let id = chunk.entry_id();
        if !seen.insert(id.clone()) {
            return Err(PipelineError::DuplicateId(id));
        }
        ids.push(id);
    }
    Ok(ids)
}

/// All vectors must share one dimension, equal to the provider's when it
/// declares one (`0` means unknown).
fn check_dims(vectors: &[Vec<f32>], declared: usize) -> Result<usize, PipelineError> {
    let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
    if declared != 0 && dims != declared {
        return Err(PipelineError::DimensionMismatch {
            expected: declared,
            got: dims,
        });
    }
    for v in vectors {
        if v.len() != dims {
            return Err(PipelineError::DimensionMismatch {
                expected: dims,
                got: v.len(),
            });
        }
    }
    Ok(dims)
}
