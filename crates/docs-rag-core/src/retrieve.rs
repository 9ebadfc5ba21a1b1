//! Retriever: query → embedding → top-k hits from the vector collection.
//!
//! The query is embedded with the same provider used at ingest, searched
//! against the collection, and returned in the collection's ranking
//! (similarity descending, ties by id). Hits are not deduplicated.

use std::sync::Arc;

use anyhow::Result;

use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::PipelineError;
use crate::models::QueryHit;
use crate::store::VectorStore;

pub const DEFAULT_TOP_K: usize = 5;

/// Ranked hits for one query.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub query: String,
    pub hits: Vec<QueryHit>,
}

impl Retrieval {
    /// Chunk texts in ranked order.
    pub fn texts(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.document.as_str()).collect()
    }

    /// Chunk texts joined with blank lines, ready for the answer prompt.
    pub fn context(&self) -> String {
        self.texts().join("\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Return the `top_k` chunks most similar to `query`.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        if top_k == 0 {
            return Err(PipelineError::InvalidTopK.into());
        }

        let vector = embed_query(self.embedder.as_ref(), query).await?;
        let hits = self.store.query(&vector, top_k).await?;

        tracing::debug!(
            collection = self.store.name(),
            top_k,
            returned = hits.len(),
            "retrieved chunks"
        );

        Ok(Retrieval {
            query: query.to_string(),
            hits,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::{EntryMetadata, IndexedEntry};
    use crate::store::memory::InMemoryStore;

    /// Maps a text to `[count("deploy"), count("theme")]`.
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    vec![
                        t.matches("deploy").count() as f32,
                        t.matches("theme").count() as f32,
                    ]
                })
                .collect())
        }
    }

    fn entry(id: &str, text: &str, vector: Vec<f32>) -> IndexedEntry {
        IndexedEntry {
            id: id.to_string(),
            vector,
            document: text.to_string(),
            metadata: EntryMetadata {
                file: "docs/x.md".to_string(),
                heading: "x".to_string(),
            },
        }
    }

    async fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new("docs"));
        store
            .upsert(&[
                entry("a::chunk_0", "deploy with gh-deploy", vec![1.0, 0.0]),
                entry("b::chunk_1", "pick a theme", vec![0.0, 1.0]),
                entry("c::chunk_2", "deploy a theme", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_retrieve_orders_by_similarity() {
        let retriever = Retriever::new(Arc::new(KeywordEmbedder), seeded_store().await);
        let r = retriever.retrieve("how do I deploy", 2).await.unwrap();
        assert_eq!(
            r.texts(),
            vec!["deploy with gh-deploy", "deploy a theme"]
        );
        assert_eq!(r.context(), "deploy with gh-deploy\n\ndeploy a theme");
    }

    #[tokio::test]
    async fn test_retrieve_is_stable_across_requeries() {
        let retriever = Retriever::new(Arc::new(KeywordEmbedder), seeded_store().await);
        let first = retriever.retrieve("nothing matches", 3).await.unwrap();
        let second = retriever.retrieve("nothing matches", 3).await.unwrap();
        let ids = |r: &Retrieval| r.hits.iter().map(|h| h.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.hits.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_top_k_rejected() {
        let retriever = Retriever::new(Arc::new(KeywordEmbedder), seeded_store().await);
        let err = retriever.retrieve("deploy", 0).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidTopK)
        ));
    }

    #[tokio::test]
    async fn test_empty_collection_gives_empty_context() {
        let retriever = Retriever::new(Arc::new(KeywordEmbedder), Arc::new(InMemoryStore::new("e")));
        let r = retriever.retrieve("deploy", DEFAULT_TOP_K).await.unwrap();
        assert!(r.is_empty());
        assert_eq!(r.context(), "");
    }
}
