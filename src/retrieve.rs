//! `dq retrieve`: print the chunks most similar to a query.

use anyhow::Result;
use std::sync::Arc;

use docs_rag_core::embedding::EmbeddingProvider;
use docs_rag_core::retrieve::{Retrieval, Retriever};

use crate::config::Config;
use crate::embedding::create_provider;
use crate::sqlite_store::SqliteCollections;

const EXCERPT_CHARS: usize = 240;

pub async fn run_retrieve(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let embedder = create_provider(&config.embedding)?;
    let retrieval = retrieve_with(config, query, top_k, embedder).await?;

    if retrieval.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in retrieval.hits.iter().enumerate() {
        println!("{}. [{:.4}] {}", i + 1, hit.score, hit.id);
        println!("    heading: {}", hit.metadata.heading);
        println!("    file: {}", hit.metadata.file);
        println!("    excerpt: \"{}\"", excerpt(&hit.document));
        println!();
    }

    Ok(())
}

/// Retrieve against the configured collection with an explicit provider.
pub async fn retrieve_with(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<Retrieval> {
    let collections = SqliteCollections::open(&config.store.persist_dir).await?;
    let result = async {
        let collection = collections
            .open_for_query(
                &config.store.collection,
                embedder.model_name(),
                embedder.dims(),
            )
            .await?;

        let retriever = Retriever::new(embedder, Arc::new(collection));
        retriever
            .retrieve(query, top_k.unwrap_or(config.retrieval.top_k))
            .await
    }
    .await;
    collections.close().await;
    result
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().nth(EXCERPT_CHARS).is_some() {
        out.push('…');
    }
    out
}
