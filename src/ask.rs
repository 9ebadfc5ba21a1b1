//! `dq ask`: retrieve context, then answer with the completion provider.

use anyhow::{bail, Result};
use std::sync::Arc;

use docs_rag_core::answer::{Answer, Answerer, CompletionProvider};
use docs_rag_core::embedding::EmbeddingProvider;

use crate::completion::create_completer;
use crate::config::Config;
use crate::embedding::create_provider;
use crate::retrieve::retrieve_with;

pub async fn run_ask(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    if question.trim().is_empty() {
        bail!("Please enter a question.");
    }

    let embedder = create_provider(&config.embedding)?;
    let completer = create_completer(&config.completion)?;
    let answer = ask_with(config, question, top_k, embedder, completer).await?;

    if answer.is_degraded() {
        eprintln!("warning: the completion provider returned an unexpected response");
    }
    println!("{}", answer);
    Ok(())
}

/// Retrieval plus one grounded completion, with explicit providers.
pub async fn ask_with(
    config: &Config,
    question: &str,
    top_k: Option<usize>,
    embedder: Arc<dyn EmbeddingProvider>,
    completer: Arc<dyn CompletionProvider>,
) -> Result<Answer> {
    let retrieval = retrieve_with(config, question, top_k, embedder).await?;
    tracing::info!(hits = retrieval.hits.len(), "retrieved context");

    let answerer = Answerer::new(completer, config.grounding.policy());
    answerer.answer(question, &retrieval.context()).await
}
