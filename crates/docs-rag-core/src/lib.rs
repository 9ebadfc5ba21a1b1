//! # Docs RAG Core
//!
//! Pure pipeline logic for docs-rag: Markdown normalization, overlapping
//! word chunking, indexing, retrieval, and grounded answering.
//!
//! This crate contains no tokio runtime, sqlx, HTTP clients, or filesystem
//! I/O. Every external collaborator is a trait that the application crate
//! implements and passes in:
//!
//! | Collaborator | Trait |
//! |--------------|-------|
//! | Embedding model | [`embedding::EmbeddingProvider`] |
//! | Vector collection | [`store::VectorStore`] |
//! | Generative model | [`answer::CompletionProvider`] |
//!
//! ## Pipeline
//!
//! ```text
//! raw Markdown ─▶ normalize ─▶ Chunker ─▶ Indexer ─▶ VectorStore
//!                                                         │
//!            question ─▶ Retriever ───────────────────────┘
//!                            │
//!                            ▼
//!                        Answerer ─▶ Answer
//! ```

pub mod answer;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod normalize;
pub mod retrieve;
pub mod store;

pub use error::{ChunkError, PipelineError};
