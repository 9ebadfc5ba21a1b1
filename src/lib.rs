//! # docs-rag
//!
//! Retrieval-augmented question answering over a Markdown documentation
//! tree (MkDocs by default).
//!
//! The pipeline itself (normalization, chunking, indexing, retrieval, and
//! grounded answering) lives in the `docs-rag-core` crate and talks to the
//! outside world through three traits. This crate supplies their concrete
//! implementations, the configuration layer, and the `dq` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌────────────────┐
//! │ git checkout │──▶│ normalize+chunk  │──▶│ SQLite vectors │
//! │  **/*.md     │   │ embed (batched)  │   │ collections    │
//! └──────────────┘   └──────────────────┘   └───────┬────────┘
//!                                                   │
//!                         ┌─────────────────────────┘
//!                         ▼
//!                   ┌──────────┐   ┌──────────────┐
//!                   │ retrieve │──▶│ grounded ask │
//!                   └──────────┘   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`source`] | Local checkout or `git clone` |
//! | [`discover`] | Markdown discovery and UTF-8 reads |
//! | [`ingest`] | Ingestion orchestration |
//! | [`embedding`] | OpenAI, Ollama, and local embedding providers |
//! | [`completion`] | Gemini and OpenAI chat completion providers |
//! | [`sqlite_store`] | Persistent [`VectorStore`](docs_rag_core::store::VectorStore) |
//! | [`retrieve`] | `dq retrieve` |
//! | [`ask`] | `dq ask` |
//! | [`stats`] | `dq stats` |
//! | [`progress`] | Ingest progress on stderr |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod ask;
pub mod completion;
pub mod config;
pub mod db;
pub mod discover;
pub mod embedding;
pub mod ingest;
pub mod migrate;
pub mod progress;
pub mod retrieve;
pub mod source;
pub mod sqlite_store;
pub mod stats;
