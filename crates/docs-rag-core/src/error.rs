//! Typed errors for conditions callers need to tell apart.
//!
//! Trait methods and orchestration return `anyhow::Result`; these types
//! travel inside the `anyhow::Error` and can be recovered with
//! `downcast_ref`.

/// Invalid chunking window. Always a configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    #[error("chunk_size must be > 0")]
    ZeroChunkSize,

    /// `overlap >= chunk_size` would keep the window from ever advancing.
    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// Errors raised by the indexing and retrieval stages.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error("duplicate entry id in one ingestion run: {0}")]
    DuplicateId(String),

    #[error("embedding provider returned {got} vectors for {expected} texts")]
    VectorCountMismatch { expected: usize, got: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("top_k must be >= 1")]
    InvalidTopK,

    #[error("embedding provider returned no vector for the query")]
    EmptyQueryEmbedding,
}
