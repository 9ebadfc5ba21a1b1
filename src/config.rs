//! TOML configuration parsing and validation.
//!
//! Every section has defaults except `[store].reingest`, which must be set
//! explicitly. A minimal file:
//!
//! ```toml
//! [store]
//! reingest = "replace"
//! ```
//!
//! [`load_config`] parses the file and runs [`Config::validate`]; any
//! [`ConfigError`] aborts before documents are read.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use docs_rag_core::answer::{GroundingPolicy, DEFAULT_SUBJECT};
use docs_rag_core::chunk::{ChunkingParams, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use docs_rag_core::index::ReingestPolicy;
use docs_rag_core::retrieve::DEFAULT_TOP_K;
use docs_rag_core::ChunkError;

/// Validation failures. Reported before any processing starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid chunking: {0}")]
    Chunking(#[from] ChunkError),

    #[error("retrieval.top_k must be >= 1")]
    ZeroTopK,

    #[error("embedding.batch_size must be >= 1")]
    ZeroBatchSize,

    #[error("store.collection must not be empty")]
    EmptyCollection,

    #[error("source.docs_path must not be empty")]
    EmptyDocsPath,

    #[error("unknown embedding provider: '{0}'. Must be local, openai, or ollama.")]
    UnknownEmbeddingProvider(String),

    #[error("embedding.{field} must be specified when provider is '{provider}'")]
    MissingEmbeddingField {
        provider: String,
        field: &'static str,
    },

    #[error("unknown completion provider: '{0}'. Must be gemini or openai.")]
    UnknownCompletionProvider(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub grounding: GroundingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Where the documentation comes from.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Git URL cloned when `local_path` is unset.
    #[serde(default = "default_repo")]
    pub repo: String,
    /// Existing checkout; takes precedence over `repo`.
    #[serde(default)]
    pub local_path: Option<PathBuf>,
    /// Documentation subdirectory inside the checkout.
    #[serde(default = "default_docs_path")]
    pub docs_path: String,
    /// Clone destination. Defaults to `.git-cache/<hash>` next to the store.
    #[serde(default)]
    pub clone_dir: Option<PathBuf>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default = "default_true")]
    pub shallow: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            local_path: None,
            docs_path: default_docs_path(),
            clone_dir: None,
            branch: None,
            shallow: true,
        }
    }
}

fn default_repo() -> String {
    "https://github.com/mkdocs/mkdocs.git".to_string()
}
fn default_docs_path() -> String {
    "docs".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Required: what a re-run does with entries from earlier runs.
    pub reingest: ReingestPolicy,
}

fn default_persist_dir() -> PathBuf {
    PathBuf::from("./chroma_db")
}
fn default_collection() -> String {
    "mkdocs".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL override (Ollama host, OpenAI-compatible endpoint).
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
            url: None,
        }
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_provider")]
    pub provider: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Full endpoint override.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_completion_provider(),
            model: default_completion_model(),
            api_key_env: default_api_key_env(),
            url: None,
            timeout_secs: default_completion_timeout(),
        }
    }
}

fn default_completion_provider() -> String {
    "gemini".to_string()
}
fn default_completion_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_completion_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroundingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subject: default_subject(),
        }
    }
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

impl GroundingConfig {
    pub fn policy(&self) -> Option<GroundingPolicy> {
        self.enabled.then(|| GroundingPolicy::new(&self.subject))
    }
}

/// What to do with a document that cannot be read as UTF-8 text.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadErrorPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngestConfig {
    #[serde(default)]
    pub on_read_error: ReadErrorPolicy,
}

impl Config {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking_params()?;

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ZeroTopK);
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::EmptyCollection);
        }
        if self.source.docs_path.trim().is_empty() {
            return Err(ConfigError::EmptyDocsPath);
        }

        match self.embedding.provider.as_str() {
            "local" => {}
            "openai" | "ollama" => {
                let missing = |field| ConfigError::MissingEmbeddingField {
                    provider: self.embedding.provider.clone(),
                    field,
                };
                if self.embedding.model.is_none() {
                    return Err(missing("model"));
                }
                if matches!(self.embedding.dims, None | Some(0)) {
                    return Err(missing("dims"));
                }
            }
            other => return Err(ConfigError::UnknownEmbeddingProvider(other.to_string())),
        }

        match self.completion.provider.as_str() {
            "gemini" | "openai" => {}
            other => return Err(ConfigError::UnknownCompletionProvider(other.to_string())),
        }

        Ok(())
    }

    pub fn chunking_params(&self) -> Result<ChunkingParams, ConfigError> {
        Ok(ChunkingParams::new(
            self.chunking.chunk_size,
            self.chunking.overlap,
        )?)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    Config::from_toml(&content)
}
