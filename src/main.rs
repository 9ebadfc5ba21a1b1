//! # docs-rag CLI (`dq`)
//!
//! The `dq` binary ingests a Markdown documentation tree into a persistent
//! vector collection and answers questions against it.
//!
//! ## Usage
//!
//! ```bash
//! dq --config ./config/dq.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dq init` | Create the persistence directory and schema |
//! | `dq ingest` | Clone (or use a local checkout), chunk, embed, and store the docs |
//! | `dq retrieve "<query>"` | Print the top-k most similar chunks |
//! | `dq ask "<question>"` | Retrieve context and answer with the completion model |
//! | `dq stats` | Summarize stored collections |
//!
//! ## Examples
//!
//! ```bash
//! # Index a local MkDocs checkout without cloning
//! dq ingest --local-path ../mkdocs
//!
//! # See what would be indexed
//! dq ingest --dry-run
//!
//! # Ask a question (needs GEMINI_API_KEY)
//! dq ask "How do I add a page to the nav?"
//! ```
//!
//! Diagnostics go to stderr through `tracing`; set `RUST_LOG=docs_rag=debug`
//! for per-file detail.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docs_rag::progress::ProgressMode;
use docs_rag::{ask, config, ingest, retrieve, sqlite_store, stats};

/// Documentation question answering over a Markdown docs tree.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/dq.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "dq",
    about = "Ingest a Markdown docs tree into a vector collection and ask questions against it",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/dq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the persistence directory and schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Run the ingestion pipeline.
    ///
    /// Discovers `**/*.md` under the docs directory, normalizes and chunks
    /// every file, embeds the chunks, and writes them to the configured
    /// collection using the configured re-ingest policy.
    Ingest {
        /// Use this checkout instead of cloning `source.repo`.
        #[arg(long)]
        local_path: Option<PathBuf>,

        /// Show file and chunk counts without embedding or writing.
        #[arg(long)]
        dry_run: bool,

        /// Emit progress as JSON lines on stderr.
        #[arg(long)]
        json_progress: bool,
    },

    /// Print the chunks most similar to a query.
    Retrieve {
        query: String,

        /// Number of chunks to return (defaults to `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Answer a question using retrieved documentation context.
    Ask {
        question: String,

        /// Number of chunks to use as context (defaults to `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show stored collections, their models, and entry counts.
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let collections = sqlite_store::SqliteCollections::open(&cfg.store.persist_dir).await?;
            collections.close().await;
            println!(
                "Store initialized at {}",
                cfg.store.persist_dir.display()
            );
        }
        Commands::Ingest {
            local_path,
            dry_run,
            json_progress,
        } => {
            let progress = if json_progress {
                ProgressMode::Json
            } else {
                ProgressMode::default_for_tty()
            };
            let opts = ingest::IngestOptions {
                local_path,
                dry_run,
                progress,
            };
            ingest::run_ingest(&cfg, &opts).await?;
        }
        Commands::Retrieve { query, top_k } => {
            retrieve::run_retrieve(&cfg, &query, top_k).await?;
        }
        Commands::Ask { question, top_k } => {
            ask::run_ask(&cfg, &question, top_k).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
