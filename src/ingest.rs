//! Ingestion pipeline orchestration.
//!
//! Coordinates the offline batch: source checkout → discovery → UTF-8 read →
//! normalization → chunking → embedding → one bulk write to the collection.
//! Every document is chunked before the first embedding request, so a read
//! failure under `on_read_error = "abort"` leaves the collection untouched.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docs_rag_core::chunk::{Chunker, ChunkingParams};
use docs_rag_core::embedding::EmbeddingProvider;
use docs_rag_core::index::{IndexReport, Indexer};
use docs_rag_core::models::Chunk;
use docs_rag_core::normalize::normalize;

use crate::config::{Config, ReadErrorPolicy};
use crate::discover::{find_markdown_files, read_document, DocFile};
use crate::embedding::create_provider;
use crate::progress::{IngestProgressEvent, IngestProgressReporter, NoProgress, ProgressMode};
use crate::source;
use crate::sqlite_store::SqliteCollections;

/// CLI-level switches for one `dq ingest` run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub local_path: Option<PathBuf>,
    pub dry_run: bool,
    pub progress: ProgressMode,
}

/// Chunks for a whole run plus what was left out.
#[derive(Debug, Default)]
pub struct PreparedChunks {
    pub files_found: usize,
    pub skipped: Vec<String>,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub collection: String,
    pub model: String,
    pub files_found: usize,
    pub files_skipped: usize,
    pub chunks: usize,
    pub report: IndexReport,
}

pub async fn run_ingest(config: &Config, opts: &IngestOptions) -> Result<()> {
    let reporter = opts.progress.reporter();
    let prepared = discover_and_chunk(config, opts.local_path.as_deref(), reporter.as_ref())?;

    if opts.dry_run {
        println!("ingest {} (dry-run)", config.store.collection);
        println!("  files found: {}", prepared.files_found);
        println!("  files skipped: {}", prepared.skipped.len());
        println!("  chunks: {}", prepared.chunks.len());
        return Ok(());
    }

    let embedder = create_provider(&config.embedding)?;
    let summary = index_prepared(config, prepared, embedder, reporter.as_ref()).await?;

    println!("ingest {}", summary.collection);
    println!("  files found: {}", summary.files_found);
    println!("  files skipped: {}", summary.files_skipped);
    println!("  chunks: {}", summary.chunks);
    println!("  entries written: {}", summary.report.entries_written);
    println!("  model: {} ({} dims)", summary.model, summary.report.dims);
    println!("  persisted at: {}", config.store.persist_dir.display());
    println!("ok");

    Ok(())
}

/// Full ingest with an explicit embedding provider.
pub async fn ingest_with(
    config: &Config,
    local_path: Option<&Path>,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<IngestSummary> {
    let prepared = discover_and_chunk(config, local_path, &NoProgress)?;
    index_prepared(config, prepared, embedder, &NoProgress).await
}

fn discover_and_chunk(
    config: &Config,
    local_path: Option<&Path>,
    reporter: &dyn IngestProgressReporter,
) -> Result<PreparedChunks> {
    let root = source::resolve_root(config, local_path)?;
    reporter.report(IngestProgressEvent::Discovering {
        dir: root.join(&config.source.docs_path).display().to_string(),
    });

    let files = find_markdown_files(&root, &config.source.docs_path)?;
    tracing::info!(files = files.len(), root = %root.display(), "found markdown files");

    prepare_chunks(
        &files,
        config.chunking_params()?,
        config.ingest.on_read_error,
        reporter,
    )
}

/// Read, normalize, and chunk `files` in order with one run-wide counter.
pub fn prepare_chunks(
    files: &[DocFile],
    params: ChunkingParams,
    on_read_error: ReadErrorPolicy,
    reporter: &dyn IngestProgressReporter,
) -> Result<PreparedChunks> {
    let mut chunker = Chunker::new(params);
    let mut prepared = PreparedChunks {
        files_found: files.len(),
        ..PreparedChunks::default()
    };
    let total = files.len() as u64;

    for (i, file) in files.iter().enumerate() {
        match read_document(file) {
            Ok(doc) => {
                let cleaned = normalize(&doc.body);
                let chunks = chunker.chunk(&cleaned, &doc.path);
                tracing::debug!(file = %doc.path, chunks = chunks.len(), "chunked");
                prepared.chunks.extend(chunks);
            }
            Err(e) if on_read_error == ReadErrorPolicy::Skip => {
                tracing::warn!(file = %file.display, error = %e, "skipping unreadable file");
                prepared.skipped.push(file.display.clone());
            }
            Err(e) => {
                return Err(e.context(
                    "aborting ingest; set ingest.on_read_error = \"skip\" to continue past unreadable files",
                ))
            }
        }

        // Skipped files count as read.
        reporter.report(IngestProgressEvent::Reading {
            n: i as u64 + 1,
            total,
        });
    }

    Ok(prepared)
}

async fn index_prepared(
    config: &Config,
    prepared: PreparedChunks,
    embedder: Arc<dyn EmbeddingProvider>,
    reporter: &dyn IngestProgressReporter,
) -> Result<IngestSummary> {
    let policy = config.store.reingest;
    let model = embedder.model_name().to_string();
    let collections = SqliteCollections::open(&config.store.persist_dir).await?;
    let result = async {
        let collection = collections
            .open_for_ingest(
                &config.store.collection,
                embedder.model_name(),
                embedder.dims(),
                policy,
            )
            .await?;

        reporter.report(IngestProgressEvent::Indexing {
            chunks: prepared.chunks.len() as u64,
        });

        let indexer = Indexer::new(embedder, Arc::new(collection), config.embedding.batch_size);
        indexer.index(&prepared.chunks, policy).await
    }
    .await;
    collections.close().await;
    let report = result?;

    Ok(IngestSummary {
        collection: config.store.collection.clone(),
        model,
        files_found: prepared.files_found,
        files_skipped: prepared.skipped.len(),
        chunks: prepared.chunks.len(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, body: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn test_prepare_numbers_chunks_across_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "docs/a.md", b"one two three four five six seven");
        write(tmp.path(), "docs/b.md", b"# B\n\neight nine ten");
        let files = find_markdown_files(tmp.path(), "docs").unwrap();

        let params = ChunkingParams::new(4, 1).unwrap();
        let prepared =
            prepare_chunks(&files, params, ReadErrorPolicy::Abort, &NoProgress).unwrap();

        assert_eq!(prepared.files_found, 2);
        let ids: Vec<String> = prepared.chunks.iter().map(|c| c.entry_id()).collect();
        assert_eq!(ids, vec!["a.md::chunk_0", "a.md::chunk_1", "b.md::chunk_2"]);
        assert_eq!(prepared.chunks[2].source_file, "docs/b.md");
        assert_eq!(prepared.chunks[2].text, "B eight nine ten");
    }

    #[test]
    fn test_prepare_skip_and_abort() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "docs/a.md", b"fine text");
        write(tmp.path(), "docs/b.md", &[0xc3, 0x28]);
        let files = find_markdown_files(tmp.path(), "docs").unwrap();
        let params = ChunkingParams::default();

        let prepared =
            prepare_chunks(&files, params, ReadErrorPolicy::Skip, &NoProgress).unwrap();
        assert_eq!(prepared.skipped, vec!["docs/b.md".to_string()]);
        assert_eq!(prepared.chunks.len(), 1);

        assert!(prepare_chunks(&files, params, ReadErrorPolicy::Abort, &NoProgress).is_err());
    }

    #[derive(Default)]
    struct Recorder(std::sync::Mutex<Vec<IngestProgressEvent>>);

    impl IngestProgressReporter for Recorder {
        fn report(&self, event: IngestProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_progress_reaches_total_when_last_file_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "docs/a.md", b"fine text");
        write(tmp.path(), "docs/z.md", &[0xff, 0xfe, 0x00]);
        let files = find_markdown_files(tmp.path(), "docs").unwrap();

        let recorder = Recorder::default();
        let prepared = prepare_chunks(
            &files,
            ChunkingParams::default(),
            ReadErrorPolicy::Skip,
            &recorder,
        )
        .unwrap();

        assert_eq!(prepared.skipped, vec!["docs/z.md".to_string()]);
        let events = recorder.0.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                IngestProgressEvent::Reading { n: 1, total: 2 },
                IngestProgressEvent::Reading { n: 2, total: 2 },
            ]
        );
    }
}
