//! Ingest progress reporting.
//!
//! Progress is emitted on **stderr** so stdout stays parseable for
//! scripts: a human line per event, or one JSON object per line with
//! `--json-progress`.

use std::io::Write;

/// A single progress event for `dq ingest`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestProgressEvent {
    /// Walking the documentation directory. Total unknown.
    Discovering { dir: String },
    /// Reading and chunking: `n` of `total` files done.
    Reading { n: u64, total: u64 },
    /// Embedding and writing `chunks` chunks to the collection.
    Indexing { chunks: u64 },
}

/// Reports ingest progress. Implementations write to stderr.
pub trait IngestProgressReporter: Send + Sync {
    fn report(&self, event: IngestProgressEvent);
}

/// Human-friendly progress: "ingest  reading  12 / 1,034 files".
pub struct StderrProgress;

impl IngestProgressReporter for StderrProgress {
    fn report(&self, event: IngestProgressEvent) {
        let line = match &event {
            IngestProgressEvent::Discovering { dir } => {
                format!("ingest  discovering {}...\n", dir)
            }
            IngestProgressEvent::Reading { n, total } => format!(
                "ingest  reading  {} / {} files\n",
                format_number(*n),
                format_number(*total)
            ),
            IngestProgressEvent::Indexing { chunks } => {
                format!("ingest  embedding  {} chunks\n", format_number(*chunks))
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line.
pub struct JsonProgress;

impl JsonProgress {
    fn to_json(event: &IngestProgressEvent) -> serde_json::Value {
        match event {
            IngestProgressEvent::Discovering { dir } => serde_json::json!({
                "event": "progress",
                "phase": "discovering",
                "dir": dir
            }),
            IngestProgressEvent::Reading { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "reading",
                "n": n,
                "total": total
            }),
            IngestProgressEvent::Indexing { chunks } => serde_json::json!({
                "event": "progress",
                "phase": "indexing",
                "chunks": chunks
            }),
        }
    }
}

impl IngestProgressReporter for JsonProgress {
    fn report(&self, event: IngestProgressEvent) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(&event)) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

pub struct NoProgress;

impl IngestProgressReporter for NoProgress {
    fn report(&self, _event: IngestProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human, or JSON.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IngestProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
