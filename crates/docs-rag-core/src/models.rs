//! Data types that flow through the ingestion and retrieval pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A Markdown source file read during discovery.
///
/// Consumed once by normalization and then dropped.
#[derive(Debug, Clone)]
pub struct Document {
    /// Display path of the file, as recorded in entry metadata.
    pub path: String,
    /// Base name of `path`; the prefix of every entry id from this file.
    pub file_name: String,
    pub body: String,
}

impl Document {
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            file_name: base_name(&path),
            path,
            body: body.into(),
        }
    }
}

/// A window of words from one document; the unit that is indexed and retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Words of the window joined by single spaces.
    pub text: String,
    pub source_file: String,
    /// First line of the window's source span, or `source_file` when the
    /// window does not cross a line break. Best-effort provenance only.
    pub heading: String,
    /// Position of the chunk across the whole ingestion run.
    pub sequence_index: u64,
}

impl Chunk {
    /// Collection id: `{base name of source_file}::chunk_{sequence_index}`.
    ///
    /// Uniqueness within a run comes from the run-wide counter, not from
    /// the file name.
    pub fn entry_id(&self) -> String {
        format!(
            "{}::chunk_{}",
            base_name(&self.source_file),
            self.sequence_index
        )
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

fn base_name(source_file: &str) -> String {
    Path::new(source_file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_file.to_string())
}

/// Metadata stored next to every indexed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub file: String,
    pub heading: String,
}

/// One row of the vector collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEntry {
    pub id: String,
    pub vector: Vec<f32>,
    /// The chunk text.
    pub document: String,
    pub metadata: EntryMetadata,
}

/// A ranked search result returned by a [`VectorStore`](crate::store::VectorStore).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: EntryMetadata,
    /// Cosine similarity to the query vector.
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source_file: &str, sequence_index: u64) -> Chunk {
        Chunk {
            text: "alpha beta".to_string(),
            source_file: source_file.to_string(),
            heading: source_file.to_string(),
            sequence_index,
        }
    }

    #[test]
    fn test_document_file_name_matches_entry_prefix() {
        let doc = Document::new("docs/user-guide/index.md", "body");
        assert_eq!(doc.file_name, "index.md");
        let c = chunk(&doc.path, 3);
        assert_eq!(c.entry_id(), format!("{}::chunk_3", doc.file_name));
    }

    #[test]
    fn test_entry_id_uses_base_name() {
        let c = chunk("/repo/docs/user-guide/index.md", 7);
        assert_eq!(c.entry_id(), "index.md::chunk_7");
    }

    #[test]
    fn test_entry_id_same_base_name_distinct_counter() {
        let a = chunk("docs/a/index.md", 0);
        let b = chunk("docs/b/index.md", 1);
        assert_ne!(a.entry_id(), b.entry_id());
    }

    #[test]
    fn test_word_count() {
        assert_eq!(chunk("a.md", 0).word_count(), 2);
    }
}
