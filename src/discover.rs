//! Markdown discovery under the documentation directory.
//!
//! Files are found recursively with the `**/*.md` glob and returned in
//! lexicographic order of their path relative to the checkout root, which
//! fixes the chunk numbering for a given tree.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use docs_rag_core::models::Document;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("documentation directory not found: {0}")]
    DocsDirNotFound(PathBuf),
}

/// A Markdown file found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocFile {
    /// Location on disk.
    pub path: PathBuf,
    /// Path relative to the checkout root with `/` separators, e.g. `docs/index.md`.
    pub display: String,
}

pub fn find_markdown_files(root: &Path, docs_path: &str) -> Result<Vec<DocFile>> {
    let docs_dir = root.join(docs_path);
    if !docs_dir.is_dir() {
        return Err(DiscoveryError::DocsDirNotFound(docs_dir).into());
    }

    let include_set = build_globset(&["**/*.md"])?;
    let exclude_set = build_globset(&["**/.git/**", "**/node_modules/**"])?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&docs_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&docs_dir).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        let display = format!("{}/{}", docs_path.trim_end_matches('/'), rel_str);
        files.push(DocFile {
            path: path.to_path_buf(),
            display,
        });
    }

    files.sort_by(|a, b| a.display.cmp(&b.display));
    tracing::debug!(dir = %docs_dir.display(), files = files.len(), "discovered markdown");
    Ok(files)
}

/// Read a file as UTF-8. Non-UTF-8 content is an error.
pub fn read_document(file: &DocFile) -> Result<Document> {
    let body = std::fs::read_to_string(&file.path)
        .with_context(|| format!("Failed to read {}", file.path.display()))?;
    Ok(Document::new(file.display.clone(), body))
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
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
    fn test_recursive_sorted_md_only() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "docs/user-guide/writing.md", b"w");
        write(tmp.path(), "docs/index.md", b"i");
        write(tmp.path(), "docs/about/license.md", b"l");
        write(tmp.path(), "docs/img/logo.png", b"png");
        write(tmp.path(), "README.md", b"outside docs");

        let files = find_markdown_files(tmp.path(), "docs").unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.display.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "docs/about/license.md",
                "docs/index.md",
                "docs/user-guide/writing.md"
            ]
        );
    }

    #[test]
    fn test_missing_docs_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let err = find_markdown_files(tmp.path(), "docs").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DiscoveryError>(),
            Some(DiscoveryError::DocsDirNotFound(p)) if p.ends_with("docs")
        ));
    }

    #[test]
    fn test_empty_docs_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("docs")).unwrap();
        assert!(find_markdown_files(tmp.path(), "docs").unwrap().is_empty());
    }

    #[test]
    fn test_read_document_rejects_invalid_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "docs/bad.md", &[0xff, 0xfe, 0x00]);
        write(tmp.path(), "docs/good.md", "# Héllo".as_bytes());

        let files = find_markdown_files(tmp.path(), "docs").unwrap();
        assert!(read_document(&files[0]).is_err());
        let doc = read_document(&files[1]).unwrap();
        assert_eq!(doc.file_name, "good.md");
        assert_eq!(doc.path, "docs/good.md");
        assert_eq!(doc.body, "# Héllo");
    }
}
