//! Overlapping word-window chunker.
//!
//! Splits normalized text into windows of at most `chunk_size`
//! whitespace-delimited words. Each window starts `chunk_size - overlap`
//! words after the previous one, so adjacent windows share exactly
//! `overlap` words. Chunking stops once a window reaches the last word;
//! no trailing window made only of overlap is emitted.
//!
//! For `n` words with `n > overlap` this yields
//! `ceil((n - overlap) / (chunk_size - overlap))` chunks. Empty text
//! yields none, and any non-empty text yields at least one.
//!
//! Window parameters are validated up front: `chunk_size == 0` or
//! `overlap >= chunk_size` fail with [`ChunkError`] instead of looping.

use crate::error::ChunkError;
use crate::models::Chunk;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_OVERLAP: usize = 50;

/// Validated window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingParams {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Words the window advances by. Always >= 1.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Split one text into chunks numbered from 0.
pub fn chunk_text(
    text: &str,
    source_file: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, ChunkError> {
    let params = ChunkingParams::new(chunk_size, overlap)?;
    Ok(split_windows(text, source_file, params, 0))
}

/// Chunker for a whole ingestion run.
///
/// Keeps one sequence counter across every document it is given, so the
/// `sequence_index` (and therefore the entry id) of each chunk is unique
/// within the run. Feed documents in a deterministic order to get
/// reproducible ids.
#[derive(Debug)]
pub struct Chunker {
    params: ChunkingParams,
    next_index: u64,
}

impl Chunker {
    pub fn new(params: ChunkingParams) -> Self {
        Self {
            params,
            next_index: 0,
        }
    }

    pub fn params(&self) -> ChunkingParams {
        self.params
    }

    pub fn chunk(&mut self, text: &str, source_file: &str) -> Vec<Chunk> {
        let chunks = split_windows(text, source_file, self.params, self.next_index);
        self.next_index += chunks.len() as u64;
        chunks
    }

    /// Number of chunks produced so far.
    pub fn emitted(&self) -> u64 {
        self.next_index
    }
}

fn split_windows(
    text: &str,
    source_file: &str,
    params: ChunkingParams,
    first_index: u64,
) -> Vec<Chunk> {
    let words = word_spans(text);
    if words.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + params.chunk_size).min(words.len());
        let window = &words[start..end];

        let joined = window
            .iter()
            .map(|(_, w)| *w)
            .collect::<Vec<_>>()
            .join(" ");

        let (span_start, _) = window[0];
        let (last_start, last_word) = window[window.len() - 1];
        let span = &text[span_start..last_start + last_word.len()];

        chunks.push(Chunk {
            text: joined,
            source_file: source_file.to_string(),
            heading: derive_heading(span, source_file),
            sequence_index: first_index + chunks.len() as u64,
        });

        if end == words.len() {
            break;
        }
        start += params.stride();
    }

    chunks
}

/// Whitespace-delimited words with their byte offsets in `text`.
fn word_spans(text: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut word_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = word_start.take() {
                spans.push((s, &text[s..i]));
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(s) = word_start {
        spans.push((s, &text[s..]));
    }

    spans
}

fn derive_heading(span: &str, source_file: &str) -> String {
    match span.split_once('\n') {
        Some((first_line, _)) if !first_line.trim().is_empty() => first_line.trim().to_string(),
        _ => source_file.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (0..n)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn words_of(chunk: &Chunk) -> Vec<&str> {
        chunk.text.split(' ').collect()
    }

    #[test]
    fn test_title_document_single_chunk() {
        let chunks = chunk_text("Title\n\nSome bold text and code.", "docs/index.md", 500, 50)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Title Some bold text and code.");
        assert_eq!(chunks[0].heading, "Title");
        assert_eq!(chunks[0].source_file, "docs/index.md");
        assert_eq!(chunks[0].sequence_index, 0);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(chunk_text("", "a.md", 500, 50).unwrap().is_empty());
        assert!(chunk_text(" \n\t ", "a.md", 500, 50).unwrap().is_empty());
    }

    #[test]
    fn test_overlap_equal_to_size_fails_fast() {
        let err = chunk_text("some words here", "a.md", 50, 50).unwrap_err();
        assert_eq!(
            err,
            ChunkError::OverlapTooLarge {
                chunk_size: 50,
                overlap: 50
            }
        );
    }

    #[test]
    fn test_overlap_larger_than_size_fails_fast() {
        assert!(ChunkingParams::new(10, 11).is_err());
    }

    #[test]
    fn test_zero_chunk_size_fails() {
        assert_eq!(
            ChunkingParams::new(0, 0).unwrap_err(),
            ChunkError::ZeroChunkSize
        );
    }

    #[test]
    fn test_default_params() {
        let p = ChunkingParams::default();
        assert_eq!(p.chunk_size(), 500);
        assert_eq!(p.overlap(), 50);
        assert_eq!(p.stride(), 450);
    }

    #[test]
    fn test_chunk_count_formula() {
        for s in 1..8usize {
            for o in 0..s {
                for n in (o + 1)..40usize {
                    let chunks = chunk_text(&numbered_words(n), "a.md", s, o).unwrap();
                    let expected = (n - o).div_ceil(s - o);
                    assert_eq!(chunks.len(), expected, "n={} s={} o={}", n, s, o);
                }
            }
        }
    }

    #[test]
    fn test_text_shorter_than_overlap_still_chunked() {
        let chunks = chunk_text("just two", "a.md", 10, 5).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "just two");
    }

    #[test]
    fn test_window_sizes() {
        let (s, o) = (7, 3);
        let chunks = chunk_text(&numbered_words(50), "a.md", s, o).unwrap();
        let last = chunks.len() - 1;
        for (i, c) in chunks.iter().enumerate() {
            assert!(c.word_count() <= s);
            if i < last {
                assert_eq!(c.word_count(), s, "chunk {} is short", i);
            }
        }
    }

    #[test]
    fn test_adjacent_chunks_share_overlap() {
        let (s, o) = (6, 2);
        let chunks = chunk_text(&numbered_words(31), "a.md", s, o).unwrap();
        for pair in chunks.windows(2) {
            let prev = words_of(&pair[0]);
            let next = words_of(&pair[1]);
            assert_eq!(&prev[prev.len() - o..], &next[..o]);
        }
    }

    #[test]
    fn test_last_chunk_ends_with_last_word() {
        let chunks = chunk_text(&numbered_words(23), "a.md", 5, 1).unwrap();
        assert!(chunks.last().unwrap().text.ends_with("w22"));
    }

    #[test]
    fn test_words_joined_by_single_space() {
        let chunks = chunk_text("a   b\n\n\tc", "a.md", 10, 0).unwrap();
        assert_eq!(chunks[0].text, "a b c");
    }

    #[test]
    fn test_heading_falls_back_to_source_file() {
        let chunks = chunk_text("no line breaks at all", "docs/x.md", 10, 2).unwrap();
        assert_eq!(chunks[0].heading, "docs/x.md");
    }

    #[test]
    fn test_heading_uses_window_span() {
        let text = "one two three\nfour five six seven";
        let chunks = chunk_text(text, "a.md", 3, 1).unwrap();
        // window 0: "one two three" has no line break inside its span
        assert_eq!(chunks[0].heading, "a.md");
        // window 1 starts at "three" and crosses the line break
        assert_eq!(chunks[1].heading, "three");
    }

    #[test]
    fn test_chunker_counter_spans_documents() {
        let mut chunker = Chunker::new(ChunkingParams::new(4, 1).unwrap());
        let a = chunker.chunk(&numbered_words(10), "a.md");
        let b = chunker.chunk(&numbered_words(10), "b.md");
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);
        let indices: Vec<u64> = a.iter().chain(b.iter()).map(|c| c.sequence_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(chunker.emitted(), 6);
    }

    #[test]
    fn test_deterministic() {
        let text = numbered_words(100);
        let c1 = chunk_text(&text, "a.md", 9, 4).unwrap();
        let c2 = chunk_text(&text, "a.md", 9, 4).unwrap();
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_multibyte_words() {
        let chunks = chunk_text("héllo wörld\nñandú", "a.md", 2, 1).unwrap();
        assert_eq!(chunks[0].text, "héllo wörld");
        assert_eq!(chunks[1].text, "wörld ñandú");
        assert_eq!(chunks[1].heading, "wörld");
    }
}
