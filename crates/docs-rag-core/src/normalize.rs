//! Markdown noise removal.
//!
//! [`normalize`] turns raw Markdown into plain prose before chunking. The
//! passes run in a fixed order because later patterns assume the earlier
//! ones already removed their delimiters:
//!
//! 1. fenced code blocks are dropped (multi-line, shortest match);
//! 2. inline code spans are unwrapped (backticks removed, text kept);
//! 3. HTML-like tags are stripped;
//! 4. heading markers are stripped at line starts;
//! 5. emphasis markers (`*`, `_`, `~`) are stripped;
//! 6. runs of blank lines collapse into one blank line;
//! 7. the whole text is trimmed.
//!
//! Malformed Markdown degrades gracefully: an unbalanced fence is left for
//! the inline-code pass, and a fence closed much later deletes everything
//! in between. The result is idempotent: `normalize(normalize(x)) == normalize(x)`.

use std::sync::LazyLock;

use regex::Regex;

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("fenced code pattern"));

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]*)`").expect("inline code pattern"));

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("html tag pattern"));

// Repeated marker runs and emphasis characters around them are consumed too,
// otherwise the emphasis pass could expose a fresh `# ` at a line start.
// `[^\S\n]` is any whitespace except newline, so the final trim cannot
// expose a marker either.
static HEADING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:[^\S\n]|[\x{FEFF}*_~])*(?:#[#*_~]*[^\S\n]+(?:[^\S\n]|[*_~])*)+")
        .expect("heading marker pattern")
});

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_~]").expect("emphasis pattern"));

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern"));

/// Strip Markdown syntax from `raw`, returning plain text.
///
/// # Example
///
/// ```rust
/// use docs_rag_core::normalize::normalize;
///
/// let text = normalize("# Title\n\nSome **bold** text and `code`.");
/// assert_eq!(text, "Title\n\nSome bold text and code.");
/// ```
pub fn normalize(raw: &str) -> String {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let text = FENCED_CODE.replace_all(raw, "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = HTML_TAG.replace_all(&text, "");
    let text = HEADING_MARKER.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}
