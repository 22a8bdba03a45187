//! Token-aware text chunking
//!
//! Splits a document's cleaned text into overlapping windows sized in
//! estimated tokens. The estimate is a fixed four characters per token, which
//! keeps chunking fully deterministic: the same text and parameters always
//! produce byte-identical chunks.
//!
//! Offsets are character offsets into the input text. Consecutive chunks
//! overlap by exactly `end_char(previous) - start_char(next)` characters, so
//! concatenating chunk texts with the overlap dropped reproduces the input.

use crate::config::RagConfig;

/// Characters per estimated token
pub const CHARS_PER_TOKEN: usize = 4;

/// One chunk of a document's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position of this chunk within its document
    pub sequence: usize,

    /// The chunk text, a verbatim slice of the input
    pub text: String,

    /// Estimated token count of the chunk text
    pub token_count: usize,

    /// Character offset of the first character, inclusive
    pub start_char: usize,

    /// Character offset past the last character, exclusive
    pub end_char: usize,
}

/// Estimates the token count of a text
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    (chars + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN
}

/// Splits text into overlapping chunks
///
/// Each chunk targets `chunk-size-tokens` estimated tokens; the next chunk
/// starts `chunk-overlap-tokens` estimated tokens before the previous one
/// ended. With `respect-boundaries` set, a cut shifts back to the nearest
/// paragraph, line, or sentence boundary inside a small search window; when
/// the window has no boundary the cut is a hard one.
pub fn chunk_text(text: &str, config: &RagConfig) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    // Byte offset of every char boundary, plus the end of the text
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = bounds.len() - 1;

    let step = config.chunk_size_tokens * CHARS_PER_TOKEN;
    let overlap = config.chunk_overlap_tokens * CHARS_PER_TOKEN;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut sequence = 0usize;

    loop {
        let hard_end = (start + step).min(total_chars);
        let end = if config.respect_boundaries && hard_end < total_chars {
            boundary_cut(text, &bounds, start, hard_end, overlap).unwrap_or(hard_end)
        } else {
            hard_end
        };

        let slice = &text[bounds[start]..bounds[end]];
        chunks.push(Chunk {
            sequence,
            text: slice.to_string(),
            token_count: estimate_tokens(slice),
            start_char: start,
            end_char: end,
        });

        if end >= total_chars {
            break;
        }
        start = end - overlap;
        sequence += 1;
    }

    chunks
}

/// Finds a boundary to cut at, searching backward from `hard_end`
///
/// The search window is the last fifth of the chunk. A candidate cut is only
/// accepted when it leaves the next chunk strictly ahead of this one, which
/// keeps the walk making progress.
fn boundary_cut(
    text: &str,
    bounds: &[usize],
    start: usize,
    hard_end: usize,
    overlap: usize,
) -> Option<usize> {
    let window_chars = ((hard_end - start) / 5).max(1);
    let window_start = hard_end - window_chars;

    let window_bytes = &text[bounds[window_start]..bounds[hard_end]];

    let cut_byte = find_boundary(window_bytes)?;
    let absolute_byte = bounds[window_start] + cut_byte;

    // Map the byte position back to a char offset
    let cut_char = bounds.partition_point(|&b| b < absolute_byte);
    if bounds[cut_char] != absolute_byte {
        return None;
    }

    // The cut must leave room past the overlap or the next chunk would not
    // advance
    (cut_char > start + overlap).then_some(cut_char)
}

/// Byte offset just past the last boundary in the window, if any
///
/// Boundaries in preference order: paragraph break, line break, sentence end.
fn find_boundary(window: &str) -> Option<usize> {
    if let Some(pos) = window.rfind("\n\n") {
        return Some(pos + 2);
    }
    if let Some(pos) = window.rfind('\n') {
        return Some(pos + 1);
    }
    if let Some(pos) = window.rfind(". ") {
        return Some(pos + 2);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(size: usize, overlap: usize, respect: bool) -> RagConfig {
        RagConfig {
            chunk_size_tokens: size,
            chunk_overlap_tokens: overlap,
            respect_boundaries: respect,
        }
    }

    /// Rebuilds the original text from chunks by dropping each overlap
    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut prev_end = 0usize;
        for chunk in chunks {
            let skip = prev_end - chunk.start_char;
            out.extend(chunk.text.chars().skip(skip));
            prev_end = chunk.end_char;
        }
        out
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", &params(10, 2, true)).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("short", &params(10, 2, true));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks[0].end_char, 5);
        assert_eq!(chunks[0].sequence, 0);
    }

    #[test]
    fn test_token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_offsets_are_monotonic_and_overlapping() {
        let text = "word ".repeat(200);
        let chunks = chunk_text(&text, &params(20, 5, false));
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            assert!(pair[1].start_char > pair[0].start_char);
            assert!(pair[1].end_char > pair[0].end_char);
            // Overlap is exactly the configured window on hard cuts
            assert_eq!(pair[0].end_char - pair[1].start_char, 5 * CHARS_PER_TOKEN);
        }
    }

    #[test]
    fn test_reconstruction_hard_cuts() {
        let text = "abcdefghij".repeat(100);
        let chunks = chunk_text(&text, &params(16, 4, false));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_reconstruction_with_boundaries() {
        let mut text = String::new();
        for i in 0..60 {
            text.push_str(&format!("Paragraph number {} has several words in it.\n\n", i));
        }
        let chunks = chunk_text(&text, &params(50, 10, true));
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_boundary_cut_prefers_paragraph_break() {
        // One paragraph break sits inside the search window of the first cut
        let first = "a".repeat(300);
        let text = format!("{}\n\n{}", first, "b".repeat(500));
        let chunks = chunk_text(&text, &params(80, 10, true));

        // 80 tokens = 320 chars; the break at 300-302 is inside the last fifth
        assert_eq!(chunks[0].end_char, 302);
        assert!(chunks[0].text.ends_with("\n\n"));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_no_boundary_in_window_hard_cut() {
        let text = "x".repeat(1000);
        let chunks = chunk_text(&text, &params(50, 10, true));
        assert_eq!(chunks[0].end_char, 200);
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_deterministic() {
        let text = "The quick brown fox. Jumps over the lazy dog.\n\n".repeat(50);
        let config = params(30, 6, true);
        assert_eq!(chunk_text(&text, &config), chunk_text(&text, &config));
    }

    #[test]
    fn test_multibyte_text_cuts_on_char_boundaries() {
        let text = "施政報告提出多項新措施。".repeat(40);
        let chunks = chunk_text(&text, &params(12, 3, true));
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks), text);
        for chunk in &chunks {
            assert_eq!(
                chunk.text.chars().count(),
                chunk.end_char - chunk.start_char
            );
        }
    }

    #[test]
    fn test_zero_overlap() {
        let text = "abcd".repeat(50);
        let chunks = chunk_text(&text, &params(10, 0, false));
        assert_eq!(reconstruct(&chunks), text);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end_char, pair[1].start_char);
        }
    }

    #[test]
    fn test_token_count_matches_text() {
        let text = "word ".repeat(100);
        for chunk in chunk_text(&text, &params(15, 3, true)) {
            assert_eq!(chunk.token_count, estimate_tokens(&chunk.text));
        }
    }
}
