//! Content extraction from fetched bodies
//!
//! A fetched body becomes one or more [`DocumentCandidate`]s: HTML pages
//! yield one candidate, PDF renditions yield one per page. Candidates carry
//! cleaned text plus whatever metadata the URL conventions reveal; the dedup
//! resolver decides which of them survive.

pub mod html;
pub mod pdf;

use crate::url::{infer_language, infer_page_number, infer_year};
use url::Url;

/// The rendition a candidate was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Pdf,
}

impl ContentKind {
    pub fn as_media_type(&self) -> &'static str {
        match self {
            ContentKind::Html => "text/html",
            ContentKind::Pdf => "application/pdf",
        }
    }
}

/// Metadata read from URL conventions and page structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Policy Address edition year
    pub year: Option<u16>,

    /// BCP 47 language tag inferred from the URL path
    pub language: Option<String>,

    /// Content page number (`p<N>.html`) or PDF page number
    pub page_number: Option<u32>,

    /// Section heading the content sits under
    pub section: Option<String>,

    /// Path component of the source URL
    pub file_path: Option<String>,
}

impl DocumentMetadata {
    /// Metadata derivable from the URL alone
    pub fn from_url(url: &Url) -> Self {
        Self {
            year: infer_year(url),
            language: infer_language(url).map(str::to_string),
            page_number: infer_page_number(url),
            section: None,
            file_path: Some(url.path().to_string()),
        }
    }
}

/// One extracted document, not yet deduplicated
#[derive(Debug, Clone)]
pub struct DocumentCandidate {
    /// Normalized source URL
    pub url: Url,

    /// Best-effort title, never empty
    pub title: String,

    /// Cleaned text content
    pub text: String,

    /// Which rendition this came from
    pub kind: ContentKind,

    /// URL- and structure-derived metadata
    pub metadata: DocumentMetadata,
}

/// Decides how to parse a body from its media type, falling back to the URL
/// extension when the server sends something generic
pub fn detect_kind(content_type: &str, url: &Url) -> Option<ContentKind> {
    if content_type.contains("html") || content_type.contains("xhtml") {
        return Some(ContentKind::Html);
    }
    if content_type.contains("pdf") {
        return Some(ContentKind::Pdf);
    }

    let path = url.path().to_lowercase();
    if path.ends_with(".pdf") {
        Some(ContentKind::Pdf)
    } else if path.ends_with(".html") || path.ends_with(".htm") || path.ends_with('/') {
        Some(ContentKind::Html)
    } else {
        None
    }
}

/// Cleans extracted text: unified newlines, collapsed space runs, at most one
/// blank line between paragraphs, no trailing space on any line
pub fn clean_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<String> = Vec::new();
    for line in unified.split('\n') {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        lines.push(collapsed);
    }

    // Collapse runs of blank lines into a single paragraph break
    let mut out = String::new();
    let mut pending_break = false;
    let mut started = false;
    for line in lines {
        if line.is_empty() {
            if started {
                pending_break = true;
            }
            continue;
        }
        if started {
            out.push_str(if pending_break { "\n\n" } else { "\n" });
        }
        out.push_str(&line);
        started = true;
        pending_break = false;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_detect_kind_by_media_type() {
        let u = url("https://example.gov.hk/download");
        assert_eq!(detect_kind("text/html", &u), Some(ContentKind::Html));
        assert_eq!(detect_kind("application/xhtml+xml", &u), Some(ContentKind::Html));
        assert_eq!(detect_kind("application/pdf", &u), Some(ContentKind::Pdf));
        assert_eq!(detect_kind("image/png", &u), None);
    }

    #[test]
    fn test_detect_kind_by_extension_fallback() {
        assert_eq!(
            detect_kind(
                "application/octet-stream",
                &url("https://example.gov.hk/2021/pdf/speech.pdf")
            ),
            Some(ContentKind::Pdf)
        );
        assert_eq!(
            detect_kind(
                "application/octet-stream",
                &url("https://example.gov.hk/2021/eng/p1.html")
            ),
            Some(ContentKind::Html)
        );
    }

    #[test]
    fn test_clean_text_collapses_space_runs() {
        assert_eq!(clean_text("a   b\t\tc"), "a b c");
    }

    #[test]
    fn test_clean_text_limits_blank_lines() {
        assert_eq!(clean_text("para one\n\n\n\npara two"), "para one\n\npara two");
    }

    #[test]
    fn test_clean_text_unifies_newlines_and_trims() {
        assert_eq!(clean_text("  \r\n line one \r\n line two \r\n "), "line one\nline two");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text("   \n\n  "), "");
    }

    #[test]
    fn test_metadata_from_url() {
        let meta =
            DocumentMetadata::from_url(&url("https://example.gov.hk/2021/eng/p7.html"));
        assert_eq!(meta.year, Some(2021));
        assert_eq!(meta.language.as_deref(), Some("en"));
        assert_eq!(meta.page_number, Some(7));
        assert_eq!(meta.file_path.as_deref(), Some("/2021/eng/p7.html"));
        assert_eq!(meta.section, None);
    }
}
