//! PDF text extraction
//!
//! PDF renditions are extracted page by page so each page can become its own
//! document candidate with a `page_number`. When no page yields text the
//! document is treated as a parse failure rather than an empty document.

use crate::parse::clean_text;
use crate::ParseError;
use url::Url;

/// Text of one PDF page
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// 1-based page number
    pub number: u32,

    /// Cleaned page text
    pub text: String,
}

/// Extracts per-page text from a PDF body
///
/// Pages that fail to decode or carry no text are skipped with a warning;
/// the call fails only when the document cannot be loaded at all or no page
/// yields any text.
pub fn extract_pages(body: &[u8], url: &Url) -> Result<Vec<PdfPage>, ParseError> {
    let document = lopdf::Document::load_mem(body).map_err(|e| ParseError::Pdf {
        url: url.as_str().to_string(),
        message: e.to_string(),
    })?;

    let mut pages = Vec::new();
    for number in document.get_pages().keys().copied() {
        match document.extract_text(&[number]) {
            Ok(raw) => {
                let text = clean_text(&raw);
                if text.is_empty() {
                    tracing::debug!("{} page {}: no text", url, number);
                    continue;
                }
                pages.push(PdfPage { number, text });
            }
            Err(e) => {
                tracing::warn!("{} page {}: extraction failed: {}", url, number, e);
            }
        }
    }

    if pages.is_empty() {
        return Err(ParseError::Pdf {
            url: url.as_str().to_string(),
            message: "no extractable text on any page".to_string(),
        });
    }

    Ok(pages)
}

/// Best-effort PDF title: first line of the first page, else the file name
pub fn title_from_pages(pages: &[PdfPage], url: &Url) -> String {
    if let Some(first) = pages.first() {
        if let Some(line) = first.text.lines().find(|l| !l.trim().is_empty()) {
            let line = line.trim();
            let truncated: String = line.chars().take(120).collect();
            return truncated;
        }
    }

    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .unwrap_or("Untitled")
        .to_string()
}
