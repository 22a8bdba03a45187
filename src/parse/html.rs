//! HTML page extraction
//!
//! Pulls out the pieces traversal and record building need: a title (with
//! fallbacks), the main content text, every followable link, and the
//! "next page" link when the page advertises one.

use crate::parse::clean_text;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Tags whose text is never content
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside",
];

/// Block-level tags that imply a paragraph break in extracted text
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "li", "tr", "br", "h1", "h2", "h3", "h4", "h5", "h6",
    "table", "ul", "ol", "blockquote",
];

/// Link texts that mean "go to the next content page"
///
/// Covers the English and Chinese labels used across Policy Address editions.
const NEXT_PAGE_TEXTS: &[&str] = &["next page", "next", "下一頁", "下頁", "繼續"];

/// Everything extracted from one HTML page
#[derive(Debug, Clone)]
pub struct ParsedHtml {
    /// Title after the fallback chain, `None` only when the page offers
    /// nothing at all
    pub title: Option<String>,

    /// First top-level heading, used as the section label
    pub section: Option<String>,

    /// Cleaned main content text
    pub text: String,

    /// Absolute followable links, in document order
    pub links: Vec<Url>,

    /// Target of an explicit "next page" link, if the page has one
    pub next_url: Option<Url>,
}

/// Parses an HTML page
pub fn parse_html(html: &str, base_url: &Url) -> ParsedHtml {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let section = extract_section(&document);
    let text = extract_content_text(&document);
    let (links, next_url) = extract_links(&document, base_url);

    ParsedHtml {
        title,
        section,
        text,
        links,
        next_url,
    }
}

/// Title fallback chain: `<title>`, first `<h1>`, then `og:title`
fn extract_title(document: &Html) -> Option<String> {
    if let Some(title) = select_text(document, "title") {
        return Some(title);
    }
    if let Some(h1) = select_text(document, "h1") {
        return Some(h1);
    }
    let og = Selector::parse(r#"meta[property="og:title"]"#).ok()?;
    document
        .select(&og)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First h1 or h2 text, used as the section label for the page
fn extract_section(document: &Html) -> Option<String> {
    select_text(document, "h1").or_else(|| select_text(document, "h2"))
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts the main content text
///
/// Prefers a `main`, `article`, or `#content` region over the whole body,
/// and drops script/style/chrome subtrees either way.
fn extract_content_text(document: &Html) -> String {
    let region = pick_content_region(document);
    let raw = match region {
        Some(element) => collect_text(element),
        None => String::new(),
    };
    clean_text(&raw)
}

fn pick_content_region(document: &Html) -> Option<ElementRef<'_>> {
    for candidate in ["main", "article", "#content", "body"] {
        if let Ok(selector) = Selector::parse(candidate) {
            if let Some(element) = document.select(&selector).next() {
                return Some(element);
            }
        }
    }
    None
}

/// Walks a region and gathers text, skipping excluded subtrees and inserting
/// newlines at block boundaries
fn collect_text(region: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_into(region, &mut out);
    out
}

fn collect_into(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if EXCLUDED_TAGS.contains(&name) {
        return;
    }
    if BLOCK_TAGS.contains(&name) {
        out.push('\n');
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_into(child_element, out);
        }
    }

    if BLOCK_TAGS.contains(&name) {
        out.push('\n');
    }
}

/// Extracts followable links and spots the "next page" link by its text
fn extract_links(document: &Html, base_url: &Url) -> (Vec<Url>, Option<Url>) {
    let mut links = Vec::new();
    let mut next_url = None;

    let Ok(selector) = Selector::parse("a[href]") else {
        return (links, next_url);
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve_link(href, base_url) else {
            continue;
        };

        if next_url.is_none() {
            let text = element.text().collect::<String>().trim().to_lowercase();
            if NEXT_PAGE_TEXTS.iter().any(|pat| text == *pat) {
                next_url = Some(url.clone());
            }
        }

        links.push(url);
    }

    (links, next_url)
}

/// Resolves an href against the page URL, dropping non-followable schemes
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let url = base_url.join(href).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}
