//! URL handling: normalization and Policy Address path conventions
//!
//! Policy Address sites share a predictable layout:
//! `/<year>/<language>/policy.html` is the table of contents for one edition,
//! `/<year>/<language>/p<N>.html` are the numbered content pages, and PDF
//! renditions live alongside as `.pdf` files. The helpers here read year,
//! language, and page number straight out of the path.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Extracts the lowercase host from a URL
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Infers the Policy Address edition year from a URL path
///
/// The first path segment that parses as a plausible year (1997-2099) wins.
pub fn infer_year(url: &Url) -> Option<u16> {
    url.path_segments()?
        .filter_map(|seg| seg.parse::<u16>().ok())
        .find(|y| (1997..=2099).contains(y))
}

/// Infers the document language from URL path conventions
///
/// Returns BCP 47 tags: "en" for English, "zh-Hant" for traditional Chinese,
/// "zh-Hans" for simplified Chinese.
pub fn infer_language(url: &Url) -> Option<&'static str> {
    for seg in url.path_segments()? {
        match seg {
            "eng" | "en" => return Some("en"),
            "chi" | "tc" | "trad" => return Some("zh-Hant"),
            "sim" | "sc" | "gb" => return Some("zh-Hans"),
            _ => {}
        }
    }
    None
}

/// Infers the content page number from a `p<N>.html` file name
pub fn infer_page_number(url: &Url) -> Option<u32> {
    let stem = html_file_stem(url)?;
    let digits = stem.strip_prefix('p')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Returns true if the URL points at a numbered content page (`p<N>.html`)
pub fn is_content_page(url: &Url) -> bool {
    infer_page_number(url).is_some()
}

/// Returns true if the URL points at an edition table of contents
pub fn is_toc_page(url: &Url) -> bool {
    matches!(html_file_stem(url), Some(stem) if stem == "policy" || stem == "index")
}

/// Returns true if the URL points at a PDF rendition
pub fn is_pdf(url: &Url) -> bool {
    url.path().to_lowercase().ends_with(".pdf")
}

/// Checks whether a URL falls inside the configured crawl scope
///
/// The host must be in the allow-list. If the URL carries an inferable year
/// and target years are configured, the year must be one of the targets;
/// year-less URLs (landing pages, shared assets) pass the year filter.
pub fn in_scope(url: &Url, allowed_hosts: &[String], years: &[u16]) -> bool {
    let Some(host) = extract_host(url) else {
        return false;
    };
    if !allowed_hosts.iter().any(|h| h.to_lowercase() == host) {
        return false;
    }
    if years.is_empty() {
        return true;
    }
    match infer_year(url) {
        Some(year) => years.contains(&year),
        None => true,
    }
}

/// The file stem of the last path segment when it names an HTML file
fn html_file_stem(url: &Url) -> Option<&str> {
    let last = url.path_segments()?.last()?;
    let lower_ok = last.ends_with(".html") || last.ends_with(".htm");
    if !lower_ok {
        return None;
    }
    last.rsplit_once('.').map(|(stem, _)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_infer_year() {
        assert_eq!(
            infer_year(&url("https://example.gov.hk/2021/eng/p1.html")),
            Some(2021)
        );
        assert_eq!(
            infer_year(&url("https://example.gov.hk/archive/1998/chi/policy.html")),
            Some(1998)
        );
        assert_eq!(infer_year(&url("https://example.gov.hk/about.html")), None);
    }

    #[test]
    fn test_year_ignores_page_like_numbers() {
        // "12" is not a plausible year segment
        assert_eq!(
            infer_year(&url("https://example.gov.hk/12/eng/p1.html")),
            None
        );
    }

    #[test]
    fn test_infer_language() {
        assert_eq!(
            infer_language(&url("https://example.gov.hk/2021/eng/p1.html")),
            Some("en")
        );
        assert_eq!(
            infer_language(&url("https://example.gov.hk/2021/chi/p1.html")),
            Some("zh-Hant")
        );
        assert_eq!(
            infer_language(&url("https://example.gov.hk/2021/sim/p1.html")),
            Some("zh-Hans")
        );
        assert_eq!(
            infer_language(&url("https://example.gov.hk/2021/p1.html")),
            None
        );
    }

    #[test]
    fn test_infer_page_number() {
        assert_eq!(
            infer_page_number(&url("https://example.gov.hk/2021/eng/p1.html")),
            Some(1)
        );
        assert_eq!(
            infer_page_number(&url("https://example.gov.hk/2021/eng/p142.html")),
            Some(142)
        );
        assert_eq!(
            infer_page_number(&url("https://example.gov.hk/2021/eng/policy.html")),
            None
        );
        assert_eq!(
            infer_page_number(&url("https://example.gov.hk/2021/eng/print.html")),
            None
        );
    }

    #[test]
    fn test_page_classification() {
        assert!(is_content_page(&url(
            "https://example.gov.hk/2021/eng/p3.html"
        )));
        assert!(is_toc_page(&url(
            "https://example.gov.hk/2021/eng/policy.html"
        )));
        assert!(!is_toc_page(&url("https://example.gov.hk/2021/eng/p3.html")));
        assert!(is_pdf(&url("https://example.gov.hk/2021/pdf/speech.PDF")));
        assert!(!is_pdf(&url("https://example.gov.hk/2021/eng/p3.html")));
    }

    #[test]
    fn test_in_scope_host_filter() {
        let hosts = vec!["www.policyaddress.gov.hk".to_string()];
        let years = vec![2021u16];
        assert!(in_scope(
            &url("https://www.policyaddress.gov.hk/2021/eng/p1.html"),
            &hosts,
            &years
        ));
        assert!(!in_scope(
            &url("https://other.gov.hk/2021/eng/p1.html"),
            &hosts,
            &years
        ));
    }

    #[test]
    fn test_in_scope_year_filter() {
        let hosts = vec!["example.gov.hk".to_string()];
        let years = vec![2020u16, 2021];
        assert!(!in_scope(
            &url("https://example.gov.hk/2019/eng/p1.html"),
            &hosts,
            &years
        ));
        // Year-less URLs pass the year filter
        assert!(in_scope(
            &url("https://example.gov.hk/index.html"),
            &hosts,
            &years
        ));
    }
}
