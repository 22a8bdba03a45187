//! URL normalization for frontier identity
//!
//! Two URLs that normalize to the same string are the same frontier entry.
//! Normalization is conservative: lowercase host, drop fragments, sort query
//! parameters, and let the `url` crate resolve dot segments and default ports.

use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL string into its canonical frontier identity
///
/// # Arguments
///
/// * `input` - The URL string to normalize (must be absolute)
///
/// # Returns
///
/// * `Ok(Url)` - The normalized URL
/// * `Err(UrlError)` - The URL is malformed, has a non-HTTP scheme, or no host
pub fn normalize_url(input: &str) -> UrlResult<Url> {
    let mut url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?;
    let lowered = host.to_lowercase();
    if lowered != host {
        url.set_host(Some(&lowered))
            .map_err(|e| UrlError::Parse(e.to_string()))?;
    }

    // Fragments never change the fetched resource
    url.set_fragment(None);

    sort_query(&mut url);

    Ok(url)
}

/// Sorts query parameters so that parameter order does not split identities
fn sort_query(url: &mut Url) {
    if url.query().is_none() {
        return;
    }

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
        return;
    }

    pairs.sort();

    let query: Vec<String> = pairs
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                k.clone()
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect();
    url.set_query(Some(&query.join("&")));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_host() {
        let url = normalize_url("https://WWW.PolicyAddress.GOV.HK/2021/eng/p1.html").unwrap();
        assert_eq!(url.host_str(), Some("www.policyaddress.gov.hk"));
        assert_eq!(url.path(), "/2021/eng/p1.html");
    }

    #[test]
    fn test_strip_fragment() {
        let url = normalize_url("https://example.gov.hk/2021/eng/p1.html#section-3").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.as_str(), "https://example.gov.hk/2021/eng/p1.html");
    }

    #[test]
    fn test_default_port_dropped() {
        let url = normalize_url("https://example.gov.hk:443/index.html").unwrap();
        assert_eq!(url.port(), None);
        assert_eq!(url.as_str(), "https://example.gov.hk/index.html");
    }

    #[test]
    fn test_explicit_port_kept() {
        let url = normalize_url("http://127.0.0.1:8080/policy.html").unwrap();
        assert_eq!(url.port(), Some(8080));
    }

    #[test]
    fn test_dot_segments_resolved() {
        let url = normalize_url("https://example.gov.hk/2021/eng/../chi/p1.html").unwrap();
        assert_eq!(url.path(), "/2021/chi/p1.html");
    }

    #[test]
    fn test_query_sorted() {
        let a = normalize_url("https://example.gov.hk/search?year=2021&lang=en").unwrap();
        let b = normalize_url("https://example.gov.hk/search?lang=en&year=2021").unwrap();
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(matches!(
            normalize_url("ftp://example.gov.hk/file.pdf"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_rejects_relative_url() {
        assert!(matches!(
            normalize_url("/2021/eng/p1.html"),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_same_identity_with_and_without_fragment() {
        let a = normalize_url("https://example.gov.hk/2021/eng/p2.html").unwrap();
        let b = normalize_url("https://example.gov.hk/2021/eng/p2.html#top").unwrap();
        assert_eq!(a, b);
    }
}
