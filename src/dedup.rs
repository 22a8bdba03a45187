//! Content-hash deduplication across renditions
//!
//! The same Policy Address text is usually published twice, as HTML pages and
//! as a PDF. Candidates are keyed by a whitespace-insensitive SHA-256 of
//! their text; when two renditions collide, the configured format preference
//! decides which URL becomes canonical and which lands in `alias_urls`. The
//! outcome is the same no matter which rendition arrives first.

use crate::parse::{ContentKind, DocumentCandidate, DocumentMetadata};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use url::Url;

/// Which rendition wins when HTML and PDF carry the same content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatPreference {
    Html,
    Pdf,
}

impl FormatPreference {
    /// Parses the `deduplication.prefer` config value
    pub fn from_config(value: &str) -> Option<Self> {
        match value {
            "html" => Some(FormatPreference::Html),
            "pdf" => Some(FormatPreference::Pdf),
            _ => None,
        }
    }

    fn matches(&self, kind: ContentKind) -> bool {
        matches!(
            (self, kind),
            (FormatPreference::Html, ContentKind::Html)
                | (FormatPreference::Pdf, ContentKind::Pdf)
        )
    }
}

/// A deduplicated document, the unit that becomes an output record
#[derive(Debug, Clone)]
pub struct CanonicalDocument {
    /// Canonical source URL (the preferred rendition's URL)
    pub url: Url,

    pub title: String,

    /// Cleaned text content
    pub text: String,

    /// Rendition the canonical text came from
    pub kind: ContentKind,

    pub metadata: DocumentMetadata,

    /// Algorithm-prefixed content hash, e.g. `sha256:ab12...`
    pub content_hash: String,

    /// Other URLs whose content hashed the same
    pub alias_urls: BTreeSet<String>,

    /// When the canonical rendition was processed
    pub crawled_at: DateTime<Utc>,
}

/// What happened to a candidate during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// First time this content has been seen
    New,
    /// Candidate matched the preference and replaced the previous canonical
    ReplacedPrevious { previous_url: String },
    /// Content already known; candidate URL recorded as an alias
    AliasOfExisting { canonical_url: String },
}

/// Computes the algorithm-prefixed content hash of a text
///
/// Hashing runs over a whitespace-collapsed view of the text, so HTML and PDF
/// renditions that differ only in line breaking and spacing collide.
pub fn content_hash(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut hasher = Sha256::new();
    hasher.update(collapsed.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Resolves candidates into canonical documents
pub struct DedupResolver {
    preference: FormatPreference,
    documents: HashMap<String, CanonicalDocument>,
}

impl DedupResolver {
    pub fn new(preference: FormatPreference) -> Self {
        Self {
            preference,
            documents: HashMap::new(),
        }
    }

    /// Resolves one candidate against the documents seen so far
    pub fn resolve(&mut self, candidate: DocumentCandidate) -> Resolution {
        use std::collections::hash_map::Entry;

        let hash = content_hash(&candidate.text);

        match self.documents.entry(hash.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(CanonicalDocument {
                    url: candidate.url,
                    title: candidate.title,
                    text: candidate.text,
                    kind: candidate.kind,
                    metadata: candidate.metadata,
                    content_hash: hash,
                    alias_urls: BTreeSet::new(),
                    crawled_at: Utc::now(),
                });
                Resolution::New
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                let upgrades = self.preference.matches(candidate.kind)
                    && !self.preference.matches(existing.kind);

                if upgrades {
                    let previous_url = existing.url.as_str().to_string();
                    existing.alias_urls.insert(previous_url.clone());
                    existing.alias_urls.remove(candidate.url.as_str());
                    existing.url = candidate.url;
                    existing.title = candidate.title;
                    existing.text = candidate.text;
                    existing.kind = candidate.kind;
                    existing.metadata = candidate.metadata;
                    existing.crawled_at = Utc::now();
                    Resolution::ReplacedPrevious { previous_url }
                } else {
                    if candidate.url != existing.url {
                        existing
                            .alias_urls
                            .insert(candidate.url.as_str().to_string());
                    }
                    Resolution::AliasOfExisting {
                        canonical_url: existing.url.as_str().to_string(),
                    }
                }
            }
        }
    }

    /// Number of distinct documents resolved so far
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Consumes the resolver, yielding documents in a deterministic order
    ///
    /// Sorted by year, language, page number, then URL, so the output file
    /// does not depend on crawl interleaving.
    pub fn into_documents(self) -> Vec<CanonicalDocument> {
        let mut documents: Vec<CanonicalDocument> = self.documents.into_values().collect();
        documents.sort_by(|a, b| {
            (
                a.metadata.year,
                a.metadata.language.clone(),
                a.metadata.page_number,
                a.url.as_str().to_string(),
            )
                .cmp(&(
                    b.metadata.year,
                    b.metadata.language.clone(),
                    b.metadata.page_number,
                    b.url.as_str().to_string(),
                ))
        });
        documents
    }
}
