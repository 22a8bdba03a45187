//! Policy-Crawler: a bounded crawler for multi-year Policy Address sites
//!
//! This crate implements a polite, bounded crawl pipeline: a URL frontier with
//! per-host rate limiting, a retrying fetcher, site-aware traversal (table of
//! contents, numbered content pages, PDF renditions), content-hash
//! deduplication across renditions, and token-aware chunking of the extracted
//! text into retrieval-ready records.

pub mod chunk;
pub mod config;
pub mod dedup;
pub mod fetcher;
pub mod frontier;
pub mod output;
pub mod parse;
pub mod robots;
pub mod traversal;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Output serialization error: {0}")]
    Output(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Document extraction errors (HTML or PDF)
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("HTML parse error for {url}: {message}")]
    Html { url: String, message: String },

    #[error("PDF parse error for {url}: {message}")]
    Pdf { url: String, message: String },

    #[error("Unsupported content type for {url}: {content_type}")]
    UnsupportedContentType { url: String, content_type: String },
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use dedup::{CanonicalDocument, DedupResolver, FormatPreference};
pub use frontier::{Frontier, HostState, TaskKind, UrlTask};
pub use output::DocumentRecord;
pub use url::normalize_url;
