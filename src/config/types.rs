//! Configuration type definitions
//!
//! These structs mirror the TOML configuration file layout. Keys use
//! kebab-case in the file and are renamed onto snake_case fields.

use serde::Deserialize;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Crawl scope and bounds
    pub crawler: CrawlerConfig,

    /// Politeness settings
    #[serde(rename = "rate-limits", default)]
    pub rate_limits: RateLimitConfig,

    /// HTTP fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Content deduplication policy
    #[serde(default)]
    pub deduplication: DedupConfig,

    /// Chunking parameters for retrieval records
    #[serde(default)]
    pub rag: RagConfig,

    /// Output locations
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl scope and bounds
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed URLs (edition tables of contents)
    pub seeds: Vec<String>,

    /// Hosts the crawl is allowed to touch
    #[serde(rename = "allowed-hosts")]
    pub allowed_hosts: Vec<String>,

    /// Policy Address edition years to crawl; empty means all years
    #[serde(default)]
    pub years: Vec<u16>,

    /// Maximum link depth from a seed
    #[serde(rename = "depth-limit", default = "default_depth_limit")]
    pub depth_limit: u32,

    /// Maximum number of fetches for the whole run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Whether to fetch and honor robots.txt before crawling
    #[serde(rename = "respect-robots-txt", default = "default_true")]
    pub respect_robots_txt: bool,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Politeness settings
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per second against a single host
    #[serde(rename = "per-host-rps", default = "default_per_host_rps")]
    pub per_host_rps: f64,

    /// Maximum simultaneous in-flight requests against a single host
    #[serde(rename = "per-host-concurrency", default = "default_per_host_concurrency")]
    pub per_host_concurrency: usize,

    /// Maximum simultaneous in-flight requests overall
    #[serde(rename = "global-concurrency", default = "default_global_concurrency")]
    pub global_concurrency: usize,
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// TCP connect timeout in milliseconds
    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Whole-request timeout in milliseconds
    #[serde(rename = "read-timeout-ms", default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Retry attempts after the first failed request
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound on a single backoff delay in milliseconds
    #[serde(rename = "retry-max-delay-ms", default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// Content deduplication policy
#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    /// Preferred rendition when HTML and PDF carry the same content
    #[serde(default = "default_prefer")]
    pub prefer: String,

    /// Skip URLs already present in the output file when resuming
    #[serde(rename = "skip-existing-files", default = "default_true")]
    pub skip_existing_files: bool,
}

/// Chunking parameters for retrieval records
#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    /// Target chunk size in estimated tokens
    #[serde(rename = "chunk-size-tokens", default = "default_chunk_size_tokens")]
    pub chunk_size_tokens: usize,

    /// Overlap between consecutive chunks in estimated tokens
    #[serde(rename = "chunk-overlap-tokens", default = "default_chunk_overlap_tokens")]
    pub chunk_overlap_tokens: usize,

    /// Prefer paragraph and sentence boundaries when cutting chunks
    #[serde(rename = "respect-boundaries", default = "default_true")]
    pub respect_boundaries: bool,
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSONL document records file
    #[serde(rename = "documents-path", default = "default_documents_path")]
    pub documents_path: String,
}

impl RateLimitConfig {
    /// Minimum spacing between two requests to the same host
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.per_host_rps)
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

fn default_depth_limit() -> u32 {
    5
}

fn default_max_pages() -> usize {
    200
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "PolicyAddressCrawler/1.0".to_string()
}

fn default_per_host_rps() -> f64 {
    1.0
}

fn default_per_host_concurrency() -> usize {
    2
}

fn default_global_concurrency() -> usize {
    4
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_prefer() -> String {
    "html".to_string()
}

fn default_chunk_size_tokens() -> usize {
    1000
}

fn default_chunk_overlap_tokens() -> usize {
    150
}

fn default_documents_path() -> String {
    "data/documents.jsonl".to_string()
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_host_rps: default_per_host_rps(),
            per_host_concurrency: default_per_host_concurrency(),
            global_concurrency: default_global_concurrency(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            prefer: default_prefer(),
            skip_existing_files: true,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size_tokens: default_chunk_size_tokens(),
            chunk_overlap_tokens: default_chunk_overlap_tokens(),
            respect_boundaries: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            documents_path: default_documents_path(),
        }
    }
}
