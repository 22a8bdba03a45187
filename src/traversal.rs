//! Site traversal: the task state machine and the crawl worker pool
//!
//! Every URL is crawled as one of three roles. A table of contents yields
//! content pages, PDF renditions, and nested edition tables of contents; a
//! content page yields its "next page"
//! link (explicit or by ascending page number) plus PDF links; a PDF is a
//! leaf. [`plan_links`] is the pure transition function; [`Crawler`] runs the
//! admit-fetch-parse-resolve pipeline across a bounded worker pool.

use crate::config::Config;
use crate::dedup::{CanonicalDocument, DedupResolver, FormatPreference, Resolution};
use crate::fetcher::{build_http_client, FetchError, FetchSuccess, Fetcher};
use crate::frontier::{AdmitOutcome, Frontier, FrontierStats, TaskKind, UrlTask};
use crate::output::{CrawlStats, StatsSnapshot};
use crate::parse::html::{parse_html, ParsedHtml};
use crate::parse::pdf::{extract_pages, title_from_pages};
use crate::parse::{detect_kind, ContentKind, DocumentCandidate, DocumentMetadata};
use crate::robots::{AllowAll, RobotsPolicy, RobotsTxtPolicy};
use crate::url::{infer_page_number, is_content_page, is_pdf, is_toc_page, normalize_url};
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Fallback title when a page offers none
const UNTITLED: &str = "Untitled";

/// Classifies a seed URL into its traversal role
pub fn classify_seed(url: &Url) -> TaskKind {
    if is_pdf(url) {
        TaskKind::PdfDocument
    } else if is_content_page(url) {
        TaskKind::ContentPage
    } else {
        TaskKind::Toc
    }
}

/// Computes the follow-up links for a parsed HTML page
///
/// Pure function of the task role, the page URL, and the parse result.
/// Returned URLs are normalized and deduplicated within the page.
pub fn plan_links(kind: TaskKind, page_url: &Url, parsed: &ParsedHtml) -> Vec<(Url, TaskKind)> {
    let mut out: Vec<(Url, TaskKind)> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut push = |url: Url, kind: TaskKind, out: &mut Vec<(Url, TaskKind)>| {
        if seen.insert(url.as_str().to_string()) {
            out.push((url, kind));
        }
    };

    match kind {
        TaskKind::Toc => {
            for link in &parsed.links {
                let Ok(url) = normalize_url(link.as_str()) else {
                    continue;
                };
                if is_pdf(&url) {
                    push(url, TaskKind::PdfDocument, &mut out);
                } else if is_content_page(&url) {
                    push(url, TaskKind::ContentPage, &mut out);
                } else if is_toc_page(&url) {
                    // A landing page lists the per-edition tables of contents
                    push(url, TaskKind::Toc, &mut out);
                }
            }
        }
        TaskKind::ContentPage => {
            if let Some(next) = parsed
                .next_url
                .as_ref()
                .and_then(|u| normalize_url(u.as_str()).ok())
            {
                push(next, TaskKind::ContentPage, &mut out);
            } else if let Some(next) = ascending_next(page_url, &parsed.links) {
                push(next, TaskKind::ContentPage, &mut out);
            }

            for link in &parsed.links {
                let Ok(url) = normalize_url(link.as_str()) else {
                    continue;
                };
                if is_pdf(&url) {
                    push(url, TaskKind::PdfDocument, &mut out);
                }
            }
        }
        TaskKind::PdfDocument => {}
    }

    out
}

/// Fallback next-page detection by the ascending `p<N>.html` pattern
///
/// Picks the lowest-numbered content page strictly after the current one.
fn ascending_next(page_url: &Url, links: &[Url]) -> Option<Url> {
    let current = infer_page_number(page_url).unwrap_or(0);
    links
        .iter()
        .filter_map(|link| {
            let url = normalize_url(link.as_str()).ok()?;
            let number = infer_page_number(&url)?;
            (number > current).then_some((number, url))
        })
        .min_by_key(|(number, _)| *number)
        .map(|(_, url)| url)
}

/// Everything a finished crawl hands back
pub struct CrawlOutcome {
    /// Deduplicated documents in deterministic order
    pub documents: Vec<CanonicalDocument>,

    /// Worker counters
    pub stats: StatsSnapshot,

    /// Final frontier counters
    pub frontier: FrontierStats,
}

/// The crawl engine
pub struct Crawler {
    config: Config,
    frontier: Arc<Frontier>,
    fetcher: Fetcher,
    resolver: Mutex<DedupResolver>,
    stats: CrawlStats,
    preference: FormatPreference,
}

impl Crawler {
    /// Builds the engine: HTTP client, robots gate, frontier, resolver
    ///
    /// When robots checking is enabled, robots.txt is fetched once per seed
    /// host before the crawl starts.
    pub async fn new(config: Config) -> Result<Self> {
        let client = build_http_client(&config.fetch, &config.crawler.user_agent)?;

        let robots: Arc<dyn RobotsPolicy> = if config.crawler.respect_robots_txt {
            let mut policy = RobotsTxtPolicy::new(&config.crawler.user_agent);
            let seeds: Vec<Url> = config
                .crawler
                .seeds
                .iter()
                .filter_map(|s| normalize_url(s).ok())
                .collect();
            policy.load_from_seeds(&client, &seeds).await;
            Arc::new(policy)
        } else {
            Arc::new(AllowAll)
        };

        let frontier = Arc::new(Frontier::new(
            config.rate_limits.clone(),
            config.crawler.depth_limit,
            config.crawler.max_pages,
            config.crawler.allowed_hosts.clone(),
            config.crawler.years.clone(),
        ));

        let fetcher = Fetcher::new(client, config.fetch.clone(), robots);

        let preference = FormatPreference::from_config(&config.deduplication.prefer)
            .unwrap_or(FormatPreference::Html);

        Ok(Self {
            config,
            frontier,
            fetcher,
            resolver: Mutex::new(DedupResolver::new(preference)),
            stats: CrawlStats::new(),
            preference,
        })
    }

    /// Marks URLs from a previous run as already crawled
    pub async fn preseed_visited(&self, urls: Vec<String>) -> usize {
        let normalized = urls
            .into_iter()
            .filter_map(|u| normalize_url(&u).ok())
            .map(|u| u.as_str().to_string());
        let added = self.frontier.seed_visited(normalized).await;
        if added > 0 {
            tracing::info!("Resuming: {} URLs already crawled", added);
        }
        added
    }

    /// Runs the crawl to completion and returns the deduplicated documents
    pub async fn run(self) -> Result<CrawlOutcome> {
        for seed in &self.config.crawler.seeds {
            let url = normalize_url(seed)?;
            let kind = classify_seed(&url);
            let outcome = self
                .frontier
                .enqueue(UrlTask {
                    url: url.clone(),
                    depth: 0,
                    kind,
                    parent: None,
                })
                .await;
            match outcome {
                AdmitOutcome::Queued => tracing::info!("Seeded {:?} {}", kind, url),
                other => tracing::warn!("Seed {} not queued: {:?}", url, other),
            }
        }

        let workers = self.config.rate_limits.global_concurrency;
        let preference = self.preference;
        let crawler = Arc::new(self);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let crawler = Arc::clone(&crawler);
            handles.push(tokio::spawn(async move {
                crawler.worker(worker_id).await;
            }));
        }
        for handle in handles {
            handle.await?;
        }

        let resolver = {
            let mut guard = crawler.resolver.lock().await;
            std::mem::replace(&mut *guard, DedupResolver::new(preference))
        };

        Ok(CrawlOutcome {
            documents: resolver.into_documents(),
            stats: crawler.stats.snapshot(),
            frontier: crawler.frontier.stats().await,
        })
    }

    async fn worker(&self, worker_id: usize) {
        while let Some(claimed) = self.frontier.next_task().await {
            let task = claimed.task.clone();
            self.process_task(&task).await;
            // Links are enqueued inside process_task, so completion comes last
            self.frontier.mark_completed(&task.url).await;
            drop(claimed);
        }
        tracing::debug!("Worker {} done", worker_id);
    }

    async fn process_task(&self, task: &UrlTask) {
        tracing::debug!("Fetching {:?} {} (depth {})", task.kind, task.url, task.depth);

        let fetched = match self.fetcher.fetch(&task.url).await {
            Ok(fetched) => fetched,
            Err(FetchError::RobotsDisallowed { url }) => {
                self.stats.record_robots_denied();
                tracing::info!("Robots disallowed: {}", url);
                return;
            }
            Err(e) => {
                self.stats.record_fetch_failure();
                tracing::warn!("Fetch failed: {}", e);
                return;
            }
        };

        self.stats.record_fetched();
        if fetched.attempt_count > 1 {
            tracing::debug!("{} needed {} attempts", task.url, fetched.attempt_count);
        }

        match detect_kind(&fetched.content_type, &task.url) {
            Some(ContentKind::Html) => self.process_html(task, &fetched).await,
            Some(ContentKind::Pdf) => self.process_pdf(task, &fetched).await,
            None => {
                self.stats.record_parse_failure();
                tracing::warn!(
                    "{}: unsupported content type {}",
                    task.url,
                    fetched.content_type
                );
            }
        }
    }

    async fn process_html(&self, task: &UrlTask, fetched: &FetchSuccess) {
        let body = String::from_utf8_lossy(&fetched.body);
        // Relative hrefs resolve against where the page actually landed
        let parsed = parse_html(&body, &fetched.final_url);

        for (url, kind) in plan_links(task.kind, &fetched.final_url, &parsed) {
            let outcome = self
                .frontier
                .enqueue(UrlTask {
                    url: url.clone(),
                    depth: task.depth + 1,
                    kind,
                    parent: Some(task.url.as_str().to_string()),
                })
                .await;
            tracing::trace!("Discovered {:?} {}: {:?}", kind, url, outcome);
        }

        if parsed.text.is_empty() {
            self.stats.record_skipped_empty();
            tracing::debug!("{}: no content text", task.url);
            return;
        }

        let mut metadata = DocumentMetadata::from_url(&task.url);
        metadata.section = parsed.section.clone();

        self.resolve(DocumentCandidate {
            url: task.url.clone(),
            title: parsed.title.clone().unwrap_or_else(|| UNTITLED.to_string()),
            text: parsed.text,
            kind: ContentKind::Html,
            metadata,
        })
        .await;
    }

    async fn process_pdf(&self, task: &UrlTask, fetched: &FetchSuccess) {
        let pages = match extract_pages(&fetched.body, &task.url) {
            Ok(pages) => pages,
            Err(e) => {
                self.stats.record_parse_failure();
                tracing::warn!("{}", e);
                return;
            }
        };

        let title = title_from_pages(&pages, &task.url);
        for page in pages {
            let mut metadata = DocumentMetadata::from_url(&task.url);
            metadata.page_number = Some(page.number);

            self.resolve(DocumentCandidate {
                url: task.url.clone(),
                title: title.clone(),
                text: page.text,
                kind: ContentKind::Pdf,
                metadata,
            })
            .await;
        }
    }

    async fn resolve(&self, candidate: DocumentCandidate) {
        self.stats.record_candidate();
        let url = candidate.url.clone();
        let resolution = self.resolver.lock().await.resolve(candidate);
        match resolution {
            Resolution::New => {
                tracing::debug!("New document: {}", url);
            }
            Resolution::ReplacedPrevious { previous_url } => {
                self.stats.record_duplicate();
                tracing::debug!("{} supersedes {}", url, previous_url);
            }
            Resolution::AliasOfExisting { canonical_url } => {
                self.stats.record_duplicate();
                tracing::debug!("{} duplicates {}", url, canonical_url);
            }
        }
    }
}
