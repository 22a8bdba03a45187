//! Policy-Crawler command-line entry point

use anyhow::Context;
use clap::Parser;
use policy_crawler::config::{load_config_with_hash, Config};
use policy_crawler::output::{
    build_record, print_summary, read_recorded_urls, JsonlWriter,
};
use policy_crawler::traversal::Crawler;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Policy-Crawler: a bounded crawler for Policy Address sites
///
/// Crawls configured edition tables of contents, follows content pages and
/// PDF renditions within scope, deduplicates content across renditions, and
/// writes chunked document records as JSONL.
#[derive(Parser, Debug)]
#[command(name = "policy-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A bounded Policy Address crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore previous output and crawl everything again
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) =
        load_config_with_hash(&cli.config).context("failed to load configuration")?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("policy_crawler=info,warn"),
            1 => EnvFilter::new("policy_crawler=debug,info"),
            2 => EnvFilter::new("policy_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Policy-Crawler Dry Run ===\n");

    println!("Scope:");
    println!("  Allowed hosts: {}", config.crawler.allowed_hosts.join(", "));
    if config.crawler.years.is_empty() {
        println!("  Years: all");
    } else {
        let years: Vec<String> = config.crawler.years.iter().map(u16::to_string).collect();
        println!("  Years: {}", years.join(", "));
    }
    println!("  Depth limit: {}", config.crawler.depth_limit);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);

    println!("\nPoliteness:");
    println!("  Per-host rps: {}", config.rate_limits.per_host_rps);
    println!(
        "  Per-host concurrency: {}",
        config.rate_limits.per_host_concurrency
    );
    println!(
        "  Global concurrency: {}",
        config.rate_limits.global_concurrency
    );

    println!("\nChunking:");
    println!("  Chunk size: {} tokens", config.rag.chunk_size_tokens);
    println!("  Overlap: {} tokens", config.rag.chunk_overlap_tokens);
    println!("  Respect boundaries: {}", config.rag.respect_boundaries);

    println!("\nOutput:");
    println!("  Documents: {}", config.output.documents_path);

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Runs the crawl and writes the output records
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    let documents_path = PathBuf::from(&config.output.documents_path);
    let rag = config.rag.clone();
    let resume = !fresh && config.deduplication.skip_existing_files;

    let crawler = Crawler::new(config).await?;

    if resume {
        let urls = read_recorded_urls(&documents_path)
            .with_context(|| format!("failed to read {}", documents_path.display()))?;
        crawler.preseed_visited(urls).await;
    } else if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous output)");
    }

    let outcome = crawler.run().await?;
    tracing::info!(
        "Crawl finished: {} pages fetched, {} documents",
        outcome.stats.pages_fetched,
        outcome.documents.len()
    );

    let records_written = write_records(&documents_path, &outcome, &rag, resume)?;

    print_summary(&outcome.stats, outcome.documents.len(), records_written);
    Ok(())
}

fn write_records(
    path: &Path,
    outcome: &policy_crawler::traversal::CrawlOutcome,
    rag: &policy_crawler::config::RagConfig,
    resume: bool,
) -> anyhow::Result<usize> {
    let mut writer = if resume {
        JsonlWriter::append(path)?
    } else {
        JsonlWriter::create(path)?
    };
    for document in &outcome.documents {
        writer.write(&build_record(document, rag))?;
    }
    Ok(writer.finish()?)
}
