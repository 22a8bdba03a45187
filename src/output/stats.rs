//! Crawl run counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters updated by workers as the crawl runs
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_fetched: AtomicU64,
    fetch_failures: AtomicU64,
    robots_denied: AtomicU64,
    parse_failures: AtomicU64,
    candidates: AtomicU64,
    duplicates: AtomicU64,
    skipped_empty: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub pages_fetched: u64,
    pub fetch_failures: u64,
    pub robots_denied: u64,
    pub parse_failures: u64,
    pub candidates: u64,
    pub duplicates: u64,
    pub skipped_empty: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_robots_denied(&self) {
        self.robots_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_candidate(&self) {
        self.candidates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_empty(&self) {
        self.skipped_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            robots_denied: self.robots_denied.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            candidates: self.candidates.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            skipped_empty: self.skipped_empty.load(Ordering::Relaxed),
        }
    }
}

/// Prints the end-of-run summary
pub fn print_summary(stats: &StatsSnapshot, documents: usize, records_written: usize) {
    println!("=== Crawl Summary ===");
    println!("Pages fetched:    {}", stats.pages_fetched);
    println!("Fetch failures:   {}", stats.fetch_failures);
    println!("Robots denied:    {}", stats.robots_denied);
    println!("Parse failures:   {}", stats.parse_failures);
    println!("Candidates:       {}", stats.candidates);
    println!("Duplicates:       {}", stats.duplicates);
    println!("Empty pages:      {}", stats.skipped_empty);
    println!("Documents:        {}", documents);
    println!("Records written:  {}", records_written);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = CrawlStats::new();
        stats.record_fetched();
        stats.record_fetched();
        stats.record_duplicate();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.pages_fetched, 2);
        assert_eq!(snapshot.duplicates, 1);
        assert_eq!(snapshot.fetch_failures, 0);
    }
}
