//! Output: document records, the JSONL sink, and run statistics

mod jsonl;
mod record;
mod stats;

pub use jsonl::{read_recorded_urls, JsonlWriter};
pub use record::{build_record, ChunkRecord, DocumentRecord, RecordMetadata};
pub use stats::{print_summary, CrawlStats, StatsSnapshot};
