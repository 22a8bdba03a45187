//! Output record shape
//!
//! One JSONL line per deduplicated document. Field names here are the
//! external contract consumed by the downstream indexing pipeline; changing
//! them breaks consumers.

use crate::chunk::{chunk_text, Chunk};
use crate::config::RagConfig;
use crate::dedup::CanonicalDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One document record, serialized as a single JSONL line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Canonical source URL
    pub url: String,

    /// Other URLs that carried the same content
    #[serde(default)]
    pub alias_urls: Vec<String>,

    pub title: String,

    /// Full cleaned text
    pub content: String,

    /// Algorithm-prefixed content hash
    pub content_hash: String,

    /// Media type of the canonical rendition
    pub content_type: String,

    pub metadata: RecordMetadata,

    pub chunks: Vec<ChunkRecord>,

    pub crawled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub year: Option<u16>,
    pub language: Option<String>,
    pub page_number: Option<u32>,
    pub section: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Document-scoped chunk id, `chunk_<sequence>`
    pub id: String,

    pub content: String,

    pub token_count: usize,

    pub start_char: usize,

    pub end_char: usize,
}

impl From<Chunk> for ChunkRecord {
    fn from(chunk: Chunk) -> Self {
        Self {
            id: format!("chunk_{}", chunk.sequence),
            content: chunk.text,
            token_count: chunk.token_count,
            start_char: chunk.start_char,
            end_char: chunk.end_char,
        }
    }
}

/// Builds the output record for a canonical document, chunking its text
pub fn build_record(document: &CanonicalDocument, rag: &RagConfig) -> DocumentRecord {
    let chunks = chunk_text(&document.text, rag)
        .into_iter()
        .map(ChunkRecord::from)
        .collect();

    DocumentRecord {
        url: document.url.as_str().to_string(),
        alias_urls: document.alias_urls.iter().cloned().collect(),
        title: document.title.clone(),
        content: document.text.clone(),
        content_hash: document.content_hash.clone(),
        content_type: document.kind.as_media_type().to_string(),
        metadata: RecordMetadata {
            year: document.metadata.year,
            language: document.metadata.language.clone(),
            page_number: document.metadata.page_number,
            section: document.metadata.section.clone(),
            file_path: document.metadata.file_path.clone(),
        },
        chunks,
        crawled_at: document.crawled_at,
    }
}
