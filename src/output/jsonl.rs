//! JSONL document sink

use crate::output::record::DocumentRecord;
use crate::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one [`DocumentRecord`] per line
pub struct JsonlWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    written: usize,
}

impl JsonlWriter {
    /// Creates (or truncates) the output file, creating parent directories
    pub fn create(path: &Path) -> Result<Self> {
        ensure_parent(path)?;
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            written: 0,
        })
    }

    /// Opens the output file for appending, for resumed crawls
    pub fn append(path: &Path) -> Result<Self> {
        ensure_parent(path)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn write(&mut self, record: &DocumentRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Flushes and reports how many records were written
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        tracing::info!("Wrote {} records to {}", self.written, self.path.display());
        Ok(self.written)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// The URL fields of a record line, for resume pre-seeding
#[derive(Debug, Deserialize)]
struct RecordUrls {
    url: String,
    #[serde(default)]
    alias_urls: Vec<String>,
}

/// Reads all URLs (canonical and alias) from an existing output file
///
/// A missing file means nothing to resume from. Unparseable lines are
/// skipped with a warning so a truncated final line cannot block a resume.
pub fn read_recorded_urls(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut urls = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RecordUrls>(&line) {
            Ok(record) => {
                urls.push(record.url);
                urls.extend(record.alias_urls);
            }
            Err(e) => {
                tracing::warn!("{}:{}: skipping bad record: {}", path.display(), number + 1, e);
            }
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::record::RecordMetadata;
    use chrono::Utc;

    fn record(url: &str, aliases: &[&str]) -> DocumentRecord {
        DocumentRecord {
            url: url.to_string(),
            alias_urls: aliases.iter().map(|s| s.to_string()).collect(),
            title: "t".to_string(),
            content: "c".to_string(),
            content_hash: "sha256:00".to_string(),
            content_type: "text/html".to_string(),
            metadata: RecordMetadata {
                year: Some(2021),
                language: Some("en".to_string()),
                page_number: Some(1),
                section: None,
                file_path: None,
            },
            chunks: Vec::new(),
            crawled_at: Utc::now(),
        }
    }

    #[test]
    fn test_write_and_read_back_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.jsonl");

        let mut writer = JsonlWriter::create(&path).unwrap();
        writer
            .write(&record(
                "https://example.gov.hk/2021/eng/p1.html",
                &["https://example.gov.hk/2021/pdf/p1.pdf"],
            ))
            .unwrap();
        writer
            .write(&record("https://example.gov.hk/2021/eng/p2.html", &[]))
            .unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let urls = read_recorded_urls(&path).unwrap();
        assert_eq!(urls.len(), 3);
        assert!(urls.contains(&"https://example.gov.hk/2021/pdf/p1.pdf".to_string()));
    }

    #[test]
    fn test_missing_file_is_empty_resume() {
        let dir = tempfile::tempdir().unwrap();
        let urls = read_recorded_urls(&dir.path().join("absent.jsonl")).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_bad_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.jsonl");
        std::fs::write(
            &path,
            "{\"url\": \"https://example.gov.hk/a.html\"}\nnot json\n\n",
        )
        .unwrap();

        let urls = read_recorded_urls(&path).unwrap();
        assert_eq!(urls, vec!["https://example.gov.hk/a.html".to_string()]);
    }

    #[test]
    fn test_append_keeps_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.jsonl");

        let mut writer = JsonlWriter::create(&path).unwrap();
        writer
            .write(&record("https://example.gov.hk/2021/eng/p1.html", &[]))
            .unwrap();
        writer.finish().unwrap();

        let mut writer = JsonlWriter::append(&path).unwrap();
        writer
            .write(&record("https://example.gov.hk/2021/eng/p2.html", &[]))
            .unwrap();
        writer.finish().unwrap();

        assert_eq!(read_recorded_urls(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/docs.jsonl");
        let writer = JsonlWriter::create(&path).unwrap();
        assert_eq!(writer.finish().unwrap(), 0);
        assert!(path.exists());
    }
}
