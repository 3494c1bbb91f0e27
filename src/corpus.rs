//! The book corpus file.
//!
//! The corpus is a JSON array of book records. It feeds ingestion and
//! backs summary lookups, which re-read the file on every call so that
//! edits show up without restarting a running server.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use librarian_core::catalog::{find_summary, SummarySource, SUMMARY_UNAVAILABLE};
use librarian_core::BookRecord;

use crate::config::Config;

/// Read and parse a corpus file.
pub fn load_records(path: &Path) -> Result<Vec<BookRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    let records: Vec<BookRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse corpus file: {}", path.display()))?;
    Ok(records)
}

/// File-backed [`SummarySource`].
///
/// An unreadable or unparsable file resolves every title to the
/// unavailable sentinel rather than failing.
#[derive(Debug, Clone)]
pub struct CorpusFile {
    path: PathBuf,
}

impl CorpusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SummarySource for CorpusFile {
    fn summary_for(&self, title: &str) -> String {
        match load_records(&self.path) {
            Ok(records) => {
                find_summary(&records, title).unwrap_or_else(|| SUMMARY_UNAVAILABLE.to_string())
            }
            Err(e) => {
                debug!(error = %e, "corpus unavailable for summary lookup");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}

/// `librarian summary TITLE`.
pub fn run_summary(config: &Config, title: &str) -> Result<()> {
    let corpus = CorpusFile::new(&config.corpus.path);
    println!("Summary for: {}", title.trim());
    println!("{}", corpus.summary_for(title));
    Ok(())
}
