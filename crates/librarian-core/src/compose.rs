//! Document composition for embedding.
//!
//! Turns a [`BookRecord`] into one dense, newline-joined text blob plus a
//! flattened metadata map. Both are pure functions of the record.
//!
//! # Layout
//!
//! ```text
//! Title: Dune
//! Authors: Frank Herbert
//! Year: 1965
//! Themes: desert, politics
//! Subjects: Science fiction, Ecology
//! Summary: A desert epic.
//! Description: ...
//! ```
//!
//! Lists are truncated (5 authors, 10 themes, 20 subjects). Every line is
//! emitted even when empty, except a description line with no content,
//! which is dropped.

use crate::models::{BookRecord, DocumentDraft, Metadata, MetadataValue};

const MAX_AUTHORS: usize = 5;
const MAX_THEMES: usize = 10;
const MAX_SUBJECTS: usize = 20;

const DESCRIPTION_LABEL: &str = "Description: ";

/// Identifier used for the indexed document.
///
/// Falls back to the title, then to the literal `"unknown"`. Records that
/// resolve to the same id overwrite each other in the index.
pub fn record_id(record: &BookRecord) -> String {
    if !record.id.is_empty() {
        record.id.clone()
    } else if !record.title.is_empty() {
        record.title.clone()
    } else {
        "unknown".to_string()
    }
}

/// Compose the text that gets embedded for a record.
pub fn compose_document(record: &BookRecord) -> String {
    let year = record.year.map(|y| y.to_string()).unwrap_or_default();
    let description = format!(
        "{}{}",
        DESCRIPTION_LABEL,
        record.description.as_deref().unwrap_or("")
    );

    let mut lines = vec![
        format!("Title: {}", record.title),
        format!("Authors: {}", join_first(&record.authors, MAX_AUTHORS)),
        format!("Year: {}", year),
        format!("Themes: {}", join_first(&record.themes, MAX_THEMES)),
        format!("Subjects: {}", join_first(&record.subjects, MAX_SUBJECTS)),
        format!("Summary: {}", record.summary),
    ];
    if description != DESCRIPTION_LABEL {
        lines.push(description);
    }
    lines.join("\n")
}

/// Flatten a record's fields into primitive metadata.
///
/// Lists are comma-joined in full; a missing year becomes `""`.
pub fn flatten_metadata(record: &BookRecord) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("title".into(), record.title.as_str().into());
    metadata.insert("authors".into(), record.authors.join(", ").into());
    metadata.insert("themes".into(), record.themes.join(", ").into());
    metadata.insert("subjects".into(), record.subjects.join(", ").into());
    metadata.insert(
        "year".into(),
        match record.year {
            Some(y) => MetadataValue::Int(y),
            None => MetadataValue::Text(String::new()),
        },
    );
    metadata
}

/// Build the id, text and metadata for a record.
pub fn draft(record: &BookRecord) -> DocumentDraft {
    DocumentDraft {
        id: record_id(record),
        document: compose_document(record),
        metadata: flatten_metadata(record),
    }
}

fn join_first(items: &[String], n: usize) -> String {
    items
        .iter()
        .take(n)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
