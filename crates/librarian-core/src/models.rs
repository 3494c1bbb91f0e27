//! Core data models used throughout Smart Librarian.
//!
//! These types represent the book records, indexed documents, and retrieval
//! candidates that flow through the ingestion and query pipelines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalized representation of one book, as produced by corpus acquisition.
///
/// Records are read-only inside the pipeline. Every field except `title`
/// and `summary` may be missing from the corpus JSON; `description` is
/// `null` when the upstream catalog had none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Stable identifier within a corpus snapshot (e.g. `"/works/OL45883W"`).
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: Option<i64>,
    /// Free-text tags from the source catalog.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Normalized lowercase tags.
    #[serde(default)]
    pub themes: Vec<String>,
    /// Long-form text; absent when unavailable upstream.
    #[serde(default)]
    pub description: Option<String>,
    /// Short synthesized fallback text, used whenever `description` is absent.
    #[serde(default)]
    pub summary: String,
}

/// A single primitive metadata value.
///
/// The vector index cannot store structured values, so multi-valued fields
/// are flattened to delimiter-joined text before indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    /// Render the value as text; numbers use their decimal form.
    pub fn as_text(&self) -> String {
        match self {
            MetadataValue::Int(v) => v.to_string(),
            MetadataValue::Float(v) => v.to_string(),
            MetadataValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

/// Flattened key → primitive metadata stored next to each document.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Look up a metadata key as text, treating a missing key as empty.
pub fn metadata_text(metadata: &Metadata, key: &str) -> String {
    metadata.get(key).map(MetadataValue::as_text).unwrap_or_default()
}

/// A composed document ready for embedding, one per [`BookRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDraft {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
}

impl DocumentDraft {
    /// Attach the embedding produced for this draft's text.
    pub fn with_embedding(self, embedding: Vec<f32>) -> IndexedDocument {
        IndexedDocument {
            id: self.id,
            document: self.document,
            metadata: self.metadata,
            embedding,
        }
    }
}

/// A document as stored in the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// One retrieved document plus its distance to the query vector.
///
/// Lower distance means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    pub distance: f32,
}

impl Candidate {
    /// The stored title, or an empty string when the metadata has none.
    pub fn title(&self) -> String {
        metadata_text(&self.metadata, "title")
    }
}
