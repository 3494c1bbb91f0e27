//! Summary lookup by title over the raw corpus.
//!
//! Lookups go against book records, not the vector index: the index only
//! holds composed documents, while the reader wants the full synopsis.

use crate::models::BookRecord;

/// Returned when no synopsis can be produced for a title.
pub const SUMMARY_UNAVAILABLE: &str = "Rezumat indisponibil.";

/// Resolves the full synopsis for a title. Never fails.
pub trait SummarySource: Send + Sync {
    fn summary_for(&self, title: &str) -> String;
}

/// Find the synopsis for `title` among `records`.
///
/// Titles match case-insensitively after trimming. Returns the record's
/// description when non-empty, else its summary when non-empty, else
/// [`SUMMARY_UNAVAILABLE`]. Returns `None` when no record matches.
pub fn find_summary(records: &[BookRecord], title: &str) -> Option<String> {
    let wanted = title.trim().to_lowercase();
    records
        .iter()
        .find(|r| r.title.trim().to_lowercase() == wanted)
        .map(|r| {
            r.description
                .as_deref()
                .filter(|d| !d.is_empty())
                .or_else(|| Some(r.summary.as_str()).filter(|s| !s.is_empty()))
                .unwrap_or(SUMMARY_UNAVAILABLE)
                .to_string()
        })
}

/// An in-memory corpus snapshot.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<BookRecord>,
}

impl Catalog {
    pub fn new(records: Vec<BookRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }
}

impl SummarySource for Catalog {
    fn summary_for(&self, title: &str) -> String {
        find_summary(&self.records, title).unwrap_or_else(|| SUMMARY_UNAVAILABLE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            BookRecord {
                id: "W1".into(),
                title: "Dune".into(),
                summary: "A desert epic.".into(),
                ..Default::default()
            },
            BookRecord {
                id: "W2".into(),
                title: "Emma".into(),
                description: Some("Matchmaking in Highbury.".into()),
                summary: "Short.".into(),
                ..Default::default()
            },
            BookRecord {
                id: "W3".into(),
                title: "Blank".into(),
                description: Some(String::new()),
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_summary_when_description_missing() {
        assert_eq!(catalog().summary_for("Dune"), "A desert epic.");
    }

    #[test]
    fn test_description_preferred() {
        assert_eq!(catalog().summary_for("Emma"), "Matchmaking in Highbury.");
    }

    #[test]
    fn test_case_insensitive_trimmed_match() {
        assert_eq!(catalog().summary_for("  dUNE \n"), "A desert epic.");
    }

    #[test]
    fn test_unknown_title_sentinel() {
        assert_eq!(catalog().summary_for("Ulysses"), SUMMARY_UNAVAILABLE);
    }

    #[test]
    fn test_empty_texts_sentinel() {
        assert_eq!(catalog().summary_for("Blank"), SUMMARY_UNAVAILABLE);
    }

    #[test]
    fn test_find_summary_distinguishes_missing() {
        assert_eq!(find_summary(catalog().records(), "Ulysses"), None);
    }
}
