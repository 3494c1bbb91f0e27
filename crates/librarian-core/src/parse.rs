//! Recovering the chosen title from model output.
//!
//! Generated text is untrusted. The prompt asks for a trailing
//! `{"title": "..."}` line, so lines are scanned from the end and the first
//! one that looks like a single-line JSON object mentioning `title` is the
//! only one considered. Anything else (no such line, invalid JSON, missing
//! or empty `title`) falls back to the closest candidate's title, or to an
//! empty string when there are no candidates. Parsing never fails.

use tracing::debug;

use crate::models::Candidate;

/// Extract the title from the last JSON-looking line of `text`.
///
/// ```rust
/// use librarian_core::parse::extract_title;
///
/// let text = "- recomandare\nDune\nA desert epic.\n\n{\"title\": \"Dune\"}";
/// assert_eq!(extract_title(text).as_deref(), Some("Dune"));
/// assert_eq!(extract_title("no json here"), None);
/// ```
pub fn extract_title(text: &str) -> Option<String> {
    let line = text.lines().rev().map(str::trim).find(|line| {
        line.starts_with('{') && line.ends_with('}') && line.to_lowercase().contains("title")
    })?;

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, line, "title line is not valid JSON");
            return None;
        }
    };

    value
        .get("title")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Pick the recommended title: the parsed one, else the first candidate's.
pub fn choose_title(text: &str, candidates: &[Candidate]) -> String {
    if let Some(title) = extract_title(text) {
        return title;
    }
    let fallback = candidates.first().map(Candidate::title).unwrap_or_default();
    debug!(fallback = %fallback, "no parseable title in response, using fallback");
    fallback
}
