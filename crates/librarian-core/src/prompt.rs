//! Prompt construction for the recommendation call.
//!
//! The prompt is two messages. The system message fixes the output
//! language, the single-book rule, and a literal response template ending
//! in a one-line JSON object carrying the exact title. The user message
//! restates the query and lists the retrieved candidates as grounding
//! context. [`crate::parse`] relies on the trailing JSON line to recover the
//! decision from otherwise free text.

use crate::completion::ChatMessage;
use crate::models::{metadata_text, Candidate};

/// Authors shown per candidate line.
const CONTEXT_AUTHORS: usize = 3;
/// Themes shown per candidate line.
const CONTEXT_THEMES: usize = 5;

/// The literal layout the model must answer with.
pub const RESPONSE_TEMPLATE: &str =
    "- recomandare\n{title}\n{summary}\n\n{\"title\": \"<Exact Title>\"}";

/// Render one candidate as a single context line.
///
/// ```rust
/// use librarian_core::models::{Candidate, Metadata};
/// use librarian_core::prompt::render_candidate;
///
/// let mut metadata = Metadata::new();
/// metadata.insert("title".into(), "Dune".into());
/// metadata.insert("authors".into(), "Frank Herbert".into());
/// let c = Candidate { id: "W1".into(), document: String::new(), metadata, distance: 0.1 };
/// assert_eq!(render_candidate(&c), "- Title: Dune | Authors: Frank Herbert | Themes: ");
/// ```
pub fn render_candidate(candidate: &Candidate) -> String {
    let md = &candidate.metadata;
    format!(
        "- Title: {} | Authors: {} | Themes: {}",
        metadata_text(md, "title"),
        first_items(&metadata_text(md, "authors"), CONTEXT_AUTHORS),
        first_items(&metadata_text(md, "themes"), CONTEXT_THEMES),
    )
}

/// Render the grounding context: one line per candidate, at most `top_k`.
pub fn render_context(candidates: &[Candidate], top_k: usize) -> String {
    candidates
        .iter()
        .take(top_k)
        .map(render_candidate)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the system + user message pair for a query.
pub fn build_messages(
    query: &str,
    candidates: &[Candidate],
    top_k: usize,
    language: &str,
) -> Vec<ChatMessage> {
    let system = format!(
        "You are an AI librarian. Answer STRICTLY in {language}. \
         You receive a reader's question about interests or themes and a list of \
         candidate books retrieved from a vector store. \
         Recommend EXACTLY ONE book from the candidates. \
         The answer must follow this format exactly:\n\n\
         {template}\n\n\
         The last line must be a single-line JSON object of the form \
         {{\"title\": \"Exact Title\"}} containing the exact title of the chosen book.",
        language = language,
        template = RESPONSE_TEMPLATE,
    );

    let user = format!(
        "Question: {}\n\nCandidate books (from the index metadata):\n{}\n\n\
         Follow the required format exactly and do not add anything else.",
        query,
        render_context(candidates, top_k),
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Split a comma-joined metadata string, keep the first `n` non-empty items.
fn first_items(joined: &str, n: usize) -> String {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(n)
        .collect::<Vec<_>>()
        .join(", ")
}
