//! Query-path orchestration.
//!
//! [`Librarian`] wires the capabilities together for one query:
//! retrieve → build prompt → complete → choose title → look up summary →
//! price usage. Each step runs sequentially; nothing is written on this
//! path, so a caller may drop the future at any await point.
//!
//! Gateway and index failures propagate as errors. A malformed answer, an
//! unknown title, an unpriced model, or an empty index do not: they degrade
//! to the fallback title, the sentinel summary, zero cost, and an empty
//! candidate list respectively.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::catalog::SummarySource;
use crate::completion::CompletionGateway;
use crate::embedding::EmbeddingGateway;
use crate::models::Candidate;
use crate::parse::choose_title;
use crate::pricing::{PriceTable, UsageReport};
use crate::prompt::build_messages;
use crate::retrieve::{retrieve, Retrieval, RetrievalParams, DEFAULT_TOP_K};
use crate::store::VectorIndex;

/// Sampling temperature for the recommendation call.
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

/// Query-path settings, passed in at construction.
#[derive(Debug, Clone)]
pub struct LibrarianSettings {
    pub collection: String,
    pub top_k: usize,
    pub temperature: f32,
    /// Language the answer must be written in.
    pub language: String,
    pub prices: PriceTable,
}

impl Default for LibrarianSettings {
    fn default() -> Self {
        Self {
            collection: "books".to_string(),
            top_k: DEFAULT_TOP_K,
            temperature: DEFAULT_TEMPERATURE,
            language: "Romanian".to_string(),
            prices: PriceTable::default(),
        }
    }
}

/// Everything a caller needs to render one recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// Generated text, already in the fixed template.
    pub answer: String,
    /// Chosen title; empty when nothing could be chosen.
    pub title: String,
    /// Full synopsis for `title`; absent when `title` is empty.
    pub summary: Option<String>,
    pub candidates: Vec<Candidate>,
    pub usage: UsageReport,
}

/// Recommends one book per query, grounded in retrieved candidates.
pub struct Librarian {
    embedder: Arc<dyn EmbeddingGateway>,
    completer: Arc<dyn CompletionGateway>,
    index: Arc<dyn VectorIndex>,
    summaries: Arc<dyn SummarySource>,
    settings: LibrarianSettings,
}

impl Librarian {
    pub fn new(
        embedder: Arc<dyn EmbeddingGateway>,
        completer: Arc<dyn CompletionGateway>,
        index: Arc<dyn VectorIndex>,
        summaries: Arc<dyn SummarySource>,
        settings: LibrarianSettings,
    ) -> Self {
        Self {
            embedder,
            completer,
            index,
            summaries,
            settings,
        }
    }

    fn retrieval_params(&self) -> RetrievalParams {
        RetrievalParams {
            collection: self.settings.collection.clone(),
            top_k: self.settings.top_k,
        }
    }

    /// Retrieval only: the candidates a query would be grounded in.
    pub async fn search(&self, query: &str) -> Result<Retrieval> {
        retrieve(
            self.embedder.as_ref(),
            self.index.as_ref(),
            &self.retrieval_params(),
            query,
        )
        .await
    }

    /// Synopsis for a title, from the corpus.
    pub fn summary_for(&self, title: &str) -> String {
        self.summaries.summary_for(title)
    }

    /// Run the full query path.
    pub async fn recommend(&self, query: &str) -> Result<Recommendation> {
        let Retrieval {
            candidates,
            embedding_tokens,
        } = self.search(query).await?;

        let messages = build_messages(
            query,
            &candidates,
            self.settings.top_k,
            &self.settings.language,
        );
        let completion = self
            .completer
            .complete(&messages, self.settings.temperature)
            .await?;
        let answer = completion.text.trim().to_string();

        let title = choose_title(&answer, &candidates);
        let summary = if title.is_empty() {
            None
        } else {
            Some(self.summaries.summary_for(&title))
        };

        let usage = UsageReport::price(
            &self.settings.prices,
            self.completer.model_name(),
            completion.usage,
            self.embedder.model_name(),
            embedding_tokens,
        );

        debug!(
            title = %title,
            candidates = candidates.len(),
            total_cost = usage.total_cost,
            "recommendation ready"
        );

        Ok(Recommendation {
            answer,
            title,
            summary,
            candidates,
            usage,
        })
    }
}
