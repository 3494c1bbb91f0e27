//! Token usage accounting and cost estimates.
//!
//! Prices are USD per million tokens. A model missing from the table costs
//! `0.0`, so stale price data never breaks a query.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::completion::ChatUsage;

const PER_MILLION: f64 = 1_000_000.0;

/// Chat pricing for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChatPrice {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Per-model price table for chat and embedding models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    #[serde(default)]
    pub chat: HashMap<String, ChatPrice>,
    /// Embedding model → USD per million tokens.
    #[serde(default)]
    pub embedding: HashMap<String, f64>,
}

impl Default for PriceTable {
    fn default() -> Self {
        let chat = HashMap::from([
            (
                "gpt-4o".to_string(),
                ChatPrice {
                    input_per_million: 5.00,
                    output_per_million: 20.00,
                },
            ),
            (
                "gpt-4o-mini".to_string(),
                ChatPrice {
                    input_per_million: 0.60,
                    output_per_million: 2.40,
                },
            ),
        ]);
        let embedding = HashMap::from([
            ("text-embedding-3-small".to_string(), 0.02),
            ("text-embedding-3-large".to_string(), 0.13),
        ]);
        Self { chat, embedding }
    }
}

impl PriceTable {
    /// An empty table: every model costs nothing.
    pub fn empty() -> Self {
        Self {
            chat: HashMap::new(),
            embedding: HashMap::new(),
        }
    }

    /// Cost of a chat call; `0.0` for unknown models.
    pub fn chat_cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        match self.chat.get(model) {
            Some(p) => {
                (input_tokens as f64 / PER_MILLION) * p.input_per_million
                    + (output_tokens as f64 / PER_MILLION) * p.output_per_million
            }
            None => 0.0,
        }
    }

    /// Cost of embedding `tokens` tokens; `0.0` for unknown models.
    pub fn embedding_cost(&self, model: &str, tokens: u64) -> f64 {
        self.embedding
            .get(model)
            .map(|per_million| (tokens as f64 / PER_MILLION) * per_million)
            .unwrap_or(0.0)
    }
}

/// Token counts and cost breakdown for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageReport {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub embedding_tokens: u64,
    pub chat_cost: f64,
    pub embedding_cost: f64,
    pub total_cost: f64,
    pub chat_model: String,
    pub embedding_model: String,
}

impl UsageReport {
    /// Price a query's chat and embedding usage.
    pub fn price(
        prices: &PriceTable,
        chat_model: &str,
        chat: ChatUsage,
        embedding_model: &str,
        embedding_tokens: u64,
    ) -> Self {
        let chat_cost = prices.chat_cost(chat_model, chat.input_tokens, chat.output_tokens);
        let embedding_cost = prices.embedding_cost(embedding_model, embedding_tokens);
        Self {
            input_tokens: chat.input_tokens,
            output_tokens: chat.output_tokens,
            total_tokens: chat.total_tokens,
            embedding_tokens,
            chat_cost,
            embedding_cost,
            total_cost: chat_cost + embedding_cost,
            chat_model: chat_model.to_string(),
            embedding_model: embedding_model.to_string(),
        }
    }

    /// One-line footer for terminal output.
    pub fn footer(&self) -> String {
        format!(
            "tokens chat: in={}, out={}, total={} | tokens embeddings: {} | \
             cost: chat ${:.6} + emb ${:.6} = ${:.6} (models: {}, {})",
            self.input_tokens,
            self.output_tokens,
            self.total_tokens,
            self.embedding_tokens,
            self.chat_cost,
            self.embedding_cost,
            self.total_cost,
            self.chat_model,
            self.embedding_model,
        )
    }
}
