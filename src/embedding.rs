//! Embedding gateway implementations.
//!
//! - **[`DisabledEmbedder`]**: fails every call; used when
//!   `embedding.provider = "disabled"`.
//! - **[`OpenAIEmbedder`]**: calls `POST {base_url}/embeddings` with retry
//!   and backoff (see [`crate::openai`]).
//!
//! Use [`create_embedder`] to pick one from configuration:
//!
//! ```rust
//! # use smart_librarian::config::EmbeddingConfig;
//! # use smart_librarian::embedding::create_embedder;
//! let config = EmbeddingConfig {
//!     provider: "disabled".into(),
//!     ..Default::default()
//! };
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.model_name(), "disabled");
//! ```

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use librarian_core::embedding::{EmbeddingGateway, Embeddings};
use librarian_core::GatewayError;

use crate::config::EmbeddingConfig;
use crate::openai::OpenAIClient;

const SERVICE: &str = "embedding";

// ============ Disabled ============

/// An embedding gateway that always fails.
pub struct DisabledEmbedder;

#[async_trait]
impl EmbeddingGateway for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn embed(&self, _texts: &[String]) -> Result<Embeddings> {
        Err(GatewayError::Disabled {
            service: SERVICE.to_string(),
        }
        .into())
    }
}

// ============ OpenAI ============

/// Embedding gateway for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAIEmbedder {
    client: OpenAIClient,
    model: String,
}

impl OpenAIEmbedder {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingGateway for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Embeddings> {
        if texts.is_empty() {
            return Ok(Embeddings::default());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = self.client.post_json("embeddings", &body).await?;
        Ok(parse_embeddings_response(&json)?)
    }
}

/// Parse an `/embeddings` response.
///
/// Vectors are returned in input order, using each item's `index` field
/// (array position when absent). Token usage is `usage.total_tokens`, else
/// `usage.prompt_tokens`, else `0`.
pub fn parse_embeddings_response(json: &Value) -> Result<Embeddings, GatewayError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| GatewayError::malformed(SERVICE, "missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        let values = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| GatewayError::malformed(SERVICE, "missing embedding"))?;
        let vector = values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32).filter(|f| f.is_finite()))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| {
                GatewayError::malformed(SERVICE, "non-numeric or non-finite embedding value")
            })?;
        indexed.push((index, vector));
    }

    // Sort by index to ensure order matches input
    indexed.sort_by_key(|(index, _)| *index);
    if indexed.iter().enumerate().any(|(i, (index, _))| i != *index) {
        return Err(GatewayError::malformed(
            SERVICE,
            "embedding indices are not a permutation of 0..n",
        ));
    }

    let usage = json.get("usage");
    let total_tokens = usage
        .and_then(|u| u.get("total_tokens").and_then(|t| t.as_u64()))
        .or_else(|| usage.and_then(|u| u.get("prompt_tokens").and_then(|t| t.as_u64())))
        .unwrap_or(0);

    Ok(Embeddings {
        vectors: indexed.into_iter().map(|(_, v)| v).collect(),
        total_tokens,
    })
}

/// Create the configured [`EmbeddingGateway`].
///
/// # Errors
///
/// Unknown provider names, or a missing `OPENAI_API_KEY` for `openai`.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingGateway>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        "openai" => {
            let client =
                OpenAIClient::from_env(config.base_url(), config.timeout_secs, config.max_retries)?;
            Ok(Arc::new(OpenAIEmbedder::new(client, config.model.clone())))
        }
        other => bail!("Unknown embedding provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reorders_by_index() {
        let json = json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ],
            "usage": {"prompt_tokens": 8, "total_tokens": 9}
        });
        let parsed = parse_embeddings_response(&json).unwrap();
        assert_eq!(parsed.vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(parsed.total_tokens, 9);
    }

    #[test]
    fn test_token_fallbacks() {
        let prompt_only = json!({
            "data": [{"embedding": [1.0]}],
            "usage": {"prompt_tokens": 4}
        });
        assert_eq!(parse_embeddings_response(&prompt_only).unwrap().total_tokens, 4);

        let no_usage = json!({"data": [{"embedding": [1.0]}]});
        assert_eq!(parse_embeddings_response(&no_usage).unwrap().total_tokens, 0);
    }

    #[test]
    fn test_malformed_responses() {
        assert!(parse_embeddings_response(&json!({})).is_err());
        assert!(parse_embeddings_response(&json!({"data": [{"index": 0}]})).is_err());
        assert!(
            parse_embeddings_response(&json!({"data": [{"embedding": ["x"]}]})).is_err()
        );
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let json = json!({"data": [{"index": 0, "embedding": [0.5, 1e39]}]});
        let err = parse_embeddings_response(&json).unwrap_err();
        assert!(matches!(err, GatewayError::Malformed { .. }));
    }

    #[test]
    fn test_rejects_duplicate_or_sparse_indices() {
        let duplicate = json!({"data": [
            {"index": 0, "embedding": [1.0]},
            {"index": 0, "embedding": [2.0]}
        ]});
        assert!(matches!(
            parse_embeddings_response(&duplicate),
            Err(GatewayError::Malformed { .. })
        ));

        let sparse = json!({"data": [
            {"index": 0, "embedding": [1.0]},
            {"index": 2, "embedding": [2.0]}
        ]});
        assert!(matches!(
            parse_embeddings_response(&sparse),
            Err(GatewayError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_disabled_fails_every_call() {
        let err = DisabledEmbedder
            .embed(&["hello".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("embedding provider is disabled"));
        assert!(matches!(
            err.downcast_ref::<GatewayError>(),
            Some(GatewayError::Disabled { .. })
        ));
    }
}
