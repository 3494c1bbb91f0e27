//! Query-time retrieval: embed the query, then ask the index for the
//! nearest documents.
//!
//! Candidates come back in the index's order (ascending distance) with no
//! re-ranking. An empty or missing collection is not an error; it yields an
//! empty candidate list that the rest of the pipeline tolerates.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::embedding::EmbeddingGateway;
use crate::error::GatewayError;
use crate::models::Candidate;
use crate::store::VectorIndex;

/// Number of candidates retrieved per query when not configured.
pub const DEFAULT_TOP_K: usize = 5;

/// Retrieval parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RetrievalParams {
    pub collection: String,
    pub top_k: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            collection: "books".to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Candidates for one query plus the embedding tokens spent on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retrieval {
    pub candidates: Vec<Candidate>,
    pub embedding_tokens: u64,
}

/// Embed `query` and fetch the `top_k` nearest candidates.
///
/// Gateway and index failures propagate unchanged.
pub async fn retrieve(
    embedder: &dyn EmbeddingGateway,
    index: &dyn VectorIndex,
    params: &RetrievalParams,
    query: &str,
) -> Result<Retrieval> {
    let embeddings = embedder.embed(&[query.to_string()]).await?;
    let embedding_tokens = embeddings.total_tokens;
    let vector = embeddings
        .vectors
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::malformed("embedding", "empty embedding response"))?;

    let mut candidates = index.query(&params.collection, &vector, params.top_k).await?;
    // Guard against backends that ignore k.
    candidates.truncate(params.top_k);

    debug!(
        collection = %params.collection,
        candidates = candidates.len(),
        embedding_tokens,
        "retrieved candidates"
    );

    Ok(Retrieval {
        candidates,
        embedding_tokens,
    })
}
