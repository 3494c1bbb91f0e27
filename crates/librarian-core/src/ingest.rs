//! Ingestion pipeline: records → documents → embeddings → index.
//!
//! # Algorithm
//!
//! 1. If `reset`, delete the target collection (errors are swallowed, so
//!    ingestion behaves the same whether or not a prior collection exists).
//! 2. Create or reuse the collection with the configured metric.
//! 3. Compose one [`DocumentDraft`] per record (see [`crate::compose`]).
//! 4. Split the drafts into fixed-size batches; for each batch make one
//!    embedding call, then one upsert call.
//!
//! Batches commit independently. An embedding failure aborts the run at the
//! failing batch and propagates; earlier batches stay in the index. Upserts
//! are idempotent, so a failed run can simply be repeated.

use anyhow::Result;
use tracing::{debug, info};

use crate::compose;
use crate::embedding::{Distance, EmbeddingGateway};
use crate::error::GatewayError;
use crate::models::{BookRecord, DocumentDraft, IndexedDocument};
use crate::store::VectorIndex;

/// Number of documents sent per embedding call.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Ingestion parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct IngestParams {
    pub collection: String,
    pub distance: Distance,
    pub batch_size: usize,
}

impl Default for IngestParams {
    fn default() -> Self {
        Self {
            collection: "books".to_string(),
            distance: Distance::Cosine,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Outcome of a successful ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents upserted (duplicates within the input are counted each time).
    pub documents: usize,
    /// Embedding + upsert round-trips performed.
    pub batches: usize,
    /// Embedding tokens reported by the gateway across all batches.
    pub embedding_tokens: u64,
}

/// Ingest `records` into the configured collection.
pub async fn ingest(
    embedder: &dyn EmbeddingGateway,
    index: &dyn VectorIndex,
    params: &IngestParams,
    records: &[BookRecord],
    reset: bool,
) -> Result<IngestReport> {
    if reset {
        if let Err(e) = index.delete_collection(&params.collection).await {
            debug!(collection = %params.collection, error = %e, "reset: delete failed, continuing");
        }
    }

    index
        .get_or_create_collection(&params.collection, params.distance)
        .await?;

    let drafts: Vec<DocumentDraft> = records.iter().map(compose::draft).collect();
    let batch_size = params.batch_size.max(1);
    let mut report = IngestReport::default();

    for (n, batch) in drafts.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|d| d.document.clone()).collect();
        let embeddings = embedder.embed(&texts).await?;

        if embeddings.vectors.len() != batch.len() {
            return Err(GatewayError::malformed(
                "embedding",
                format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    embeddings.vectors.len()
                ),
            )
            .into());
        }

        let documents: Vec<IndexedDocument> = batch
            .iter()
            .cloned()
            .zip(embeddings.vectors)
            .map(|(draft, vector)| draft.with_embedding(vector))
            .collect();

        index.upsert(&params.collection, &documents).await?;

        debug!(batch = n, documents = documents.len(), "upserted batch");
        report.documents += documents.len();
        report.batches += 1;
        report.embedding_tokens += embeddings.total_tokens;
    }

    info!(
        collection = %params.collection,
        documents = report.documents,
        batches = report.batches,
        "ingestion complete"
    );
    Ok(report)
}
